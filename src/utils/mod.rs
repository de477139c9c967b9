pub mod cache;
pub mod middleware;
pub mod pagination;
pub mod serde_helpers;
pub mod slug;
pub mod validation;
