pub mod comment;
pub mod follow;
pub mod group;
pub mod media;
pub mod post;
pub mod response;
pub mod user;
