pub mod auth;
pub mod comment;
pub mod database;
pub mod feed;
pub mod follow;
pub mod group;
pub mod media;
pub mod post;
pub mod user;

// 重新导出常用类型
pub use auth::AuthService;
pub use comment::CommentService;
pub use database::Database;
pub use feed::FeedService;
pub use follow::FollowService;
pub use group::GroupService;
pub use media::MediaService;
pub use post::PostService;
pub use user::UserService;
