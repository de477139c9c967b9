use crate::{
    error::{AppError, Result},
    models::{group::Group, post::Post, user::UserProfile},
    services::{auth::User, FollowService, GroupService, PostService, UserService},
    utils::pagination::{paginate, Page},
};
use tracing::debug;

/// 按不同条件组合帖子流，全部按发布时间倒序并分页
#[derive(Clone)]
pub struct FeedService {
    posts: PostService,
    groups: GroupService,
    users: UserService,
    follows: FollowService,
    per_page: usize,
}

impl FeedService {
    pub async fn new(
        posts: PostService,
        groups: GroupService,
        users: UserService,
        follows: FollowService,
        per_page: usize,
    ) -> Result<Self> {
        Ok(Self {
            posts,
            groups,
            users,
            follows,
            per_page,
        })
    }

    /// 首页：所有帖子
    pub async fn home_feed(&self, page: Option<&str>) -> Result<Page<Post>> {
        let posts = self.posts.list_all_posts().await?;
        Ok(paginate(posts, self.per_page, page))
    }

    /// 分组页：只包含该分组的帖子
    pub async fn group_feed(&self, slug: &str, page: Option<&str>) -> Result<(Group, Page<Post>)> {
        let group = self.groups.get_group_by_slug(slug).await?;
        let posts = self.posts.list_posts_by_group(&group.id).await?;
        Ok((group, paginate(posts, self.per_page, page)))
    }

    /// 资料页：只包含该作者的帖子
    pub async fn profile_feed(
        &self,
        username: &str,
        page: Option<&str>,
    ) -> Result<(UserProfile, Page<Post>)> {
        let author = self.users.get_profile_by_username(username).await?;
        let posts = self.posts.list_posts_by_author(&author.id).await?;
        Ok((author, paginate(posts, self.per_page, page)))
    }

    /// 关注页：当前关注的作者的帖子，需要登录
    pub async fn follow_feed(&self, viewer: Option<&User>, page: Option<&str>) -> Result<Page<Post>> {
        let viewer = viewer.ok_or_else(|| {
            AppError::Authorization("Authentication required to view the follow feed".to_string())
        })?;

        let authors = self.follows.following_ids(&viewer.id).await?;
        debug!("Follow feed for {} covers {} authors", viewer.id, authors.len());

        let posts = self.posts.list_posts_by_authors(&authors).await?;
        Ok(paginate(posts, self.per_page, page))
    }
}
