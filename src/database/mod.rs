// 数据库模块
// 仓储接口定义，Postgres 实现与内存实现

pub mod memory;
pub mod repositories;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    Category, Comment, CommentFilter, Image, NewCategory, NewComment, NewPost, NewUser, Page,
    Paged, Post, PostFilter, PostUpdate, User, UserUpdate, VerificationToken,
};

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    /// 唯一约束冲突转为 Conflict
    pub fn from_insert(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(what.to_string())
            }
            _ => StoreError::Sql(err),
        }
    }
}

/// 级联删除用户的结果，图床清理在事务提交后进行
#[derive(Debug, Clone)]
pub struct UserCascade {
    pub user: User,
    pub post_image_ids: Vec<String>,
    pub posts_deleted: u64,
    pub comments_deleted: u64,
}

/// 级联删除文章的结果
#[derive(Debug, Clone)]
pub struct PostCascade {
    pub post: Post,
    pub comments_deleted: u64,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 邮箱重复返回 Conflict
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;
    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>, StoreError>;
    async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<bool, StoreError>;
    async fn set_admin(&self, id: Uuid, admin: bool) -> Result<bool, StoreError>;
    async fn set_verified(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn set_profile_image(&self, id: Uuid, image: &Image) -> Result<bool, StoreError>;
    /// 除 exclude 外的用户，按注册时间倒序
    async fn list_except(&self, exclude: Uuid, page: Page) -> Result<Paged<User>, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
    /// 删除用户、其文章、这些文章下的评论以及该用户的所有评论
    async fn delete_cascade(&self, id: Uuid) -> Result<Option<UserCascade>, StoreError>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationToken, StoreError>;
    /// 覆盖该用户最早的令牌，没有则新建
    async fn rotate(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationToken, StoreError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VerificationToken>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, new: NewPost) -> Result<Post, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
    /// 按创建时间倒序
    async fn list(&self, filter: &PostFilter, page: Page) -> Result<Paged<Post>, StoreError>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Option<Post>, StoreError>;
    /// 同时删除文章下的评论
    async fn delete_cascade(&self, id: Uuid) -> Result<Option<PostCascade>, StoreError>;
    /// 原子地翻转点赞状态
    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Post>, StoreError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, new: NewComment) -> Result<Comment, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;
    async fn list(&self, filter: &CommentFilter, page: Page) -> Result<Paged<Comment>, StoreError>;
    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, StoreError>;
    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Comment>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Comment>, StoreError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// 标题重复返回 Conflict
    async fn create(&self, new: NewCategory) -> Result<Category, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, StoreError>;
    async fn find_by_title(&self, title: &str) -> Result<Option<Category>, StoreError>;
    async fn list(&self) -> Result<Vec<Category>, StoreError>;
    async fn update_title(&self, id: Uuid, title: &str) -> Result<Option<Category>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// 所有仓储的集合，放在 AppState 中共享
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub categories: Arc<dyn CategoryRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        use repositories::*;

        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tokens: Arc::new(PgTokenRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            tokens: Arc::new(store.clone()),
            posts: Arc::new(store.clone()),
            comments: Arc::new(store.clone()),
            categories: Arc::new(store),
        }
    }
}
