// 内存仓储，用于测试和无数据库的本地运行
// 语义与 Postgres 实现保持一致

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    CategoryRepository, CommentRepository, PostCascade, PostRepository, StoreError,
    TokenRepository, UserCascade, UserRepository,
};
use crate::models::user::DEFAULT_PROFILE_IMAGE_URL;
use crate::models::{
    Category, Comment, CommentFilter, Image, NewCategory, NewComment, NewPost, NewUser, Page,
    Paged, Post, PostFilter, PostUpdate, User, UserUpdate, VerificationToken,
};

// 各集合按插入顺序保存，倒序遍历即为最新优先
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tokens: Vec<VerificationToken>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    categories: Vec<Category>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_of<T: Clone>(items: Vec<&T>, page: Page) -> Paged<T> {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect();
    Paged { items, total }
}

fn toggle(likes: &mut Vec<Uuid>, user_id: Uuid) {
    match likes.iter().position(|id| *id == user_id) {
        Some(index) => {
            likes.remove(index);
        }
        None => likes.push(user_id),
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict("Email is used before".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            is_admin: false,
            is_blocked: false,
            is_account_verified: false,
            profile_image_url: DEFAULT_PROFILE_IMAGE_URL.to_string(),
            profile_image_id: None,
            bio: String::new(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(bio) = update.bio {
            user.bio = bio;
        }
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_blocked = blocked;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_admin(&self, id: Uuid, admin: bool) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_admin = admin;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_verified(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_account_verified = true;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_profile_image(&self, id: Uuid, image: &Image) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.profile_image_url = image.url.clone();
                user.profile_image_id = image.public_id.clone();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_except(&self, exclude: Uuid, page: Page) -> Result<Paged<User>, StoreError> {
        let tables = self.tables.lock().await;
        let users = tables.users.iter().rev().filter(|u| u.id != exclude).collect();
        Ok(page_of(users, page))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.tables.lock().await.users.len() as u64)
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<Option<UserCascade>, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(index) = tables.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        let user = tables.users.remove(index);

        let owned: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.user_id == id)
            .map(|p| p.id)
            .collect();
        let post_image_ids = tables
            .posts
            .iter()
            .filter(|p| p.user_id == id)
            .filter_map(|p| p.image.public_id.clone())
            .collect();

        let comments_before = tables.comments.len();
        tables
            .comments
            .retain(|c| c.user_id != id && !owned.contains(&c.post_id));
        let comments_deleted = (comments_before - tables.comments.len()) as u64;

        tables.posts.retain(|p| p.user_id != id);
        tables.tokens.retain(|t| t.user_id != id);
        for category in tables.categories.iter_mut() {
            if category.user_id == Some(id) {
                category.user_id = None;
            }
        }
        // 与 post_likes / comment_likes 的外键级联一致
        for post in tables.posts.iter_mut() {
            post.likes.retain(|u| *u != id);
        }
        for comment in tables.comments.iter_mut() {
            comment.likes.retain(|u| *u != id);
        }

        Ok(Some(UserCascade {
            user,
            post_image_ids,
            posts_deleted: owned.len() as u64,
            comments_deleted,
        }))
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn insert(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationToken, StoreError> {
        let mut tables = self.tables.lock().await;
        let row = VerificationToken {
            id: Uuid::new_v4(),
            user_id,
            token: token.to_string(),
            created_at: Utc::now(),
            expires_at,
        };
        tables.tokens.push(row.clone());
        Ok(row)
    }

    async fn rotate(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationToken, StoreError> {
        {
            let mut tables = self.tables.lock().await;
            if let Some(row) = tables.tokens.iter_mut().find(|t| t.user_id == user_id) {
                row.token = token.to_string();
                row.expires_at = expires_at;
                row.created_at = Utc::now();
                return Ok(row.clone());
            }
        }
        self.insert(user_id, token, expires_at).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VerificationToken>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        let before = tables.tokens.len();
        tables.tokens.retain(|t| t.id != id);
        Ok(tables.tokens.len() < before)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let before = tables.tokens.len();
        tables.tokens.retain(|t| !t.is_expired(now));
        Ok((before - tables.tokens.len()) as u64)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, new: NewPost) -> Result<Post, StoreError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            category: new.category,
            image: new.image,
            user_id: new.user_id,
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, filter: &PostFilter, page: Page) -> Result<Paged<Post>, StoreError> {
        let tables = self.tables.lock().await;
        let posts = tables.posts.iter().rev().filter(|p| filter.matches(p)).collect();
        Ok(page_of(posts, page))
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .posts
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.tables.lock().await.posts.len() as u64)
    }

    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Option<Post>, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            post.title = title;
        }
        if let Some(description) = update.description {
            post.description = description;
        }
        if let Some(category) = update.category {
            post.category = category;
        }
        if let Some(image) = update.image {
            post.image = image;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<Option<PostCascade>, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(index) = tables.posts.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let post = tables.posts.remove(index);

        let before = tables.comments.len();
        tables.comments.retain(|c| c.post_id != id);
        let comments_deleted = (before - tables.comments.len()) as u64;

        Ok(Some(PostCascade {
            post,
            comments_deleted,
        }))
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Post>, StoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|post| {
            toggle(&mut post.likes, user_id);
            post.clone()
        }))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, new: NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: new.post_id,
            user_id: new.user_id,
            text: new.text,
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list(&self, filter: &CommentFilter, page: Page) -> Result<Paged<Comment>, StoreError> {
        let tables = self.tables.lock().await;
        let comments = tables
            .comments
            .iter()
            .rev()
            .filter(|c| filter.matches(c))
            .collect();
        Ok(page_of(comments, page))
    }

    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .comments
            .iter()
            .rev()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Comment>, StoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.comments.iter_mut().find(|c| c.id == id).map(|comment| {
            comment.text = text.to_string();
            comment.updated_at = Utc::now();
            comment.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        Ok(tables.comments.len() < before)
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Comment>, StoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.comments.iter_mut().find(|c| c.id == id).map(|comment| {
            toggle(&mut comment.likes, user_id);
            comment.clone()
        }))
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn create(&self, new: NewCategory) -> Result<Category, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.categories.iter().any(|c| c.title == new.title) {
            return Err(StoreError::Conflict(
                "Category title already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            title: new.title,
            user_id: Some(new.user_id),
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Category>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.categories.iter().find(|c| c.title == title).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        let tables = self.tables.lock().await;
        let mut categories = tables.categories.clone();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn update_title(&self, id: Uuid, title: &str) -> Result<Option<Category>, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables
            .categories
            .iter()
            .any(|c| c.id != id && c.title == title)
        {
            return Err(StoreError::Conflict(
                "Category title already exists".to_string(),
            ));
        }

        Ok(tables.categories.iter_mut().find(|c| c.id == id).map(|category| {
            category.title = title.to_string();
            category.updated_at = Utc::now();
            category.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        Ok(tables.categories.len() < before)
    }
}
