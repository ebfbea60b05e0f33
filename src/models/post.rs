use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Image;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image: Image,
    pub user_id: Uuid,
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// posts 表的一行，点赞从 post_likes 聚合
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub image_public_id: Option<String>,
    pub user_id: Uuid,
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            image: Image {
                url: row.image_url,
                public_id: row.image_public_id,
            },
            user_id: row.user_id,
            likes: row.likes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub category: String,
    pub image: Image,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<Image>,
}

impl PostUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.image.is_none()
    }
}

/// 分类过滤不区分大小写，整词匹配
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub category: Option<String>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match &self.category {
            Some(category) => post.category.to_lowercase() == category.to_lowercase(),
            None => true,
        }
    }
}
