use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub post_id: Option<Uuid>,
}

impl CommentFilter {
    pub fn matches(&self, comment: &Comment) -> bool {
        self.post_id.is_none_or(|post_id| comment.post_id == post_id)
    }
}
