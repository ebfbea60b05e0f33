use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{CommentRepository, StoreError};
use crate::models::{Comment, CommentFilter, NewComment, Page, Paged};

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.user_id, c.text, \
     ARRAY(SELECT l.user_id FROM comment_likes l WHERE l.comment_id = c.id) AS likes, \
     c.created_at, c.updated_at \
     FROM comments c";

pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, new: NewComment) -> Result<Comment, StoreError> {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (id, post_id, user_id, text)
             VALUES ($1, $2, $3, $4)
             RETURNING id, post_id, user_id, text, ARRAY[]::uuid[] AS likes, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(new.post_id)
        .bind(new.user_id)
        .bind(&new.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = $1");
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    async fn list(&self, filter: &CommentFilter, page: Page) -> Result<Paged<Comment>, StoreError> {
        let sql = format!(
            "{COMMENT_SELECT}
             WHERE ($1::uuid IS NULL OR c.post_id = $1)
             ORDER BY c.created_at DESC
             LIMIT $2 OFFSET $3"
        );

        let items = sqlx::query_as::<_, Comment>(&sql)
            .bind(filter.post_id)
            .bind(page.limit as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE ($1::uuid IS NULL OR post_id = $1)")
                .bind(filter.post_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(Paged {
            items,
            total: total as u64,
        })
    }

    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let sql = format!("{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at DESC");
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Comment>, StoreError> {
        let result =
            sqlx::query("UPDATE comments SET text = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(text)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Comment>, StoreError> {
        sqlx::query(
            "WITH removed AS (
                 DELETE FROM comment_likes WHERE comment_id = $1 AND user_id = $2 RETURNING 1
             )
             INSERT INTO comment_likes (comment_id, user_id)
             SELECT $1, $2
             WHERE NOT EXISTS (SELECT 1 FROM removed)
               AND EXISTS (SELECT 1 FROM comments WHERE id = $1)
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await
    }
}
