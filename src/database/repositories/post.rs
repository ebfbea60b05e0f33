use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{PostCascade, PostRepository, StoreError};
use crate::models::post::PostRow;
use crate::models::{NewPost, Page, Paged, Post, PostFilter, PostUpdate};

const POST_SELECT: &str = "SELECT p.id, p.title, p.description, p.category, p.image_url, \
     p.image_public_id, p.user_id, \
     ARRAY(SELECT l.user_id FROM post_likes l WHERE l.post_id = p.id) AS likes, \
     p.created_at, p.updated_at \
     FROM posts p";

pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, new: NewPost) -> Result<Post, StoreError> {
        let row = sqlx::query_as::<_, PostRow>(
            "INSERT INTO posts (id, title, description, category, image_url, image_public_id, user_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, title, description, category, image_url, image_public_id, user_id,
                       ARRAY[]::uuid[] AS likes, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.category)
        .bind(&new.image.url)
        .bind(&new.image.public_id)
        .bind(new.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn list(&self, filter: &PostFilter, page: Page) -> Result<Paged<Post>, StoreError> {
        let sql = format!(
            "{POST_SELECT}
             WHERE ($1::text IS NULL OR LOWER(p.category) = LOWER($1))
             ORDER BY p.created_at DESC
             LIMIT $2 OFFSET $3"
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&filter.category)
            .bind(page.limit as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE ($1::text IS NULL OR LOWER(category) = LOWER($1))",
        )
        .bind(&filter.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(Paged {
            items: rows.into_iter().map(Post::from).collect(),
            total: total as u64,
        })
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, StoreError> {
        let sql = format!("{POST_SELECT} WHERE p.user_id = $1 ORDER BY p.created_at DESC");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(total as u64)
    }

    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Option<Post>, StoreError> {
        let (image_url, image_public_id) = match update.image {
            Some(image) => (Some(image.url), image.public_id),
            None => (None, None),
        };

        let result = sqlx::query(
            "UPDATE posts
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 category = COALESCE($4, category),
                 image_public_id = CASE WHEN $5::text IS NULL THEN image_public_id ELSE $6 END,
                 image_url = COALESCE($5, image_url),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.category)
        .bind(image_url)
        .bind(image_public_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<Option<PostCascade>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("{POST_SELECT} WHERE p.id = $1 FOR UPDATE OF p");
        let Some(row) = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let comments = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(PostCascade {
            post: row.into(),
            comments_deleted: comments.rows_affected(),
        }))
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Post>, StoreError> {
        // 单条语句完成删除或插入，避免读改写竞争
        sqlx::query(
            "WITH removed AS (
                 DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2 RETURNING 1
             )
             INSERT INTO post_likes (post_id, user_id)
             SELECT $1, $2
             WHERE NOT EXISTS (SELECT 1 FROM removed)
               AND EXISTS (SELECT 1 FROM posts WHERE id = $1)
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await
    }
}
