use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{StoreError, UserCascade, UserRepository};
use crate::models::user::DEFAULT_PROFILE_IMAGE_URL;
use crate::models::{Image, NewUser, Page, Paged, User, UserUpdate};

const USER_COLUMNS: &str = "id, username, email, password_hash, is_admin, is_blocked, \
     is_account_verified, profile_image_url, profile_image_id, bio, created_at, updated_at";

/// 用户存储库实现
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, profile_image_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );

        let result = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(DEFAULT_PROFILE_IMAGE_URL)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(user) => {
                tracing::info!("Created user: {}", user.id);
                Ok(user)
            }
            Err(e) => Err(StoreError::from_insert(e, "Email is used before")),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users
             SET username = COALESCE($2, username),
                 bio = COALESCE($3, bio),
                 password_hash = COALESCE($4, password_hash),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.username)
            .bind(update.bio)
            .bind(update.password_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET is_blocked = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(blocked)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_admin(&self, id: Uuid, admin: bool) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET is_admin = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(admin)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_verified(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET is_account_verified = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_profile_image(&self, id: Uuid, image: &Image) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users
             SET profile_image_url = $2, profile_image_id = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&image.url)
        .bind(&image.public_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_except(&self, exclude: Uuid, page: Page) -> Result<Paged<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE id <> $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        );

        let items = sqlx::query_as::<_, User>(&sql)
            .bind(exclude)
            .bind(page.limit as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id <> $1")
            .bind(exclude)
            .fetch_one(&self.pool)
            .await?;

        Ok(Paged {
            items,
            total: total as u64,
        })
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(total as u64)
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<Option<UserCascade>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        let Some(user) = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let post_image_ids: Vec<Option<String>> =
            sqlx::query_scalar("SELECT image_public_id FROM posts WHERE user_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        // 该用户文章下的评论以及该用户在别处的评论
        let comments = sqlx::query(
            "DELETE FROM comments
             WHERE user_id = $1
                OR post_id IN (SELECT id FROM posts WHERE user_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let posts = sqlx::query("DELETE FROM posts WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Deleted user {} with {} posts and {} comments",
            id,
            posts.rows_affected(),
            comments.rows_affected()
        );

        Ok(Some(UserCascade {
            user,
            post_image_ids: post_image_ids.into_iter().flatten().collect(),
            posts_deleted: posts.rows_affected(),
            comments_deleted: comments.rows_affected(),
        }))
    }
}
