use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{CategoryRepository, StoreError};
use crate::models::{Category, NewCategory};

const TITLE_IN_USE: &str = "Category title already exists";

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, new: NewCategory) -> Result<Category, StoreError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, title, user_id)
             VALUES ($1, $2, $3)
             RETURNING id, title, user_id, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(new.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, TITLE_IN_USE))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, title, user_id, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Category>, StoreError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, title, user_id, created_at, updated_at FROM categories WHERE title = $1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, title, user_id, created_at, updated_at FROM categories ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn update_title(&self, id: Uuid, title: &str) -> Result<Option<Category>, StoreError> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET title = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING id, title, user_id, created_at, updated_at",
        )
        .bind(id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, TITLE_IN_USE))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
