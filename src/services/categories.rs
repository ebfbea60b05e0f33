use uuid::Uuid;

use super::CategoryView;
use super::views::category_views;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::Caller;
use crate::models::{Category, NewCategory};

async fn view(state: &AppState, category: Category) -> AppResult<CategoryView> {
    category_views(state, vec![category])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("category view missing".into()))
}

/// 标题全局唯一，重复时返回 Duplicate
pub async fn create(state: &AppState, caller: &Caller, title: &str) -> AppResult<CategoryView> {
    caller.require_admin()?;
    let title = title.trim();

    if state.repos.categories.find_by_title(title).await?.is_some() {
        return Err(AppError::Duplicate("Category title already exists".into()));
    }

    // 并发创建时由唯一约束兜底
    let category = state
        .repos
        .categories
        .create(NewCategory {
            title: title.to_string(),
            user_id: caller.id,
        })
        .await?;

    tracing::info!("Admin {} created category {}", caller.id, category.title);
    view(state, category).await
}

pub async fn list(state: &AppState) -> AppResult<Vec<CategoryView>> {
    let categories = state.repos.categories.list().await?;
    category_views(state, categories).await
}

pub async fn get(state: &AppState, id: Uuid) -> AppResult<CategoryView> {
    let category = state
        .repos
        .categories
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    view(state, category).await
}

pub async fn update(
    state: &AppState,
    caller: &Caller,
    id: Uuid,
    title: &str,
) -> AppResult<CategoryView> {
    caller.require_admin()?;
    let title = title.trim();

    if let Some(existing) = state.repos.categories.find_by_title(title).await? {
        if existing.id != id {
            return Err(AppError::Duplicate("Title already in use".into()));
        }
    }

    let category = state
        .repos
        .categories
        .update_title(id, title)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    view(state, category).await
}

pub async fn delete(state: &AppState, caller: &Caller, id: Uuid) -> AppResult<()> {
    caller.require_admin()?;
    if !state.repos.categories.delete(id).await? {
        return Err(AppError::not_found("Category"));
    }
    tracing::info!("Admin {} deleted category {}", caller.id, id);
    Ok(())
}
