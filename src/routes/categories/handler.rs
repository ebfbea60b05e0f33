use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::model::{CategoryListResponse, CategoryRequest, CategoryResponse};
use crate::{
    AppState,
    error::AppResult,
    middleware::Caller,
    result::{message_response, success_response},
    routes::{ValidJson, parse_id},
    services::categories,
};

#[axum::debug_handler]
pub async fn create_category(
    State(state): State<AppState>,
    caller: Caller,
    ValidJson(req): ValidJson<CategoryRequest>,
) -> AppResult<impl IntoResponse> {
    let category = categories::create(&state, &caller, &req.title).await?;
    Ok((
        StatusCode::CREATED,
        success_response("Category created successfully", CategoryResponse { category }),
    ))
}

#[axum::debug_handler]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let categories = categories::list(&state).await?;
    Ok(success_response(
        "Categories fetched successfully",
        CategoryListResponse { categories },
    ))
}

#[axum::debug_handler]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let category = categories::get(&state, parse_id(&id)?).await?;
    Ok(success_response(
        "Category fetched successfully",
        CategoryResponse { category },
    ))
}

#[axum::debug_handler]
pub async fn update_category(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<CategoryRequest>,
) -> AppResult<impl IntoResponse> {
    let category = categories::update(&state, &caller, parse_id(&id)?, &req.title).await?;
    Ok(success_response(
        "Category updated successfully",
        CategoryResponse { category },
    ))
}

#[axum::debug_handler]
pub async fn delete_category(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    categories::delete(&state, &caller, parse_id(&id)?).await?;
    Ok(message_response("Category deleted successfully"))
}
