use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::model::{
    CommentListQuery, CommentListResponse, CommentResponse, CreateCommentRequest,
    UpdateCommentRequest,
};
use crate::{
    AppState,
    error::{AppError, AppResult},
    middleware::Caller,
    models::CommentFilter,
    result::{message_response, success_response},
    routes::{Paging, ValidJson, page_from, parse_id},
    services::comments,
};

#[axum::debug_handler]
pub async fn create_comment(
    State(state): State<AppState>,
    caller: Caller,
    ValidJson(req): ValidJson<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    let post_id = req
        .post_id()
        .ok_or_else(|| AppError::invalid_field("post", "Invalid ID"))?;

    let comment = comments::create(&state, &caller, post_id, req.text).await?;
    Ok((
        StatusCode::CREATED,
        success_response("Comment created successfully", CommentResponse { comment }),
    ))
}

#[axum::debug_handler]
pub async fn list_comments(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<CommentListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = page_from(query.page.as_deref(), query.limit.as_deref());
    let post_id = match query.post.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw)?),
        _ => None,
    };

    let paged = comments::list(&state, &caller, &CommentFilter { post_id }, page).await?;
    Ok(success_response(
        "Comments fetched successfully",
        CommentListResponse {
            paging: Paging::new(page, paged.total),
            comments: paged.items,
        },
    ))
}

#[axum::debug_handler]
pub async fn get_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let comment = comments::get(&state, &caller, parse_id(&id)?).await?;
    Ok(success_response(
        "Comment fetched successfully",
        CommentResponse { comment },
    ))
}

#[axum::debug_handler]
pub async fn update_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    let comment = comments::update(&state, &caller, parse_id(&id)?, &req.text).await?;
    Ok(success_response(
        "Comment updated successfully",
        CommentResponse { comment },
    ))
}

#[axum::debug_handler]
pub async fn delete_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    comments::delete(&state, &caller, parse_id(&id)?).await?;
    Ok(message_response("Comment deleted successfully"))
}

#[axum::debug_handler]
pub async fn toggle_like(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let comment = comments::toggle_like(&state, &caller, parse_id(&id)?).await?;
    Ok(success_response(
        "Comment like toggled successfully",
        CommentResponse { comment },
    ))
}
