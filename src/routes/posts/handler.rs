use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::model::{
    CountResponse, CreatePostForm, DeletedPostResponse, PostDetailResponse, PostListQuery,
    PostListResponse, PostResponse, UpdatePostForm,
};
use crate::{
    AppState,
    error::{AppError, AppResult},
    middleware::Caller,
    models::PostFilter,
    result::success_response,
    routes::{Paging, page_from, parse_id, read_upload, validated},
    services::posts,
};

#[axum::debug_handler]
pub async fn create_post(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = read_upload(multipart).await?;
    let Some(image) = form.image.take() else {
        return Err(AppError::BadRequest("No file uploaded".into()));
    };
    let draft = validated(CreatePostForm::from_upload(&form))?;

    let post = posts::create(&state, &caller, draft.into(), image).await?;
    Ok((
        StatusCode::CREATED,
        success_response("Post created successfully", PostResponse { post }),
    ))
}

#[axum::debug_handler]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = page_from(query.page.as_deref(), query.limit.as_deref());
    let filter = PostFilter {
        category: query
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    };

    let paged = posts::list(&state, &filter, page).await?;
    Ok(success_response(
        "Posts fetched successfully",
        PostListResponse {
            paging: Paging::new(page, paged.total),
            posts: paged.items,
        },
    ))
}

#[axum::debug_handler]
pub async fn count_posts(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let count = posts::count(&state).await?;
    Ok(success_response(
        "Total post count fetched successfully",
        CountResponse { count },
    ))
}

#[axum::debug_handler]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let post = posts::get(&state, parse_id(&id)?).await?;
    Ok(success_response(
        "Post fetched successfully",
        PostDetailResponse { post },
    ))
}

#[axum::debug_handler]
pub async fn update_post(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let form = read_upload(multipart).await?;
    let changes = validated(UpdatePostForm::from_upload(&form))?;

    let post = posts::update(&state, &caller, id, changes.into(), form.image).await?;
    Ok(success_response(
        "Post updated successfully",
        PostResponse { post },
    ))
}

#[axum::debug_handler]
pub async fn delete_post(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let post = posts::delete(&state, &caller, parse_id(&id)?).await?;
    Ok(success_response(
        "Post deleted successfully",
        DeletedPostResponse { post },
    ))
}

#[axum::debug_handler]
pub async fn toggle_like(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let post = posts::toggle_like(&state, &caller, parse_id(&id)?).await?;
    Ok(success_response(
        "Post like toggled successfully",
        PostResponse { post },
    ))
}
