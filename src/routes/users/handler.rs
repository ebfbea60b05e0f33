use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
};

use super::model::{
    BlockResponse, CountResponse, ProfileImageResponse, ProfileResponse, UpdateProfileRequest,
    UserListQuery, UserListResponse, UserResponse,
};
use crate::{
    AppState,
    error::{AppError, AppResult},
    middleware::Caller,
    result::{message_response, success_response},
    routes::{Paging, ValidJson, parse_id, read_upload},
    services::users,
};

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<UserListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = query
        .page
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(1);

    let (page, paged) = users::list(&state, &caller, page).await?;
    Ok(success_response(
        "Users fetched successfully",
        UserListResponse {
            paging: Paging::new(page, paged.total),
            users: paged.items,
        },
    ))
}

#[axum::debug_handler]
pub async fn count_users(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<impl IntoResponse> {
    let count = users::count(&state, &caller).await?;
    Ok(success_response(
        "Total user count fetched successfully",
        CountResponse { count },
    ))
}

#[axum::debug_handler]
pub async fn my_profile(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<impl IntoResponse> {
    let user = users::my_profile(&state, &caller).await?;
    Ok(success_response(
        "Profile fetched successfully",
        ProfileResponse { user },
    ))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user = users::profile(&state, parse_id(&id)?).await?;
    Ok(success_response(
        "Profile fetched successfully",
        ProfileResponse { user },
    ))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    let user = users::update_profile(&state, &caller, parse_id(&id)?, req.into()).await?;
    Ok(success_response(
        "Profile updated successfully",
        UserResponse { user },
    ))
}

#[axum::debug_handler]
pub async fn upload_profile_image(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_upload(multipart).await?;
    let Some(image) = form.image else {
        return Err(AppError::BadRequest("No file uploaded".into()));
    };

    let profile_image = users::upload_profile_image(&state, &caller, image).await?;
    Ok(success_response(
        "Profile image uploaded successfully",
        ProfileImageResponse { profile_image },
    ))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user = users::delete(&state, &caller, parse_id(&id)?).await?;
    Ok(success_response(
        "Profile has been deleted successfully",
        UserResponse { user },
    ))
}

#[axum::debug_handler]
pub async fn toggle_block(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let is_blocked = users::toggle_block(&state, &caller, parse_id(&id)?).await?;
    let message = if is_blocked {
        "User blocked successfully"
    } else {
        "User unblocked successfully"
    };
    Ok(success_response(message, BlockResponse { is_blocked }))
}

#[axum::debug_handler]
pub async fn verify_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    users::verify(&state, &caller, parse_id(&id)?).await?;
    Ok(message_response("User verified successfully"))
}
