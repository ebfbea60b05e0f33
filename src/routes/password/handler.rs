use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use super::model::{NewPasswordRequest, ResetLinkRequest};
use crate::{
    AppState,
    error::AppResult,
    result::message_response,
    routes::{ValidJson, parse_id},
    services::password,
};

#[axum::debug_handler]
pub async fn request_reset(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ResetLinkRequest>,
) -> AppResult<impl IntoResponse> {
    password::request_reset(&state, &req.email).await?;
    Ok(message_response("Password reset link sent successfully"))
}

#[axum::debug_handler]
pub async fn check_token(
    State(state): State<AppState>,
    Path((user_id, token)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_id(&user_id)?;
    password::check_token(&state, user_id, &token).await?;
    Ok(message_response("Token is valid"))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Path((user_id, token)): Path<(String, String)>,
    ValidJson(req): ValidJson<NewPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_id(&user_id)?;
    password::reset_password(&state, user_id, &token, &req.password).await?;
    Ok(message_response("Password reset successfully"))
}
