use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::model::{LoginRequest, RegisterRequest, SessionResponse, UserResponse};
use crate::{
    AppState,
    error::AppResult,
    result::{message_response, success_response},
    routes::{ValidJson, parse_id},
    services::auth,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let user = auth::register(&state, &req.username, &req.email, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        success_response(
            "We sent you an email, please check your inbox",
            UserResponse { user },
        ),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let session = auth::login(&state, &req.email, &req.password).await?;

    Ok(success_response(
        "User logged in successfully",
        SessionResponse { user: session },
    ))
}

#[axum::debug_handler]
pub async fn verify_email(
    State(state): State<AppState>,
    Path((user_id, token)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_id(&user_id)?;
    auth::verify_email(&state, user_id, &token).await?;

    Ok(message_response(
        "Email verified successfully. You can now log in.",
    ))
}
