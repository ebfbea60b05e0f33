use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::infrastructure::mailer::reset_password_email;
use crate::models::User;
use crate::services::normalize_email;

async fn existing_user(state: &AppState, user_id: Uuid) -> AppResult<User> {
    state
        .repos
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

/// 发送重置密码链接，已有令牌时轮换而不是新增
pub async fn request_reset(state: &AppState, email: &str) -> AppResult<()> {
    let user = state
        .repos
        .users
        .find_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let token = state.tokens().reissue_or_rotate(user.id).await?;
    let link = state.config.reset_password_link(&user.id, &token.token);

    state
        .mailer
        .send_email(&user.email, "Password Reset Link", &reset_password_email(&link))
        .await?;

    tracing::info!("Sent password reset link to user {}", user.id);
    Ok(())
}

pub async fn check_token(state: &AppState, user_id: Uuid, token: &str) -> AppResult<()> {
    let user = existing_user(state, user_id).await?;
    state
        .tokens()
        .find(user.id, token)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    Ok(())
}

pub async fn reset_password(
    state: &AppState,
    user_id: Uuid,
    token: &str,
    new_password: &str,
) -> AppResult<()> {
    let user = existing_user(state, user_id).await?;

    // 先消费令牌，并发请求中只有删除成功的一方可以改密码
    state.tokens().consume(user.id, token).await?;

    state
        .credentials()
        .set_password(user.id, new_password)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    tracing::info!("Password reset for user {}", user.id);
    Ok(())
}
