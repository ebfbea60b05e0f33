use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::infrastructure::mailer::verification_email;
use crate::models::PublicUser;
use crate::utils::generate_token;

/// 登录成功后返回的会话
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub expires_at: i64,
    #[serde(flatten)]
    pub user: PublicUser,
}

/// 注册新用户并发送验证邮件
///
/// 邮件发送失败不回滚账号，只记录日志。
pub async fn register(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<PublicUser> {
    let user = state.credentials().create(username, email, password).await?;
    let token = state.tokens().issue(user.id).await?;

    let link = state.config.verify_email_link(&user.id, &token.token);
    if let Err(e) = state
        .mailer
        .send_email(&user.email, "Verify Your Email", &verification_email(&link))
        .await
    {
        tracing::error!("Failed to send verification email to user {}: {}", user.id, e);
    }

    tracing::info!("Registered user {}", user.id);
    Ok(user.sanitized())
}

/// 校验顺序：凭证、封禁、邮箱验证
pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<Session> {
    let user = state
        .credentials()
        .verify_credentials(email, password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if user.is_blocked {
        return Err(AppError::AccountBlocked);
    }
    if !user.is_account_verified {
        return Err(AppError::EmailNotVerified);
    }

    let (token, expires_at) = generate_token(&user, &state.config)?;
    tracing::info!("User {} logged in", user.id);

    Ok(Session {
        token,
        expires_at,
        user: user.sanitized(),
    })
}

pub async fn verify_email(state: &AppState, user_id: Uuid, token: &str) -> AppResult<()> {
    let user = state
        .repos
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if user.is_account_verified {
        return Err(AppError::AlreadyVerified);
    }

    state.tokens().consume(user.id, token).await?;
    state.repos.users.set_verified(user.id).await?;

    tracing::info!("Verified email of user {}", user.id);
    Ok(())
}
