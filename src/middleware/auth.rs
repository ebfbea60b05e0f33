use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use uuid::Uuid;

use crate::{AppState, error::AppError, models::User, utils::verify_token};

const NO_TOKEN: &str = "No token provided";
const BAD_TOKEN: &str = "Invalid or expired token";

/// 当前请求的调用者
///
/// 令牌只证明身份，角色和封禁状态每次都从数据库重新读取，
/// 因此封禁、降权立即生效，已删除用户的令牌直接失效。
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_blocked: bool,
}

impl Caller {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            is_blocked: user.is_blocked,
        }
    }

    /// 已登录且未被封禁
    pub fn require_active(&self) -> Result<(), AppError> {
        if self.is_blocked {
            return Err(AppError::Forbidden("User is blocked".into()));
        }
        Ok(())
    }

    pub fn require_owner_or_admin(&self, owner_id: Uuid) -> Result<(), AppError> {
        self.require_active()?;
        if self.id == owner_id || self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not allowed, only owner or admin".into()))
        }
    }

    /// 仅限本人，管理员也不例外
    pub fn require_owner(&self, owner_id: Uuid) -> Result<(), AppError> {
        self.require_active()?;
        if self.id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not allowed, only owner".into()))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_active()?;
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not allowed, only admin".into()))
        }
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        AppError::Unauthenticated(NO_TOKEN.into())
                    } else {
                        AppError::Unauthenticated(BAD_TOKEN.into())
                    }
                })?;

        let claims = verify_token(bearer.token(), &state.config).map_err(|e| {
            tracing::debug!("Rejected session token: {}", e);
            AppError::Unauthenticated(BAD_TOKEN.into())
        })?;

        let user = state
            .repos
            .users
            .find_by_id(claims.id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated(BAD_TOKEN.into()))?;

        Ok(Caller::from_user(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(is_admin: bool, is_blocked: bool) -> Caller {
        Caller {
            id: Uuid::new_v4(),
            username: "caller".into(),
            email: "caller@blog.io".into(),
            is_admin,
            is_blocked,
        }
    }

    #[test]
    fn owner_or_admin_gate() {
        let owner = caller(false, false);
        let admin = caller(true, false);
        let stranger = caller(false, false);

        assert!(owner.require_owner_or_admin(owner.id).is_ok());
        assert!(admin.require_owner_or_admin(owner.id).is_ok());
        assert!(matches!(
            stranger.require_owner_or_admin(owner.id),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn owner_gate_ignores_admin_role() {
        let owner = caller(false, false);
        let admin = caller(true, false);
        assert!(owner.require_owner(owner.id).is_ok());
        assert!(matches!(
            admin.require_owner(owner.id),
            Err(AppError::Forbidden(ref m)) if m == "Not allowed, only owner"
        ));
    }

    #[test]
    fn blocked_callers_fail_every_gate() {
        let blocked_admin = caller(true, true);
        for result in [
            blocked_admin.require_active(),
            blocked_admin.require_admin(),
            blocked_admin.require_owner(blocked_admin.id),
            blocked_admin.require_owner_or_admin(blocked_admin.id),
        ] {
            assert!(matches!(result, Err(AppError::Forbidden(ref m)) if m == "User is blocked"));
        }
    }
}
