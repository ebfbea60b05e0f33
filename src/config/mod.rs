use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub verification_token_ttl_secs: u64,
    pub bcrypt_cost: u32,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub client_url: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_api_key: String,
    pub cloudinary_api_secret: String,
    /// 启动时提升为管理员的邮箱
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

fn hours(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.trim().trim_end_matches('h').parse::<u64>().ok())
        .unwrap_or(default)
}

fn parsed<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: hours("JWT_EXPIRATION", 7 * 24) * 3600,
            verification_token_ttl_secs: hours("VERIFICATION_TOKEN_TTL", 24) * 3600,
            bcrypt_cost: parsed("BCRYPT_COST", 10),
            rate_limit_window_secs: parsed("RATE_LIMIT_WINDOW", 15 * 60),
            rate_limit_requests: parsed("RATE_LIMIT_REQUESTS", 100),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "::".into()),
            server_port: parsed("SERVER_PORT", 3000),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
            client_url: env::var("CLIENT_URL")?,
            mail_api_url: env::var("MAIL_API_URL")?,
            mail_api_key: env::var("MAIL_API_KEY")?,
            mail_from: env::var("MAIL_FROM")?,
            cloudinary_cloud_name: env::var("CLOUDINARY_CLOUD_NAME")?,
            cloudinary_api_key: env::var("CLOUDINARY_API_KEY")?,
            cloudinary_api_secret: env::var("CLOUDINARY_API_SECRET")?,
            admin_emails: env::var("ADMIN_EMAILS")
                .map(|v| {
                    v.split(',')
                        .map(|e| e.trim().to_lowercase())
                        .filter(|e| !e.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn verification_token_ttl(&self) -> Duration {
        Duration::from_secs(self.verification_token_ttl_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// 邮箱验证链接
    pub fn verify_email_link(&self, user_id: &uuid::Uuid, token: &str) -> String {
        format!(
            "{}/verify-email/{}/verify/{}",
            self.client_url.trim_end_matches('/'),
            user_id,
            token
        )
    }

    /// 重置密码链接
    pub fn reset_password_link(&self, user_id: &uuid::Uuid, token: &str) -> String {
        format!(
            "{}/new-password/{}/{}",
            self.client_url.trim_end_matches('/'),
            user_id,
            token
        )
    }

    /// 测试配置：低成本 bcrypt，本地地址，不访问外部服务
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/inkwell_test".into(),
            redis_url: "redis://127.0.0.1/".into(),
            jwt_secret: "test-secret".into(),
            jwt_expiration_secs: 7 * 24 * 3600,
            verification_token_ttl_secs: 24 * 3600,
            bcrypt_cost: 4,
            rate_limit_window_secs: 60,
            rate_limit_requests: 100,
            server_host: "127.0.0.1".into(),
            server_port: 0,
            api_base_uri: "/api".into(),
            client_url: "http://client.test".into(),
            mail_api_url: "http://mail.test/send".into(),
            mail_api_key: "mail-key".into(),
            mail_from: "blog@test".into(),
            cloudinary_cloud_name: "demo".into(),
            cloudinary_api_key: "key".into(),
            cloudinary_api_secret: "secret".into(),
            admin_emails: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_follow_client_routes() {
        let mut config = Config::for_tests();
        config.client_url = "https://blog.example/".into();
        let id = uuid::Uuid::nil();

        assert_eq!(
            config.verify_email_link(&id, "abc"),
            format!("https://blog.example/verify-email/{}/verify/abc", id)
        );
        assert_eq!(
            config.reset_password_link(&id, "abc"),
            format!("https://blog.example/new-password/{}/abc", id)
        );
    }
}
