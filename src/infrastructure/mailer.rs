use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{Mailer, UpstreamError};
use crate::config::Config;

/// 通过 HTTP 邮件 API 发信，Bearer 鉴权
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl HttpMailer {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            from: config.mail_from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), UpstreamError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&OutgoingEmail {
                from: &self.from,
                to,
                subject,
                html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Mail API rejected message to {}: {}", to, status);
            return Err(UpstreamError::Rejected {
                service: "mail",
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Sent \"{}\" email to {}", subject, to);
        Ok(())
    }
}

/// 邮箱验证邮件正文
pub fn verification_email(link: &str) -> String {
    format!(
        "<div>\
           <p>Click on the link below to verify your email</p>\
           <a href=\"{link}\">Verify</a>\
         </div>"
    )
}

/// 重置密码邮件正文
pub fn reset_password_email(link: &str) -> String {
    format!(
        "<div>\
           <p>Click on the link below to reset your password</p>\
           <a href=\"{link}\">Reset Password</a>\
         </div>"
    )
}
