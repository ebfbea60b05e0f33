// 外部服务：邮件发送与图床
// 只通过 trait 暴露能力，便于测试替换

pub mod mailer;
pub mod media;
pub mod testing;

use async_trait::async_trait;

pub use mailer::HttpMailer;
pub use media::CloudinaryHost;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} responded with {status}: {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0}")]
    Unavailable(String),
}

/// 上传成功后图床返回的地址与资源ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), UpstreamError>;
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload_image(&self, bytes: Vec<u8>) -> Result<UploadedImage, UpstreamError>;
    async fn delete_image(&self, public_id: &str) -> Result<(), UpstreamError>;
}
