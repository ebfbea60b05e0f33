// 测试替身：记录发出的邮件、模拟图床

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Mailer, MediaHost, UploadedImage, UpstreamError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// 记录所有邮件，可设置为发送失败
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// 最后一封邮件中链接的末尾路径段，即令牌
    pub fn last_token(&self) -> Option<String> {
        let last = self.sent().pop()?;
        let start = last.html.find("href=\"")? + 6;
        let rest = &last.html[start..];
        let link = &rest[..rest.find('"')?];
        link.rsplit('/').next().map(str::to_string)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), UpstreamError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(UpstreamError::Unavailable("mailer offline".into()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                html: html.to_string(),
            });
        }
        Ok(())
    }
}

/// 内存图床，记录删除调用
#[derive(Default)]
pub struct FakeMediaHost {
    uploads: AtomicUsize,
    deleted: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
    fail_uploads: AtomicBool,
}

impl FakeMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// 所有删除尝试（包括失败的）
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn upload_image(&self, _bytes: Vec<u8>) -> Result<UploadedImage, UpstreamError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(UpstreamError::Unavailable("media host offline".into()));
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(UploadedImage {
            url: format!("https://media.test/image-{n}.png"),
            public_id: format!("image-{n}"),
        })
    }

    async fn delete_image(&self, public_id: &str) -> Result<(), UpstreamError> {
        if let Ok(mut deleted) = self.deleted.lock() {
            deleted.push(public_id.to_string());
        }
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(UpstreamError::Unavailable("media host offline".into()));
        }
        Ok(())
    }
}
