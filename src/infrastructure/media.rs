use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{MediaHost, UploadedImage, UpstreamError};
use crate::config::Config;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary 图床，签名上传与删除
pub struct CloudinaryHost {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

/// 参数按键名排序后以 & 连接，末尾拼接密钥，取 SHA-256 十六进制
pub fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryHost {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            cloud_name: config.cloudinary_cloud_name.clone(),
            api_key: config.cloudinary_api_key.clone(),
            api_secret: config.cloudinary_api_secret.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.cloud_name)
    }

    fn signed_form(&self, params: &[(&str, &str)]) -> Form {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut signed: Vec<(&str, &str)> = params.to_vec();
        signed.push(("timestamp", &timestamp));
        let signature = sign(&signed, &self.api_secret);

        let mut form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key.to_string(), value.to_string());
        }
        form
    }

    async fn rejected(response: reqwest::Response) -> UpstreamError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        UpstreamError::Rejected {
            service: "cloudinary",
            status,
            body,
        }
    }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload_image(&self, bytes: Vec<u8>) -> Result<UploadedImage, UpstreamError> {
        let form = self
            .signed_form(&[])
            .part("file", Part::bytes(bytes).file_name("upload"));

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::info!("Uploaded image {}", uploaded.public_id);
        Ok(UploadedImage {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }

    async fn delete_image(&self, public_id: &str) -> Result<(), UpstreamError> {
        let form = self.signed_form(&[("public_id", public_id)]);

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let destroyed: DestroyResponse = response.json().await?;
        // "not found" 视为已删除
        if destroyed.result != "ok" && destroyed.result != "not found" {
            return Err(UpstreamError::Unavailable(format!(
                "cloudinary destroy returned {}",
                destroyed.result
            )));
        }

        tracing::info!("Deleted image {}", public_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_sorts_params() {
        let a = sign(&[("timestamp", "1"), ("public_id", "x")], "s");
        let b = sign(&[("public_id", "x"), ("timestamp", "1")], "s");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn signature_depends_on_secret() {
        let params = [("timestamp", "1700000000")];
        assert_ne!(sign(&params, "one"), sign(&params, "two"));
    }

    #[test]
    fn endpoint_uses_cloud_name() {
        let host = CloudinaryHost::new(Client::new(), &Config::for_tests());
        assert_eq!(
            host.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
