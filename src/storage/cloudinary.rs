use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{MediaStorage, ResourceType, UploadRequest, UploadedMedia};
use crate::error::{AppError, AppResult};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Clone)]
pub struct CloudinaryStorage {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    bytes: i64,
    format: Option<String>,
    resource_type: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Parameters sorted by key, joined as `k=v&k=v`. Empty values are skipped.
pub fn string_to_sign(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryStorage {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name,
            api_key,
            api_secret,
        }
    }

    fn endpoint(&self, resource_type: ResourceType, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            API_BASE,
            self.cloud_name,
            resource_type.as_str(),
            action
        )
    }

    fn signed_form(&self, params: Vec<(&'static str, String)>) -> Form {
        let signature = sign(&params, &self.api_secret);
        let mut form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }
        form
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => format!("Cloudinary returned {}: {}", status, body.error.message),
            Err(_) => format!("Cloudinary returned {}", status),
        }
    }
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(&self, request: UploadRequest) -> AppResult<UploadedMedia> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = vec![("folder", request.folder.clone()), ("timestamp", timestamp)];

        let part = Part::bytes(request.bytes)
            .file_name(request.file_name.clone())
            .mime_str(&request.content_type)
            .map_err(|e| AppError::storage(format!("Invalid content type: {}", e)))?;
        let form = self.signed_form(params).part("file", part);

        let response = self
            .client
            .post(self.endpoint(request.resource_type, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::storage(format!("Cloudinary upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::storage(Self::error_message(response).await));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::storage(format!("Unexpected Cloudinary response: {}", e)))?;

        tracing::info!(
            public_id = %body.public_id,
            bytes = body.bytes,
            folder = %request.folder,
            "Uploaded media"
        );

        Ok(UploadedMedia {
            url: body.secure_url,
            public_id: body.public_id,
            bytes: body.bytes,
            format: body.format,
            resource_type: body.resource_type,
        })
    }

    async fn destroy(&self, public_id: &str, resource_type: ResourceType) -> AppResult<()> {
        // destroy does not accept `auto`
        let resource_type = match resource_type {
            ResourceType::Auto => ResourceType::Image,
            other => other,
        };
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = vec![("public_id", public_id.to_string()), ("timestamp", timestamp)];

        let response = self
            .client
            .post(self.endpoint(resource_type, "destroy"))
            .multipart(self.signed_form(params))
            .send()
            .await
            .map_err(|e| AppError::storage(format!("Cloudinary destroy failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::storage(Self::error_message(response).await));
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| AppError::storage(format!("Unexpected Cloudinary response: {}", e)))?;

        match body.result.as_str() {
            "ok" | "not found" => {
                tracing::info!(public_id = %public_id, result = %body.result, "Destroyed media");
                Ok(())
            }
            other => Err(AppError::storage(format!(
                "Cloudinary could not destroy {}: {}",
                public_id, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_to_sign_sorts_and_skips_empty() {
        let params = vec![
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", String::new()),
        ];
        assert_eq!(
            string_to_sign(&params),
            "public_id=sample_image&timestamp=1315060510"
        );
    }

    #[test]
    fn signature_is_hex_sha256_and_secret_dependent() {
        let params = vec![("timestamp", "1315060510".to_string())];
        let a = sign(&params, "secret-a");
        let b = sign(&params, "secret-b");
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_eq!(a, sign(&params, "secret-a"));
    }

    #[test]
    fn endpoint_includes_resource_type() {
        let storage = CloudinaryStorage::new("demo".into(), "key".into(), "secret".into());
        assert_eq!(
            storage.endpoint(ResourceType::Auto, "upload"),
            "https://api.cloudinary.com/v1_1/demo/auto/upload"
        );
    }
}
