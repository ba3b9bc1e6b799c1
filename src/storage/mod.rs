pub mod cloudinary;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::MediaConfig;
use crate::error::{AppError, AppResult};

pub use cloudinary::CloudinaryStorage;

/// Provider resource class. `Auto` lets the provider decide from the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Raw,
    Video,
    Auto,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Raw => "raw",
            ResourceType::Video => "video",
            ResourceType::Auto => "auto",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "image" => ResourceType::Image,
            "video" => ResourceType::Video,
            "auto" => ResourceType::Auto,
            _ => ResourceType::Raw,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub folder: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub resource_type: ResourceType,
}

/// A file read from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn into_request(self, folder: &str, resource_type: ResourceType) -> UploadRequest {
        UploadRequest {
            folder: folder.to_string(),
            file_name: self.file_name,
            content_type: self.content_type,
            bytes: self.bytes,
            resource_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    pub bytes: i64,
    pub format: Option<String>,
    pub resource_type: String,
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> AppResult<UploadedMedia>;

    async fn destroy(&self, public_id: &str, resource_type: ResourceType) -> AppResult<()>;
}

pub type SharedMediaStorage = Arc<dyn MediaStorage>;

/// Used when no provider credentials are configured; every call fails with 502.
pub struct UnconfiguredStorage;

#[async_trait]
impl MediaStorage for UnconfiguredStorage {
    async fn upload(&self, _request: UploadRequest) -> AppResult<UploadedMedia> {
        Err(AppError::storage("Media storage is not configured"))
    }

    async fn destroy(&self, _public_id: &str, _resource_type: ResourceType) -> AppResult<()> {
        Err(AppError::storage("Media storage is not configured"))
    }
}

pub fn create_media_storage(config: &MediaConfig) -> SharedMediaStorage {
    match (&config.cloud_name, &config.api_key, &config.api_secret) {
        (Some(cloud_name), Some(api_key), Some(api_secret)) => Arc::new(CloudinaryStorage::new(
            cloud_name.clone(),
            api_key.clone(),
            api_secret.clone(),
        )),
        _ => {
            tracing::warn!("Cloudinary credentials missing; uploads are disabled");
            Arc::new(UnconfiguredStorage)
        }
    }
}
