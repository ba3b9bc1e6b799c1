use axum::extract::Multipart;

use crate::error::{AppError, AppResult};
use crate::storage::UploadedFile;

/// Reads the first part named `field_name`; other parts are skipped.
pub async fn read_file_field(multipart: &mut Multipart, field_name: &str) -> AppResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read upload: {}", e)))?;
        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(AppError::validation(format!("Missing file field '{}'", field_name)))
}
