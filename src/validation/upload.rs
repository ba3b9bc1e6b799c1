use crate::error::AppError;

pub const IMAGE_MIME_TYPES: [&str; 4] = ["image/jpg", "image/jpeg", "image/png", "image/webp"];

pub const MAX_ATTACHMENTS_PER_CARD: i64 = 20;

/// Covers and avatars only accept a handful of raster formats.
pub fn validate_image_upload(content_type: &str, size: usize, max_bytes: usize) -> Result<(), AppError> {
    if !IMAGE_MIME_TYPES.contains(&content_type.to_ascii_lowercase().as_str()) {
        return Err(AppError::validation(
            "File type is invalid. Only accept jpg, jpeg, png and webp",
        ));
    }
    validate_upload_size(size, max_bytes)
}

pub fn validate_upload_size(size: usize, max_bytes: usize) -> Result<(), AppError> {
    if size == 0 {
        return Err(AppError::validation("Uploaded file is empty"));
    }
    if size > max_bytes {
        return Err(AppError::validation(format!(
            "File is too large (max {} bytes)",
            max_bytes
        )));
    }
    Ok(())
}

/// Strips any client-supplied directory components from an uploaded file name.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() {
        "file".to_string()
    } else {
        base.chars().take(255).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_upload_rules() {
        assert!(validate_image_upload("image/png", 10, 100).is_ok());
        assert!(validate_image_upload("IMAGE/JPEG", 10, 100).is_ok());
        assert!(validate_image_upload("application/pdf", 10, 100).is_err());
        assert!(validate_image_upload("image/png", 101, 100).is_err());
        assert!(validate_image_upload("image/png", 0, 100).is_err());
    }

    #[test]
    fn file_name_is_sanitized() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\plan.pdf"), "plan.pdf");
        assert_eq!(sanitize_file_name("  "), "file");
    }
}
