use task_board::validation::upload::{
    sanitize_file_name, validate_image_upload, validate_upload_size,
};

const MAX: usize = 10 * 1024 * 1024;

#[test]
fn only_raster_images_are_accepted_for_covers() {
    assert!(validate_image_upload("image/png", 1024, MAX).is_ok());
    assert!(validate_image_upload("IMAGE/JPEG", 1024, MAX).is_ok());
    assert!(validate_image_upload("image/gif", 1024, MAX).is_err());
    assert!(validate_image_upload("application/pdf", 1024, MAX).is_err());
}

#[test]
fn size_limits() {
    assert!(validate_upload_size(0, MAX).is_err());
    assert!(validate_upload_size(MAX, MAX).is_ok());
    assert!(validate_upload_size(MAX + 1, MAX).is_err());
}

#[test]
fn file_names_lose_their_directories() {
    assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
    assert_eq!(sanitize_file_name("C:\\Users\\me\\report.pdf"), "report.pdf");
    assert_eq!(sanitize_file_name("   "), "file");
}
