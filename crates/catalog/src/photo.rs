//! Bootcamp photo upload rules.

use std::path::Path;

use devcamper_core::{DocumentId, DomainError, DomainResult};

pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

/// Accept only images no larger than `max_bytes`.
pub fn check_upload(content_type: Option<&str>, size: usize, max_bytes: usize) -> DomainResult<()> {
    if !content_type.is_some_and(|ct| ct.starts_with("image")) {
        return Err(DomainError::validation("Please upload an image file"));
    }
    if size > max_bytes {
        return Err(DomainError::validation(format!(
            "Please upload an image less than {max_bytes} bytes"
        )));
    }
    Ok(())
}

/// Stored name: `photo_<bootcamp id><original extension>`.
pub fn photo_file_name(bootcamp: DocumentId, original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("photo_{bootcamp}{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_small_images() {
        assert!(check_upload(Some("image/png"), 10, 100).is_ok());
        assert!(check_upload(Some("text/plain"), 10, 100).is_err());
        assert!(check_upload(None, 10, 100).is_err());
        assert_eq!(
            check_upload(Some("image/jpeg"), 101, 100).unwrap_err().to_string(),
            "Please upload an image less than 100 bytes"
        );
    }

    #[test]
    fn names_keep_extension() {
        let id = DocumentId::new();
        assert_eq!(photo_file_name(id, "me.jpg"), format!("photo_{id}.jpg"));
        assert_eq!(photo_file_name(id, "noext"), format!("photo_{id}"));
        assert_eq!(photo_file_name(id, "../../x.p/ng"), format!("photo_{id}"));
    }
}
