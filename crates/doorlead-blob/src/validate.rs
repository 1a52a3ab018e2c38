//! Batch constraints, enforced before any upload begins.

use crate::UploadError;

pub const MAX_FILES: usize = 3;
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_TOTAL_SIZE: usize = 30 * 1024 * 1024;
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/heic"];

/// One client-submitted file, already read into memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Checks the whole batch against the upload constraints.
///
/// Violating any constraint fails the batch with a visitor-readable
/// [`UploadError::Validation`]; no partial acceptance.
///
/// # Errors
///
/// Returns [`UploadError::Validation`] describing the first violated
/// constraint.
pub fn validate_batch(files: &[UploadFile]) -> Result<(), UploadError> {
    if files.is_empty() {
        return Err(UploadError::Validation("No files uploaded".to_string()));
    }
    if files.len() > MAX_FILES {
        return Err(UploadError::Validation(format!(
            "Maximum {MAX_FILES} files allowed"
        )));
    }

    let total: usize = files.iter().map(|f| f.bytes.len()).sum();
    if total > MAX_TOTAL_SIZE {
        return Err(UploadError::Validation(
            "Total file size exceeds 30MB".to_string(),
        ));
    }

    for file in files {
        if file.bytes.len() > MAX_FILE_SIZE {
            return Err(UploadError::Validation(
                "Individual file size exceeds 10MB".to_string(),
            ));
        }
        if !ALLOWED_CONTENT_TYPES.contains(&file.content_type.as_str()) {
            return Err(UploadError::Validation(
                "Invalid file type. Please upload only images.".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(filename: &str, size: usize) -> UploadFile {
        UploadFile {
            filename: filename.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0u8; size],
        }
    }

    #[test]
    fn accepts_a_valid_batch() {
        let files = vec![jpeg("a.jpg", 1024), jpeg("b.jpg", 2048)];
        assert!(validate_batch(&files).is_ok());
    }

    #[test]
    fn rejects_empty_batch() {
        let result = validate_batch(&[]);
        assert!(
            matches!(result, Err(UploadError::Validation(ref msg)) if msg == "No files uploaded")
        );
    }

    #[test]
    fn rejects_four_files() {
        let files = vec![
            jpeg("a.jpg", 10),
            jpeg("b.jpg", 10),
            jpeg("c.jpg", 10),
            jpeg("d.jpg", 10),
        ];
        let result = validate_batch(&files);
        assert!(
            matches!(result, Err(UploadError::Validation(ref msg)) if msg.contains("Maximum 3"))
        );
    }

    #[test]
    fn rejects_oversized_file() {
        let files = vec![jpeg("big.jpg", MAX_FILE_SIZE + 1)];
        let result = validate_batch(&files);
        assert!(
            matches!(result, Err(UploadError::Validation(ref msg)) if msg.contains("10MB"))
        );
    }

    #[test]
    fn rejects_oversized_total() {
        // Three files under the per-file cap that together break the 30MB cap.
        let files = vec![
            jpeg("a.jpg", MAX_FILE_SIZE),
            jpeg("b.jpg", MAX_FILE_SIZE),
            jpeg("c.jpg", MAX_FILE_SIZE + 1),
        ];
        let result = validate_batch(&files);
        assert!(
            matches!(result, Err(UploadError::Validation(ref msg)) if msg.contains("30MB"))
        );
    }

    #[test]
    fn rejects_disallowed_content_type() {
        let files = vec![UploadFile {
            filename: "notes.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![0u8; 128],
        }];
        let result = validate_batch(&files);
        assert!(
            matches!(result, Err(UploadError::Validation(ref msg)) if msg.contains("file type"))
        );
    }

    #[test]
    fn accepts_heic() {
        let files = vec![UploadFile {
            filename: "door.heic".to_string(),
            content_type: "image/heic".to_string(),
            bytes: vec![0u8; 128],
        }];
        assert!(validate_batch(&files).is_ok());
    }
}
