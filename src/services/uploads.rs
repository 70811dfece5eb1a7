use std::path::Path;

use crate::config::UploadConfig;
use crate::services::ContentError;

/// Multipart field names accepted for an upload; the first non-empty one wins
pub const UPLOAD_FIELDS: &[&str] = &["file", "image", "text"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    Image,
    Document,
}

/// Extension allow-lists for uploads, checked before anything reaches the store
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    image_extensions: Vec<String>,
    document_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            image_extensions: crate::config::normalize_extensions(config.image_extensions.clone()),
            document_extensions: crate::config::normalize_extensions(config.document_extensions.clone()),
        }
    }

    fn allowed(&self, category: UploadCategory) -> &[String] {
        match category {
            UploadCategory::Image => &self.image_extensions,
            UploadCategory::Document => &self.document_extensions,
        }
    }

    /// Whether a stored extension belongs to `category`
    pub fn accepts(&self, category: UploadCategory, extension: &str) -> bool {
        self.allowed(category).iter().any(|ext| ext == extension)
    }

    /// Check an upload's filename and size against one category.
    /// Returns the normalized extension to store with the file.
    pub fn validate(
        &self,
        category: UploadCategory,
        filename: &str,
        size: usize,
    ) -> Result<String, ContentError> {
        if size == 0 {
            return Err(ContentError::Validation("Empty request".to_string()));
        }

        let ext = extension_of(filename)
            .filter(|ext| self.accepts(category, ext))
            .ok_or_else(|| ContentError::Validation("Unsupported file".to_string()))?;
        Ok(ext)
    }

    /// Like `validate`, accepting any category. Used when replacing a file in place.
    pub fn validate_any(&self, filename: &str, size: usize) -> Result<String, ContentError> {
        self.validate(UploadCategory::Image, filename, size)
            .or_else(|_| self.validate(UploadCategory::Document, filename, size))
    }
}

/// Lowercased extension with its leading dot, e.g. "photo.PNG" -> ".png"
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// Content type served for a stored extension; unknown types fall back to text/plain
pub fn mime_for_extension(extension: &str) -> String {
    mime_guess::from_ext(extension.trim_start_matches('.'))
        .first_or(mime_guess::mime::TEXT_PLAIN)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UploadPolicy {
        UploadPolicy::from_config(&UploadConfig::default())
    }

    #[test]
    fn png_is_an_allowed_image() {
        let ext = policy().validate(UploadCategory::Image, "cat.PNG", 10).unwrap();
        assert_eq!(ext, ".png");
        assert_eq!(mime_for_extension(&ext), "image/png");
    }

    #[test]
    fn disallowed_extension_is_rejected() {
        let err = policy().validate(UploadCategory::Image, "run.exe", 10).unwrap_err();
        assert!(matches!(err, ContentError::Validation(ref m) if m == "Unsupported file"));

        // Documents are not images
        assert!(policy().validate(UploadCategory::Image, "notes.txt", 10).is_err());
        assert!(policy().validate(UploadCategory::Document, "notes.txt", 10).is_ok());
    }

    #[test]
    fn empty_upload_is_rejected() {
        let err = policy().validate(UploadCategory::Document, "notes.txt", 0).unwrap_err();
        assert!(matches!(err, ContentError::Validation(ref m) if m == "Empty request"));
    }

    #[test]
    fn missing_extension_is_rejected() {
        assert!(policy().validate_any("README", 4).is_err());
        assert_eq!(extension_of("archive.tar.JPG").as_deref(), Some(".jpg"));
        assert_eq!(extension_of("noext"), None);
    }

    #[test]
    fn mime_lookup_falls_back_to_text_plain() {
        assert_eq!(mime_for_extension(".jpeg"), "image/jpeg");
        assert_eq!(mime_for_extension(".txt"), "text/plain");
        assert_eq!(mime_for_extension(".zzzunknown"), "text/plain");
    }
}
