//! Upload validation: decides which referral files may be forwarded to the model.
//!
//! Accepts PDF, TIFF, JPEG and PNG. The MIME type is taken from the file
//! extension for TIFF (browsers often send TIFF with an empty or generic
//! Content-Type), otherwise from the declared Content-Type, and falls back to
//! magic-byte sniffing and finally to the extension.

use std::path::Path;

use thiserror::Error;

use crate::assessment::UploadedDocument;

/// MIME types the service forwards.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/tiff",
    "image/x-tiff",
    "image/jpeg",
    "image/png",
];

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Uploaded file is empty")]
    Empty,

    #[error("File too large ({size} bytes, maximum {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Invalid file type. Only PDF, TIFF, JPEG, and PNG files are allowed.")]
    UnsupportedType(String),
}

/// Check an uploaded file and package it for the model.
pub fn validate_upload(
    filename: &str,
    declared_mime: Option<&str>,
    bytes: Vec<u8>,
    max_bytes: usize,
) -> Result<UploadedDocument, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() > max_bytes {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    let mime_type = resolve_mime_type(filename, declared_mime, &bytes);
    if !is_allowed_mime(&mime_type) {
        return Err(UploadError::UnsupportedType(mime_type));
    }

    Ok(UploadedDocument {
        filename: sanitize_filename(filename),
        mime_type: canonical_mime(&mime_type).to_string(),
        bytes,
    })
}

pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

/// Work out the effective MIME type of an upload.
pub fn resolve_mime_type(filename: &str, declared: Option<&str>, bytes: &[u8]) -> String {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    if matches!(extension.as_deref(), Some("tif" | "tiff")) {
        return "image/tiff".into();
    }

    let declared = declared
        .and_then(|d| d.split(';').next())
        .map(|d| d.trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty() && d != OCTET_STREAM);
    if let Some(declared) = declared {
        return declared;
    }

    if let Some(sniffed) = detect_mime_from_bytes(bytes) {
        return sniffed.into();
    }

    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// Detect MIME type from file magic bytes.
pub fn detect_mime_from_bytes(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }

    // PDF: %PDF
    if bytes.starts_with(b"%PDF") {
        return Some("application/pdf");
    }
    // PNG: 89 50 4E 47
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Some("image/png");
    }
    // JPEG: FF D8 FF
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    // TIFF: II*\0 (little-endian) or MM\0* (big-endian)
    if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        return Some("image/tiff");
    }

    None
}

/// The model API only knows the registered TIFF type.
fn canonical_mime(mime: &str) -> &str {
    match mime {
        "image/x-tiff" => "image/tiff",
        other => other,
    }
}

/// Sanitize a filename. Removes path traversal and special characters.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized: String = sanitized.replace("..", "").chars().take(100).collect();

    if sanitized.is_empty() {
        "document".into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &[u8] = b"%PDF-1.7 referral";
    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    // -- MIME resolution ------------------------------------------------------

    #[test]
    fn detect_known_signatures() {
        assert_eq!(detect_mime_from_bytes(PDF), Some("application/pdf"));
        assert_eq!(detect_mime_from_bytes(PNG), Some("image/png"));
        assert_eq!(
            detect_mime_from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            Some("image/jpeg")
        );
        assert_eq!(detect_mime_from_bytes(b"II*\0rest"), Some("image/tiff"));
        assert_eq!(detect_mime_from_bytes(b"MM\0*rest"), Some("image/tiff"));
    }

    #[test]
    fn detect_unknown_or_short() {
        assert_eq!(detect_mime_from_bytes(b"GIF89a"), None);
        assert_eq!(detect_mime_from_bytes(&[0xFF]), None);
        assert_eq!(detect_mime_from_bytes(&[]), None);
    }

    #[test]
    fn tiff_extension_overrides_declared_type() {
        assert_eq!(
            resolve_mime_type("scan.TIF", Some("application/octet-stream"), b"junk"),
            "image/tiff"
        );
        assert_eq!(resolve_mime_type("scan.tiff", Some("text/plain"), b""), "image/tiff");
    }

    #[test]
    fn declared_type_is_used_when_specific() {
        assert_eq!(
            resolve_mime_type("letter", Some("Application/PDF; charset=binary"), b""),
            "application/pdf"
        );
    }

    #[test]
    fn generic_declared_type_falls_back_to_sniffing() {
        assert_eq!(
            resolve_mime_type("upload.bin", Some("application/octet-stream"), PNG),
            "image/png"
        );
        assert_eq!(resolve_mime_type("upload", None, PDF), "application/pdf");
    }

    #[test]
    fn extension_guess_is_last_resort() {
        assert_eq!(resolve_mime_type("photo.jpg", None, b"????"), "image/jpeg");
        assert_eq!(resolve_mime_type("mystery", None, b"????"), OCTET_STREAM);
    }

    // -- Validation -----------------------------------------------------------

    #[test]
    fn accepts_all_allowed_types() {
        for mime in ALLOWED_MIME_TYPES {
            let doc = validate_upload("file", Some(*mime), PDF.to_vec(), 1024).unwrap();
            assert!(is_allowed_mime(&doc.mime_type));
        }
    }

    #[test]
    fn x_tiff_is_forwarded_as_tiff() {
        let doc = validate_upload("scan", Some("image/x-tiff"), PDF.to_vec(), 1024).unwrap();
        assert_eq!(doc.mime_type, "image/tiff");
    }

    #[test]
    fn rejects_disallowed_type() {
        let err = validate_upload("notes.txt", Some("text/plain"), b"hello".to_vec(), 1024)
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(ref m) if m == "text/plain"));
        assert_eq!(
            err.to_string(),
            "Invalid file type. Only PDF, TIFF, JPEG, and PNG files are allowed."
        );
    }

    #[test]
    fn rejects_empty_file() {
        let err = validate_upload("a.pdf", Some("application/pdf"), Vec::new(), 1024).unwrap_err();
        assert!(matches!(err, UploadError::Empty));
    }

    #[test]
    fn rejects_oversized_file() {
        let err = validate_upload("a.pdf", None, vec![0u8; 11], 10).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { size: 11, limit: 10 }));
    }

    #[test]
    fn validated_document_has_sanitized_name() {
        let doc = validate_upload("../my referral.pdf", None, PDF.to_vec(), 1024).unwrap();
        assert_eq!(doc.filename, "my_referral.pdf");
        assert_eq!(doc.size_bytes(), PDF.len());
    }

    // -- Filename sanitization ------------------------------------------------

    #[test]
    fn sanitize_path_traversal() {
        let result = sanitize_filename("../../../etc/passwd");
        assert!(!result.contains(".."));
        assert!(!result.contains('/'));
    }

    #[test]
    fn sanitize_special_chars() {
        assert_eq!(sanitize_filename("my file (1).jpg"), "my_file__1_.jpg");
    }

    #[test]
    fn sanitize_long_multibyte_name() {
        let result = sanitize_filename(&"é".repeat(200));
        assert_eq!(result.chars().count(), 100);
    }

    #[test]
    fn sanitize_empty_name() {
        assert_eq!(sanitize_filename(""), "document");
    }
}
