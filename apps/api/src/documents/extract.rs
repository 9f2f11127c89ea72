//! Text extraction from uploaded resume files.
//!
//! PDF decoding is CPU-bound and runs inside `tokio::task::spawn_blocking`.
//! A panic inside the decoder is reported as an extraction error.

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("Unsupported file format '{0}'. Please upload a PDF or TXT file.")]
    UnsupportedFormat(String),

    #[error("Could not extract text from the file. It might be image-based. Try pasting text instead.")]
    NoExtractableText,

    #[error("Error reading the file: {0}. Try pasting text instead.")]
    Extraction(String),
}

/// Decides how to read a file from its declared media type, name, and magic bytes.
pub fn detect_kind(
    bytes: &[u8],
    content_type: Option<&str>,
    file_name: Option<&str>,
) -> Result<DocumentKind, DocumentError> {
    let media = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .unwrap_or_default();
    let extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if media == "application/pdf" || extension == "pdf" || bytes.starts_with(PDF_MAGIC) {
        return Ok(DocumentKind::Pdf);
    }
    if media == "text/plain" || extension == "txt" {
        return Ok(DocumentKind::PlainText);
    }

    let declared = match (media.is_empty(), extension.is_empty()) {
        (false, _) => media,
        (true, false) => format!(".{extension}"),
        (true, true) => "unknown".to_string(),
    };
    Err(DocumentError::UnsupportedFormat(declared))
}

/// Extracts plain text from an uploaded file.
pub async fn extract_text(
    bytes: Bytes,
    content_type: Option<&str>,
    file_name: Option<&str>,
) -> Result<String, DocumentError> {
    let kind = detect_kind(&bytes, content_type, file_name)?;
    debug!("Extracting {kind:?} document ({} bytes)", bytes.len());

    let text = match kind {
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|_| DocumentError::Extraction("file is not valid UTF-8 text".to_string()))?,
        DocumentKind::Pdf => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| DocumentError::Extraction(format!("PDF decoder crashed: {e}")))?
        .map_err(DocumentError::Extraction)?,
    };

    if text.trim().is_empty() {
        return Err(DocumentError::NoExtractableText);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_pdf_by_media_type_name_or_magic() {
        assert_eq!(detect_kind(b"", Some("application/pdf"), None), Ok(DocumentKind::Pdf));
        assert_eq!(detect_kind(b"", None, Some("Resume.PDF")), Ok(DocumentKind::Pdf));
        assert_eq!(
            detect_kind(b"%PDF-1.7\n...", Some("application/octet-stream"), None),
            Ok(DocumentKind::Pdf)
        );
    }

    #[test]
    fn test_detect_plain_text_with_charset_parameter() {
        assert_eq!(
            detect_kind(b"hi", Some("text/plain; charset=utf-8"), None),
            Ok(DocumentKind::PlainText)
        );
        assert_eq!(detect_kind(b"hi", None, Some("cv.txt")), Ok(DocumentKind::PlainText));
    }

    #[test]
    fn test_detect_rejects_other_formats() {
        assert_eq!(
            detect_kind(b"PK\x03\x04", Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"), Some("cv.docx")),
            Err(DocumentError::UnsupportedFormat(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string()
            ))
        );
        assert_eq!(
            detect_kind(b"", None, Some("photo.png")),
            Err(DocumentError::UnsupportedFormat(".png".to_string()))
        );
        assert_eq!(
            detect_kind(b"", None, None),
            Err(DocumentError::UnsupportedFormat("unknown".to_string()))
        );
    }

    #[tokio::test]
    async fn test_plain_text_is_returned_as_is() {
        let text = extract_text(Bytes::from_static(b"Jane Doe\nEngineer"), Some("text/plain"), None)
            .await
            .unwrap();
        assert_eq!(text, "Jane Doe\nEngineer");
    }

    #[tokio::test]
    async fn test_blank_text_has_no_extractable_text() {
        let err = extract_text(Bytes::from_static(b"  \n\t "), None, Some("cv.txt"))
            .await
            .unwrap_err();
        assert_eq!(err, DocumentError::NoExtractableText);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_extraction_error() {
        let err = extract_text(Bytes::from_static(&[0xff, 0xfe, 0x00]), Some("text/plain"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_not_accepted() {
        let result = extract_text(
            Bytes::from_static(b"%PDF-1.4\nthis is not really a pdf"),
            Some("application/pdf"),
            Some("cv.pdf"),
        )
        .await;
        assert!(matches!(
            result,
            Err(DocumentError::Extraction(_)) | Err(DocumentError::NoExtractableText)
        ));
    }
}
