//! Upload Receiver: pulls the `resume` file and `keywords` text out of a
//! multipart body and owns the transient copy of the file on disk.
//!
//! `TransientResume` wraps a `tempfile::NamedTempFile`. The happy path calls
//! `cleanup()` exactly once; any early return or unwind drops the temp file,
//! which removes it as well.

use std::path::Path;

use axum::extract::Multipart;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::errors::AppError;

pub const RESUME_FIELD: &str = "resume";
pub const KEYWORDS_FIELD: &str = "keywords";
pub const DEFAULT_KEYWORDS: &str = "python,machine learning,data analysis";

const MAX_EXTENSION_LEN: usize = 8;

/// Comma-delimited keyword list handed to the scorer untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSpec(String);

impl KeywordSpec {
    /// An absent or blank field falls back to `DEFAULT_KEYWORDS`.
    pub fn from_field(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.is_empty() => KeywordSpec(v),
            _ => KeywordSpec(DEFAULT_KEYWORDS.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The uploaded resume, stored for the lifetime of one request.
#[derive(Debug)]
pub struct TransientResume {
    file: NamedTempFile,
    pub size: u64,
    pub original_name: String,
    pub content_type: Option<String>,
}

impl TransientResume {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Deletes the file. Failure is logged, never returned.
    pub fn cleanup(self) {
        let path = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => debug!("Removed transient upload {}", path.display()),
            Err(e) => warn!("Failed to delete transient upload {}: {e}", path.display()),
        }
    }
}

#[derive(Debug)]
pub struct ReceivedUpload {
    pub resume: Option<TransientResume>,
    pub keywords: KeywordSpec,
}

/// Drains the multipart body, streaming the `resume` part into `upload_dir`.
///
/// Only a `resume` part carrying a filename counts as the upload; a plain
/// text part of that name is ignored. A second `resume` file is rejected,
/// and the first one's temp file is removed when it drops.
pub async fn receive_upload(
    mut multipart: Multipart,
    upload_dir: &Path,
) -> Result<ReceivedUpload, AppError> {
    let mut resume = None;
    let mut keywords = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(RESUME_FIELD) if field.file_name().is_some() => {
                if resume.is_some() {
                    return Err(AppError::Upload(format!(
                        "Unexpected field: more than one '{RESUME_FIELD}' file"
                    )));
                }
                let original_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().map(str::to_string);

                let file = tempfile::Builder::new()
                    .prefix("resume-")
                    .suffix(&transient_suffix(&original_name))
                    .tempfile_in(upload_dir)
                    .map_err(|e| AppError::Upload(format!("cannot create transient file: {e}")))?;
                let handle = file
                    .as_file()
                    .try_clone()
                    .map_err(|e| AppError::Upload(e.to_string()))?;
                let mut out = tokio::fs::File::from_std(handle);

                let mut size = 0u64;
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Upload(e.body_text()))?
                {
                    out.write_all(&chunk)
                        .await
                        .map_err(|e| AppError::Upload(e.to_string()))?;
                    size += chunk.len() as u64;
                }
                out.flush()
                    .await
                    .map_err(|e| AppError::Upload(e.to_string()))?;

                debug!(
                    "Stored upload '{}' ({size} bytes, {:?}) at {}",
                    original_name,
                    content_type,
                    file.path().display()
                );

                resume = Some(TransientResume {
                    file,
                    size,
                    original_name,
                    content_type,
                });
            }
            Some(KEYWORDS_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Upload(e.body_text()))?;
                keywords = Some(text);
            }
            other => {
                debug!("Ignoring multipart field {other:?}");
                // Drain so the stream can advance to the next part.
                while field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Upload(e.body_text()))?
                    .is_some()
                {}
            }
        }
    }

    Ok(ReceivedUpload {
        resume,
        keywords: KeywordSpec::from_field(keywords),
    })
}

/// Keeps a short alphanumeric extension from the client's filename so the
/// scorer sees e.g. `resume-XXXX.pdf`.
fn transient_suffix(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keywords_use_default() {
        assert_eq!(KeywordSpec::from_field(None).as_str(), DEFAULT_KEYWORDS);
    }

    #[test]
    fn test_empty_keywords_use_default() {
        assert_eq!(
            KeywordSpec::from_field(Some(String::new())).as_str(),
            DEFAULT_KEYWORDS
        );
    }

    #[test]
    fn test_keywords_passed_through_unvalidated() {
        let spec = KeywordSpec::from_field(Some(" java,, spring ".to_string()));
        assert_eq!(spec.as_str(), " java,, spring ");
    }

    #[test]
    fn test_suffix_keeps_pdf_extension() {
        assert_eq!(transient_suffix("My Resume.PDF"), ".pdf");
    }

    #[test]
    fn test_suffix_rejects_odd_extensions() {
        assert_eq!(transient_suffix("resume"), "");
        assert_eq!(transient_suffix("resume.p d f"), "");
        assert_eq!(transient_suffix("../../etc/passwd.reallylongext"), "");
    }

    #[test]
    fn test_cleanup_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = tempfile::Builder::new().tempfile_in(dir.path()).unwrap();
        let path = file.path().to_path_buf();
        let resume = TransientResume {
            file,
            size: 0,
            original_name: "resume.pdf".to_string(),
            content_type: None,
        };

        resume.cleanup();
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_tolerates_already_deleted_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = tempfile::Builder::new().tempfile_in(dir.path()).unwrap();
        std::fs::remove_file(file.path()).unwrap();
        let resume = TransientResume {
            file,
            size: 0,
            original_name: "resume.pdf".to_string(),
            content_type: None,
        };

        // Logs a warning, does not panic.
        resume.cleanup();
    }
}
