//! Applicant commands: status page and document submission.

use crate::error::AppError;
use crate::models::document::{PDF_CONTENT_TYPE, XLSX_CONTENT_TYPE};
use crate::models::{Application, DocumentKind, SubmitForm, UploadFile};
use crate::services::ApiClient;
use serde::Serialize;
use std::path::Path;

/// What the applicant's status page shows.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplicationStatus {
    NotSubmitted,
    Submitted {
        application: Application,
        provided: Vec<DocumentKind>,
        missing: Vec<DocumentKind>,
    },
}

/// Result of a submit attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Submitted { application: Application },
    /// Rejected before anything was sent.
    Invalid { errors: Vec<String> },
}

/// Load the applicant's status. A 404 means nothing was submitted yet.
pub async fn application_status(api: &ApiClient) -> Result<ApplicationStatus, AppError> {
    Ok(match api.my_application().await? {
        Some(application) => ApplicationStatus::Submitted {
            provided: application.provided_documents(),
            missing: application.missing_documents(),
            application,
        },
        None => ApplicationStatus::NotSubmitted,
    })
}

/// Validate and submit the form.
///
/// Validation problems come back as [`SubmitOutcome::Invalid`], all at once.
pub async fn submit(api: &ApiClient, form: &SubmitForm) -> Result<SubmitOutcome, AppError> {
    match api.submit_application(form).await {
        Ok(application) => {
            log::info!("[applicant] Submitted application {}", application.id);
            Ok(SubmitOutcome::Submitted { application })
        }
        Err(AppError::Validation { errors }) => Ok(SubmitOutcome::Invalid { errors }),
        Err(e) => Err(e),
    }
}

/// Read a file from disk for upload, guessing its content type from the extension.
pub fn read_upload(path: &Path) -> Result<UploadFile, AppError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let content_type = match ext.as_str() {
        "pdf" => PDF_CONTENT_TYPE,
        "xlsx" => XLSX_CONTENT_TYPE,
        _ => "application/octet-stream",
    };
    Ok(UploadFile::new(file_name, content_type, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_upload_guesses_content_type() {
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("CV.PDF");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();
        let upload = read_upload(&pdf).unwrap();
        assert_eq!(upload.file_name, "CV.PDF");
        assert_eq!(upload.content_type, PDF_CONTENT_TYPE);
        assert_eq!(upload.bytes, b"%PDF-1.7");

        let sheet = dir.path().join("grades.xlsx");
        std::fs::write(&sheet, b"PK").unwrap();
        assert_eq!(read_upload(&sheet).unwrap().content_type, XLSX_CONTENT_TYPE);
    }

    #[test]
    fn test_read_upload_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_upload(&dir.path().join("nope.pdf")).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }
}
