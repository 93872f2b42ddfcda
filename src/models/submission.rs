//! Applicant submission form and its client-side validation.

use super::document::DocumentKind;
use std::collections::BTreeMap;

/// Email domains an applicant may use.
pub const ALLOWED_EMAIL_DOMAINS: [&str; 2] = ["innopolis.university", "innopolis.ru"];

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Everything the applicant fills in before submitting.
#[derive(Debug, Clone, Default)]
pub struct SubmitForm {
    pub email: String,
    pub full_name: String,
    /// First-year students have no transcript yet.
    pub is_first_year: bool,
    pub files: BTreeMap<DocumentKind, UploadFile>,
}

impl SubmitForm {
    pub fn new(email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, kind: DocumentKind, file: UploadFile) -> Self {
        self.files.insert(kind, file);
        self
    }

    pub fn first_year(mut self, is_first_year: bool) -> Self {
        self.is_first_year = is_first_year;
        self
    }

    /// Kinds that must be attached for this applicant.
    pub fn required_documents(&self) -> Vec<DocumentKind> {
        let mut required = vec![DocumentKind::Cv];
        if !self.is_first_year {
            required.push(DocumentKind::Transcript);
        }
        required.push(DocumentKind::MotivationalLetter);
        required
    }

    /// Files that will actually be uploaded. A first-year applicant's
    /// transcript is never sent.
    pub fn files_to_upload(&self) -> impl Iterator<Item = (DocumentKind, &UploadFile)> {
        let skip_transcript = self.is_first_year;
        self.files
            .iter()
            .filter(move |(kind, _)| !(skip_transcript && **kind == DocumentKind::Transcript))
            .map(|(kind, file)| (*kind, file))
    }

    /// Collect every validation problem; empty means the form may be sent.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !is_valid_email(&self.email) {
            errors.push(
                "Email must be a valid Innopolis email address (@innopolis.university or @innopolis.ru)"
                    .to_string(),
            );
        }

        if self.full_name.trim().is_empty() {
            errors.push("Full name is required".to_string());
        }

        let missing: Vec<String> = self
            .required_documents()
            .into_iter()
            .filter(|kind| !self.files.contains_key(kind))
            .map(|kind| format!("{} file is required", kind.label()))
            .collect();
        if !missing.is_empty() {
            errors.push(format!("Required files missing: {}", missing.join(", ")));
        }

        for (kind, file) in self.files_to_upload() {
            if file.content_type != kind.content_type() {
                errors.push(format!(
                    "File {} should be of type {} but is {}",
                    file.file_name,
                    kind.content_type(),
                    file.content_type
                ));
            }
        }

        errors
    }
}

/// `local@innopolis.university` or `local@innopolis.ru`, local part `[A-Za-z0-9_.+-]+`.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-'));
    local_ok && ALLOWED_EMAIL_DOMAINS.contains(&domain)
}
