//! Application (applicant submission) model.

use super::document::DocumentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an application on the scholarship API.
pub type ApplicationId = i64;

/// A submitted scholarship application.
///
/// Document fields hold server-side paths relative to `/files/`; `None`
/// means the document was not provided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,

    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,

    /// Session of the applicant who created it.
    #[serde(default)]
    pub session_id: String,

    /// Innopolis email of the applicant.
    pub email: String,

    pub full_name: String,

    pub cv: Option<String>,
    pub motivational_letter: Option<String>,
    pub recommendation_letter: Option<String>,
    pub transcript: Option<String>,
    pub almost_a_student: Option<String>,
}

impl Application {
    /// Stored path for a document kind, if provided.
    pub fn document_path(&self, kind: DocumentKind) -> Option<&str> {
        let path = match kind {
            DocumentKind::Cv => &self.cv,
            DocumentKind::Transcript => &self.transcript,
            DocumentKind::MotivationalLetter => &self.motivational_letter,
            DocumentKind::RecommendationLetter => &self.recommendation_letter,
            DocumentKind::AlmostAStudent => &self.almost_a_student,
        };
        path.as_deref().filter(|p| !p.is_empty())
    }

    /// Kinds with an attached document, in display order.
    pub fn provided_documents(&self) -> Vec<DocumentKind> {
        DocumentKind::ALL
            .into_iter()
            .filter(|kind| self.document_path(*kind).is_some())
            .collect()
    }

    /// Kinds without a document, listed separately from editable rows.
    pub fn missing_documents(&self) -> Vec<DocumentKind> {
        DocumentKind::ALL
            .into_iter()
            .filter(|kind| self.document_path(*kind).is_none())
            .collect()
    }
}
