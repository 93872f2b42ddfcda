//! Document kinds and per-document review notes.
//!
//! Every key that belongs to a document kind (API field names, upload field
//! names, seen/comment keys) lives in one static table, so nothing is
//! derived from display strings at runtime.

use serde::{Deserialize, Serialize};

/// Content type the API accepts for PDF documents.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Content type the API accepts for the transcript.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The five documents an applicant can attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Cv,
    Transcript,
    MotivationalLetter,
    RecommendationLetter,
    AlmostAStudent,
}

/// Static description of one document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSpec {
    pub kind: DocumentKind,
    /// Label shown to reviewers.
    pub label: &'static str,
    /// Field holding the stored path on an application.
    pub path_field: &'static str,
    /// Key of the "seen" flag in the rating docs.
    pub seen_key: &'static str,
    /// Key of the comment in the rating docs.
    pub comments_key: &'static str,
    /// Multipart field used when submitting the file.
    pub upload_field: &'static str,
    /// The only content type accepted for uploads.
    pub content_type: &'static str,
}

const DOCUMENT_TABLE: [DocumentSpec; 5] = [
    DocumentSpec {
        kind: DocumentKind::Cv,
        label: "CV",
        path_field: "cv",
        seen_key: "cv_seen",
        comments_key: "cv_comments",
        upload_field: "cv_file",
        content_type: PDF_CONTENT_TYPE,
    },
    DocumentSpec {
        kind: DocumentKind::Transcript,
        label: "Transcript",
        path_field: "transcript",
        seen_key: "transcript_seen",
        comments_key: "transcript_comments",
        upload_field: "transcript_file",
        content_type: XLSX_CONTENT_TYPE,
    },
    DocumentSpec {
        kind: DocumentKind::MotivationalLetter,
        label: "Motivational Letter",
        path_field: "motivational_letter",
        seen_key: "motivational_letter_seen",
        comments_key: "motivational_letter_comments",
        upload_field: "motivational_letter_file",
        content_type: PDF_CONTENT_TYPE,
    },
    DocumentSpec {
        kind: DocumentKind::RecommendationLetter,
        label: "Recommendation Letter",
        path_field: "recommendation_letter",
        seen_key: "recommendation_letter_seen",
        comments_key: "recommendation_letter_comments",
        upload_field: "recommendation_letter_file",
        content_type: PDF_CONTENT_TYPE,
    },
    DocumentSpec {
        kind: DocumentKind::AlmostAStudent,
        label: "Almost A Student",
        path_field: "almost_a_student",
        seen_key: "almost_a_student_seen",
        comments_key: "almost_a_student_comments",
        upload_field: "almost_a_student_file",
        content_type: PDF_CONTENT_TYPE,
    },
];

impl DocumentKind {
    /// All kinds in display order.
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Cv,
        DocumentKind::Transcript,
        DocumentKind::MotivationalLetter,
        DocumentKind::RecommendationLetter,
        DocumentKind::AlmostAStudent,
    ];

    pub fn spec(self) -> &'static DocumentSpec {
        match self {
            Self::Cv => &DOCUMENT_TABLE[0],
            Self::Transcript => &DOCUMENT_TABLE[1],
            Self::MotivationalLetter => &DOCUMENT_TABLE[2],
            Self::RecommendationLetter => &DOCUMENT_TABLE[3],
            Self::AlmostAStudent => &DOCUMENT_TABLE[4],
        }
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn seen_key(self) -> &'static str {
        self.spec().seen_key
    }

    pub fn comments_key(self) -> &'static str {
        self.spec().comments_key
    }

    pub fn upload_field(self) -> &'static str {
        self.spec().upload_field
    }

    pub fn content_type(self) -> &'static str {
        self.spec().content_type
    }

    /// Look a kind up by its display label.
    pub fn from_label(label: &str) -> Option<Self> {
        DOCUMENT_TABLE
            .iter()
            .find(|spec| spec.label == label)
            .map(|spec| spec.kind)
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A reviewer's notes on one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocReview {
    pub seen: bool,
    pub comment: String,
}

/// Per-document seen flags and comments, in the flat wire layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Docs {
    pub cv_comments: String,
    pub cv_seen: bool,

    pub transcript_comments: String,
    pub transcript_seen: bool,

    pub motivational_letter_comments: String,
    pub motivational_letter_seen: bool,

    pub recommendation_letter_comments: String,
    pub recommendation_letter_seen: bool,

    pub almost_a_student_comments: String,
    pub almost_a_student_seen: bool,
}

impl Docs {
    fn fields_mut(&mut self, kind: DocumentKind) -> (&mut bool, &mut String) {
        match kind {
            DocumentKind::Cv => (&mut self.cv_seen, &mut self.cv_comments),
            DocumentKind::Transcript => (&mut self.transcript_seen, &mut self.transcript_comments),
            DocumentKind::MotivationalLetter => (
                &mut self.motivational_letter_seen,
                &mut self.motivational_letter_comments,
            ),
            DocumentKind::RecommendationLetter => (
                &mut self.recommendation_letter_seen,
                &mut self.recommendation_letter_comments,
            ),
            DocumentKind::AlmostAStudent => (
                &mut self.almost_a_student_seen,
                &mut self.almost_a_student_comments,
            ),
        }
    }

    pub fn get(&self, kind: DocumentKind) -> DocReview {
        let (seen, comment) = match kind {
            DocumentKind::Cv => (self.cv_seen, &self.cv_comments),
            DocumentKind::Transcript => (self.transcript_seen, &self.transcript_comments),
            DocumentKind::MotivationalLetter => (
                self.motivational_letter_seen,
                &self.motivational_letter_comments,
            ),
            DocumentKind::RecommendationLetter => (
                self.recommendation_letter_seen,
                &self.recommendation_letter_comments,
            ),
            DocumentKind::AlmostAStudent => {
                (self.almost_a_student_seen, &self.almost_a_student_comments)
            }
        };
        DocReview {
            seen,
            comment: comment.clone(),
        }
    }

    /// Returns true when the flag actually changed.
    pub fn set_seen(&mut self, kind: DocumentKind, seen: bool) -> bool {
        let (flag, _) = self.fields_mut(kind);
        let changed = *flag != seen;
        *flag = seen;
        changed
    }

    /// Returns true when the comment actually changed.
    pub fn set_comment(&mut self, kind: DocumentKind, comment: impl Into<String>) -> bool {
        let comment = comment.into();
        let (_, current) = self.fields_mut(kind);
        let changed = *current != comment;
        *current = comment;
        changed
    }
}
