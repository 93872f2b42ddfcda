//! Data models for the application.
//!
//! These models mirror the JSON payloads of the scholarship API and are
//! handed to UI shells as-is, so all of them derive Serialize.

pub mod application;
pub mod document;
pub mod patron;
pub mod ranking;
pub mod rating;
pub mod stats;
pub mod submission;

// Re-exports for convenient access
pub use application::{Application, ApplicationId};
pub use document::{DocReview, DocumentKind, DocumentSpec, Docs};
pub use patron::{AddPatronRequest, Patron, PatronOverview};
pub use ranking::{Ranking, RankingUpdate};
pub use rating::{Rating, Sentiment};
pub use stats::{ApplicationRankingStats, OverallStats, PatronStats};
pub use submission::{SubmitForm, UploadFile};
