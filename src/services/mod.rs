//! Business logic services.
//!
//! This module contains the API client and the client-side state machines
//! that sit between user actions and the scholarship backend.
//!
//! Services are designed to be testable and independent of any UI shell.

pub mod api_client;
pub mod auth;
pub mod debounce;
pub mod document_preview;
pub mod export;
pub mod ranking_reconciler;
pub mod ranking_session;
pub mod rating_autosave;

pub use api_client::ApiClient;
pub use auth::{GuardOutcome, SessionContext};
pub use debounce::{Clock, Debouncer, TokioClock};
pub use ranking_reconciler::{RankingList, RankingReconciler, RankingStatus, RankingView};
pub use ranking_session::{RankingApi, RankingSession};
pub use rating_autosave::{RateRequest, RatingDraft};
