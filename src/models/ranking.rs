//! Ranking payloads.

use super::application::{Application, ApplicationId};
use serde::{Deserialize, Serialize};

/// Number of leading ranking positions that receive a scholarship.
pub const SCHOLARSHIP_SLOTS: usize = 2;

/// A patron's ranking as returned by `GET/PUT /patron/ranking`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub patron_id: i64,

    /// Applications in ranked order.
    #[serde(default)]
    pub applications: Vec<Application>,
}

impl Ranking {
    pub fn application_ids(&self) -> Vec<ApplicationId> {
        self.applications.iter().map(|a| a.id).collect()
    }
}

/// Body of `PUT /patron/ranking`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingUpdate {
    pub application_ids: Vec<ApplicationId>,
}

/// Whether a zero-based ranking position wins a scholarship.
pub fn is_scholarship_position(index: usize) -> bool {
    index < SCHOLARSHIP_SLOTS
}
