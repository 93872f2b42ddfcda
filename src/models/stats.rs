//! Admin statistics payloads. All scores are computed by the API.

use super::application::Application;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of `GET /admin/applications/ranking`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRankingStats {
    pub application: Application,
    /// Reciprocal Rank Fusion score across all patron rankings.
    pub rrf_score: f64,
    pub positive_votes: i64,
    pub negative_votes: i64,
    pub neutral_votes: i64,
    pub total_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPatronStats {
    pub date: NaiveDate,
    pub rating_count: i64,
    pub ranking_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyApplicationStats {
    pub date: NaiveDate,
    pub applications_received: i64,
}

/// `GET /admin/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_patrons: i64,
    pub total_applications: i64,
    #[serde(default)]
    pub patron_activity_by_day: Vec<DailyPatronStats>,
    #[serde(default)]
    pub applications_by_day: Vec<DailyApplicationStats>,
}

/// `GET /admin/patron-stats/{telegram_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatronStats {
    pub patron_id: i64,
    pub total_ratings: i64,
    #[serde(default)]
    pub activity_by_day: Vec<DailyPatronStats>,
}

/// Sort stats rows by descending RRF score, keeping API order for ties.
pub fn sort_by_rrf(rows: &mut [ApplicationRankingStats]) {
    rows.sort_by(|a, b| b.rrf_score.total_cmp(&a.rrf_score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::fixtures::application;

    fn row(id: i64, score: f64) -> ApplicationRankingStats {
        ApplicationRankingStats {
            application: application(id, "x"),
            rrf_score: score,
            positive_votes: 0,
            negative_votes: 0,
            neutral_votes: 0,
            total_votes: 0,
        }
    }

    #[test]
    fn test_sort_by_rrf() {
        let mut rows = vec![row(1, 0.01), row(2, 0.03), row(3, 0.01), row(4, 0.02)];
        sort_by_rrf(&mut rows);
        let ids: Vec<i64> = rows.iter().map(|r| r.application.id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_overall_stats_payload() {
        let stats: OverallStats = serde_json::from_str(
            r#"{"total_patrons":3,"total_applications":10,
                "patron_activity_by_day":[{"date":"2025-03-01","rating_count":4,"ranking_count":1}],
                "applications_by_day":[{"date":"2025-03-01","applications_received":2}]}"#,
        )
        .unwrap();
        assert_eq!(stats.patron_activity_by_day[0].rating_count, 4);
        assert_eq!(stats.applications_by_day[0].applications_received, 2);
    }
}
