//! Patron commands: dashboard, rating page and ranking page.

use crate::config::ClientConfig;
use crate::error::AppError;
use crate::models::{Application, ApplicationId, DocumentKind, Rating, Sentiment};
use crate::services::document_preview::PreviewKind;
use crate::services::rating_autosave::{RateRequest, RatingDraft};
use crate::services::{ApiClient, RankingSession};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// One row of the patron dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StudentListItem {
    pub application: Application,
    /// `None` when the patron never opened the rating page.
    pub sentiment: Option<Sentiment>,
    pub documents_seen: usize,
    pub documents_provided: usize,
}

/// One editable document row on the rating page.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRow {
    pub kind: DocumentKind,
    pub label: &'static str,
    pub path: String,
    pub url: String,
    pub preview: PreviewKind,
    pub seen: bool,
    pub comment: String,
}

/// Everything the rating page needs.
#[derive(Debug, Clone, Serialize)]
pub struct RatingPage {
    pub application: Application,
    pub rating: Rating,
    pub documents: Vec<DocumentRow>,
    /// Labels of documents the applicant did not provide.
    pub not_provided: Vec<&'static str>,
}

/// Load the dashboard: every application with the patron's verdict.
pub async fn dashboard(api: &ApiClient) -> Result<Vec<StudentListItem>, AppError> {
    let (applications, ratings) =
        futures::try_join!(api.list_applications(), api.rated_applications())?;
    let ratings: HashMap<ApplicationId, Rating> =
        ratings.into_iter().map(|r| (r.application_id, r)).collect();

    Ok(applications
        .into_iter()
        .map(|application| {
            let rating = ratings.get(&application.id);
            let provided = application.provided_documents();
            let documents_seen = rating
                .map(|r| provided.iter().filter(|k| r.docs.get(**k).seen).count())
                .unwrap_or(0);
            StudentListItem {
                sentiment: rating.map(|r| r.rate),
                documents_seen,
                documents_provided: provided.len(),
                application,
            }
        })
        .collect())
}

/// Load one application with the patron's rating of it.
///
/// An application the patron has not rated yet gets a fresh unrated rating;
/// its `patron_id` is assigned by the server on first save.
pub async fn open_rating_page(api: &ApiClient, id: ApplicationId) -> Result<RatingPage, AppError> {
    let (application, ratings) =
        futures::try_join!(api.get_application(id), api.rated_applications())?;
    let rating = ratings
        .into_iter()
        .find(|r| r.application_id == id)
        .unwrap_or_else(|| Rating::unrated(0, id));

    let documents = DocumentKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let path = application.document_path(kind)?;
            let review = rating.docs.get(kind);
            Some(DocumentRow {
                kind,
                label: kind.label(),
                path: path.to_string(),
                url: api.file_url(path),
                preview: PreviewKind::classify(path),
                seen: review.seen,
                comment: review.comment,
            })
        })
        .collect();
    let not_provided = application
        .missing_documents()
        .into_iter()
        .map(DocumentKind::label)
        .collect();

    Ok(RatingPage {
        application,
        rating,
        documents,
        not_provided,
    })
}

/// Start an auto-saving draft for the rating page.
pub fn rating_draft(page: &RatingPage, config: &ClientConfig) -> RatingDraft {
    RatingDraft::new(page.rating.clone(), config.rating_autosave_delay())
}

/// Send one rating save produced by a [`RatingDraft`].
pub async fn save_rating(api: &ApiClient, request: &RateRequest) -> Result<Rating, AppError> {
    api.rate_application(
        request.application_id,
        request.rate,
        &request.comment,
        &request.docs,
    )
    .await
}

/// Open the ranking page. Close the returned session when leaving the page.
pub async fn open_ranking(api: Arc<ApiClient>) -> Result<RankingSession<ApiClient>, AppError> {
    let config = api.config().clone();
    RankingSession::open(api, &config).await
}
