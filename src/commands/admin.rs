//! Admin commands: results, export, statistics and patron management.

use crate::error::AppError;
use crate::models::stats::sort_by_rrf;
use crate::models::{
    AddPatronRequest, ApplicationId, ApplicationRankingStats, OverallStats, Patron,
    PatronOverview, PatronStats,
};
use crate::services::ApiClient;
use std::path::{Path, PathBuf};

/// Aggregated ranking, best RRF score first.
pub async fn ranking_results(api: &ApiClient) -> Result<Vec<ApplicationRankingStats>, AppError> {
    let mut rows = api.admin_ranking_stats().await?;
    sort_by_rrf(&mut rows);
    Ok(rows)
}

/// Download the results spreadsheet into `dir`.
///
/// # Returns
/// Path of the written file, named after the server's suggestion.
pub async fn export_results(api: &ApiClient, dir: &Path) -> Result<PathBuf, AppError> {
    let file = api.export_applications().await?;
    file.save_to_dir(dir)
}

pub async fn overall_stats(api: &ApiClient) -> Result<OverallStats, AppError> {
    api.overall_stats().await
}

pub async fn patron_stats(api: &ApiClient, telegram_id: &str) -> Result<PatronStats, AppError> {
    api.patron_stats(telegram_id).await
}

pub async fn patrons(api: &ApiClient) -> Result<Vec<PatronOverview>, AppError> {
    api.list_patrons().await
}

/// Invite a patron by Telegram ID.
pub async fn add_patron(
    api: &ApiClient,
    telegram_id: &str,
    is_admin: bool,
) -> Result<Patron, AppError> {
    let telegram_id = telegram_id.trim();
    if telegram_id.is_empty() {
        return Err(AppError::validation(vec![
            "Telegram ID is required".to_string(),
        ]));
    }
    let request = AddPatronRequest {
        telegram_id: telegram_id.to_string(),
        telegram_data: serde_json::Value::Null,
        is_admin,
    };
    let patron = api.add_patron(&request).await?;
    log::info!("[admin] Added patron {}", patron.telegram_id);
    Ok(patron)
}

pub async fn remove_patron(api: &ApiClient, telegram_id: &str) -> Result<(), AppError> {
    api.delete_patron(telegram_id).await?;
    log::info!("[admin] Removed patron {}", telegram_id);
    Ok(())
}

pub async fn set_admin(
    api: &ApiClient,
    telegram_id: &str,
    is_admin: bool,
) -> Result<Patron, AppError> {
    api.promote_patron(telegram_id, is_admin).await
}

pub async fn delete_application(api: &ApiClient, id: ApplicationId) -> Result<(), AppError> {
    api.delete_application(id).await?;
    log::info!("[admin] Deleted application {}", id);
    Ok(())
}
