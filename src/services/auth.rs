//! Session context and route guards.
//!
//! The backend owns authentication; the client only learns who it is by
//! asking `/patron/me`. [`SessionContext`] caches that answer so guards can
//! decide without a global, and forgets it as soon as any call is rejected
//! with 401/403.

use crate::error::AppError;
use crate::models::Patron;
use crate::services::api_client::ApiClient;
use serde::{Deserialize, Serialize};

/// Result of a pre-route check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "patron", rename_all = "snake_case")]
pub enum GuardOutcome {
    Allowed(Patron),
    /// No valid session; show the login page.
    RedirectToAuth,
    /// Logged in, but the route needs admin rights.
    Forbidden,
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }
}

/// What the client currently knows about the logged-in patron.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    patron: Option<Patron>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patron(&self) -> Option<&Patron> {
        self.patron.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.patron.is_some()
    }

    /// Ask the backend who we are.
    ///
    /// 401/403 clear the context and are not treated as failures; any other
    /// error is returned unchanged.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<Option<&Patron>, AppError> {
        match api.whoami().await {
            Ok(patron) => {
                log::debug!("[auth] Session belongs to {}", patron.telegram_id);
                self.patron = Some(patron);
            }
            Err(e) if e.is_unauthorized() => {
                log::info!("[auth] No valid session");
                self.patron = None;
            }
            Err(e) => return Err(e),
        }
        Ok(self.patron.as_ref())
    }

    /// Drop the cached identity if `error` says the session is gone.
    pub fn observe_error(&mut self, error: &AppError) {
        if error.is_unauthorized() {
            self.patron = None;
        }
    }

    pub fn clear(&mut self) {
        self.patron = None;
    }

    pub fn require_patron(&self) -> GuardOutcome {
        match &self.patron {
            Some(patron) => GuardOutcome::Allowed(patron.clone()),
            None => GuardOutcome::RedirectToAuth,
        }
    }

    pub fn require_admin(&self) -> GuardOutcome {
        match &self.patron {
            Some(patron) if patron.is_admin => GuardOutcome::Allowed(patron.clone()),
            Some(_) => GuardOutcome::Forbidden,
            None => GuardOutcome::RedirectToAuth,
        }
    }

    /// Refresh, then check patron access.
    pub async fn guard(&mut self, api: &ApiClient) -> Result<GuardOutcome, AppError> {
        self.refresh(api).await?;
        Ok(self.require_patron())
    }

    /// Refresh, then check admin access.
    pub async fn admin_guard(&mut self, api: &ApiClient) -> Result<GuardOutcome, AppError> {
        self.refresh(api).await?;
        Ok(self.require_admin())
    }
}

/// Payload produced by the Telegram login widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub auth_date: i64,
    pub hash: String,
}

impl TelegramUser {
    /// Query parameters in the shape the callback endpoint verifies.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("id".to_string(), self.id.to_string()),
            ("first_name".to_string(), self.first_name.clone()),
        ];
        let optional = [
            ("last_name", &self.last_name),
            ("username", &self.username),
            ("photo_url", &self.photo_url),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.push((key.to_string(), value.clone()));
            }
        }
        params.push(("auth_date".to_string(), self.auth_date.to_string()));
        params.push(("hash".to_string(), self.hash.clone()));
        params
    }
}
