//! Authentication commands.
//!
//! Route guards and the two login flows. Rejected logins are reported as a
//! [`LoginOutcome`] rather than an error so the login page can show them
//! inline.

use crate::error::AppError;
use crate::models::Patron;
use crate::services::auth::{GuardOutcome, SessionContext, TelegramUser};
use crate::services::ApiClient;
use serde::Serialize;

/// Where a patron lands after logging in.
pub const PATRON_HOME: &str = "/patron";

/// Where a guard sends a visitor without a session.
pub const AUTH_ROUTE: &str = "/auth";

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoginOutcome {
    LoggedIn { patron: Patron, redirect_to: String },
    Rejected { message: String },
}

/// Check access to a patron page.
///
/// # Returns
/// `RedirectToAuth` when the session is missing or expired. Network and
/// server failures are returned as errors.
pub async fn guard_patron_route(
    api: &ApiClient,
    ctx: &mut SessionContext,
) -> Result<GuardOutcome, AppError> {
    ctx.guard(api).await
}

/// Check access to an admin page.
pub async fn guard_admin_route(
    api: &ApiClient,
    ctx: &mut SessionContext,
) -> Result<GuardOutcome, AppError> {
    ctx.admin_guard(api).await
}

/// Log in with the Telegram widget payload.
///
/// # Arguments
/// * `user` - Data handed over by the Telegram login widget
/// * `invite_secret` - Invite key, required on a patron's first login
pub async fn login_with_telegram(
    api: &ApiClient,
    ctx: &mut SessionContext,
    user: &TelegramUser,
    invite_secret: Option<&str>,
) -> Result<LoginOutcome, AppError> {
    let invite_secret = invite_secret.map(str::trim).filter(|s| !s.is_empty());
    match api
        .telegram_callback(&user.to_query_params(), invite_secret)
        .await
    {
        Ok(_) => {}
        Err(e) if e.is_unauthorized() => {
            log::info!("[auth] Telegram login for {} rejected", user.id);
            return Ok(LoginOutcome::Rejected {
                message: "Telegram login was not accepted".to_string(),
            });
        }
        Err(e) => return Err(e),
    }
    finish_login(api, ctx).await
}

/// Log in with a Telegram ID and password (development backends only).
pub async fn login_with_password(
    api: &ApiClient,
    ctx: &mut SessionContext,
    telegram_id: &str,
    password: &str,
) -> Result<LoginOutcome, AppError> {
    match api.login_by_password(telegram_id, password).await {
        Ok(Some(_)) => finish_login(api, ctx).await,
        Ok(None) => Ok(LoginOutcome::Rejected {
            message: "Invalid credentials".to_string(),
        }),
        Err(e) if e.is_unauthorized() => Ok(LoginOutcome::Rejected {
            message: "Invalid credentials".to_string(),
        }),
        Err(e) => Err(e),
    }
}

/// Confirm the new cookie by asking who we are.
async fn finish_login(api: &ApiClient, ctx: &mut SessionContext) -> Result<LoginOutcome, AppError> {
    match ctx.refresh(api).await? {
        Some(patron) => {
            log::info!("[auth] Logged in as {}", patron.display_name());
            Ok(LoginOutcome::LoggedIn {
                patron: patron.clone(),
                redirect_to: PATRON_HOME.to_string(),
            })
        }
        None => Ok(LoginOutcome::Rejected {
            message: "You are not a patron".to_string(),
        }),
    }
}

/// Forget the cached identity.
pub fn logout(ctx: &mut SessionContext) {
    ctx.clear();
}
