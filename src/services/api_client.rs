//! Scholarship API client.
//!
//! Provides typed wrappers for the patron, admin, applicant and auth
//! endpoints. The session is a cookie set by the auth callback, so one
//! client instance must be reused for the whole session.

use crate::config::ClientConfig;
use crate::error::AppError;
use crate::models::{
    AddPatronRequest, Application, ApplicationId, ApplicationRankingStats, Docs, OverallStats,
    Patron, PatronOverview, PatronStats, Ranking, RankingUpdate, Rating, Sentiment, SubmitForm,
};
use crate::services::export::{self, ExportFile};
use reqwest::{header, multipart, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Scholarship API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a new client with its own cookie jar.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        config.validate()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    /// Public URL of a stored document, suitable for embedding.
    pub fn file_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        self.api_url(&format!("/files/{}", encoded.join("/")))
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        log::debug!("[api] {} {}", method, endpoint);
        self.client.request(method, self.api_url(endpoint))
    }

    /// Convert a non-2xx response into a typed error.
    async fn error_from_response(response: Response, endpoint: &str) -> AppError {
        let status = response.status();
        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let body_message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                // The API answers with {"detail": "..."}; proxies sometimes use "message"
                v.get("detail")
                    .or_else(|| v.get("message"))
                    .map(|m| match m.as_str() {
                        Some(s) => s.to_string(),
                        None => m.to_string(),
                    })
            });

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                log::warn!("[api] {} rejected the session ({})", endpoint, status_code);
                AppError::unauthorized(
                    status_code,
                    body_message.unwrap_or_else(|| "Not authorized".to_string()),
                )
            }
            StatusCode::NOT_FOUND => AppError::NotFound {
                resource: endpoint.to_string(),
                id: body_message,
            },
            _ => {
                let message = body_message
                    .unwrap_or_else(|| format!("Request failed ({}): {}", status_code, body));
                log::error!("[api] {} failed: {}", endpoint, message);
                AppError::api_full(message, status_code, endpoint)
            }
        }
    }

    /// Handle API response errors and decode the JSON body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        if response.status().is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| AppError::parse(format!("Failed to parse response: {}", e)))
        } else {
            Err(Self::error_from_response(response, endpoint).await)
        }
    }

    /// Send a request where only success matters.
    async fn expect_success(&self, response: Response, endpoint: &str) -> Result<(), AppError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response, endpoint).await)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AppError> {
        let response = self.request(Method::GET, endpoint).send().await?;
        self.handle_response(response, endpoint).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let response = self.request(method, endpoint).json(body).send().await?;
        self.handle_response(response, endpoint).await
    }

    // ---- patron ----

    /// Current identity. 401/403 mean the caller must log in again.
    pub async fn whoami(&self) -> Result<Patron, AppError> {
        self.get_json("/patron/me").await
    }

    pub async fn list_applications(&self) -> Result<Vec<Application>, AppError> {
        self.get_json("/patron/applications").await
    }

    pub async fn get_application(&self, id: ApplicationId) -> Result<Application, AppError> {
        self.get_json(&format!("/patron/applications/{}", id))
            .await
            .map_err(|e| match e {
                AppError::NotFound { .. } => {
                    AppError::not_found_with_id("Application", id.to_string())
                }
                other => other,
            })
    }

    /// Ratings the current patron has given.
    pub async fn rated_applications(&self) -> Result<Vec<Rating>, AppError> {
        self.get_json("/patron/me/rated-applications").await
    }

    /// Create or replace the current patron's rating of an application.
    pub async fn rate_application(
        &self,
        id: ApplicationId,
        rate: Sentiment,
        comment: &str,
        docs: &Docs,
    ) -> Result<Rating, AppError> {
        let endpoint = format!("/patron/rate-application/{}", id);
        let response = self
            .request(Method::POST, &endpoint)
            .query(&[("comment", comment), ("rate", rate.as_str())])
            .json(docs)
            .send()
            .await?;
        self.handle_response(response, &endpoint).await
    }

    pub async fn get_ranking(&self) -> Result<Ranking, AppError> {
        self.get_json("/patron/ranking").await
    }

    /// Replace the current patron's ranking; the API answers with the stored list.
    pub async fn update_ranking(
        &self,
        application_ids: Vec<ApplicationId>,
    ) -> Result<Ranking, AppError> {
        let body = RankingUpdate { application_ids };
        self.send_json(Method::PUT, "/patron/ranking", &body).await
    }

    // ---- admin ----

    pub async fn admin_ranking_stats(&self) -> Result<Vec<ApplicationRankingStats>, AppError> {
        self.get_json("/admin/applications/ranking").await
    }

    /// Download the results spreadsheet.
    pub async fn export_applications(&self) -> Result<ExportFile, AppError> {
        let endpoint = "/admin/applications/export";
        let response = self.request(Method::GET, endpoint).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response, endpoint).await);
        }

        let filename = export::filename_from_headers(response.headers());
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        log::info!("[api] Exported {} ({} bytes)", filename, bytes.len());

        Ok(ExportFile {
            filename,
            content_type,
            bytes,
        })
    }

    pub async fn list_patrons(&self) -> Result<Vec<PatronOverview>, AppError> {
        self.get_json("/admin/patrons").await
    }

    pub async fn add_patron(&self, request: &AddPatronRequest) -> Result<Patron, AppError> {
        self.send_json(Method::POST, "/admin/add-patron", request)
            .await
    }

    pub async fn delete_patron(&self, telegram_id: &str) -> Result<(), AppError> {
        let endpoint = format!("/admin/delete-patron/{}", urlencoding::encode(telegram_id));
        let response = self.request(Method::DELETE, &endpoint).send().await?;
        self.expect_success(response, &endpoint).await
    }

    /// Grant or revoke admin rights (superadmin only).
    pub async fn promote_patron(
        &self,
        telegram_id: &str,
        is_admin: bool,
    ) -> Result<Patron, AppError> {
        let endpoint = "/admin/promote";
        let is_admin = if is_admin { "true" } else { "false" };
        let response = self
            .request(Method::PUT, endpoint)
            .query(&[("patron_telegram_id", telegram_id), ("is_admin", is_admin)])
            .send()
            .await?;
        self.handle_response(response, endpoint).await
    }

    pub async fn overall_stats(&self) -> Result<OverallStats, AppError> {
        self.get_json("/admin/stats").await
    }

    pub async fn patron_stats(&self, telegram_id: &str) -> Result<PatronStats, AppError> {
        self.get_json(&format!(
            "/admin/patron-stats/{}",
            urlencoding::encode(telegram_id)
        ))
        .await
    }

    pub async fn delete_application(&self, id: ApplicationId) -> Result<(), AppError> {
        let endpoint = format!("/admin/applications/delete/{}", id);
        let response = self.request(Method::DELETE, &endpoint).send().await?;
        self.expect_success(response, &endpoint).await
    }

    // ---- applicant ----

    /// Submit (or resubmit) an application.
    ///
    /// The form is validated first; nothing is sent when it is invalid.
    pub async fn submit_application(&self, form: &SubmitForm) -> Result<Application, AppError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let mut multipart_form = multipart::Form::new()
            .text("email", form.email.trim().to_string())
            .text("full_name", form.full_name.trim().to_string());
        for (kind, file) in form.files_to_upload() {
            let part = multipart::Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .map_err(|e| {
                    AppError::validation(vec![format!(
                        "Invalid content type for {}: {}",
                        file.file_name, e
                    )])
                })?;
            multipart_form = multipart_form.part(kind.upload_field(), part);
        }

        let endpoint = "/applicant/submit";
        let response = self
            .request(Method::POST, endpoint)
            .multipart(multipart_form)
            .send()
            .await?;
        self.handle_response(response, endpoint).await
    }

    /// The applicant's own application; `None` when nothing was submitted yet.
    pub async fn my_application(&self) -> Result<Option<Application>, AppError> {
        match self.get_json("/applicant/my-application").await {
            Ok(app) => Ok(Some(app)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ---- auth ----

    /// Forward the Telegram login widget payload; sets the session cookie.
    ///
    /// `invite_secret` is only needed the first time a patron logs in.
    pub async fn telegram_callback(
        &self,
        widget_params: &[(String, String)],
        invite_secret: Option<&str>,
    ) -> Result<Patron, AppError> {
        let endpoint = "/auth/telegram-callback";
        let mut request = self.request(Method::POST, endpoint).query(widget_params);
        if let Some(secret) = invite_secret {
            request = request.query(&[("invite_secret", secret)]);
        }
        let response = request.send().await?;
        let patron: Option<Patron> = self.handle_response(response, endpoint).await?;
        patron.ok_or_else(|| AppError::unauthorized(403, "Telegram login was not accepted"))
    }

    /// Development login; `None` when the credentials are wrong.
    pub async fn login_by_password(
        &self,
        telegram_id: &str,
        password: &str,
    ) -> Result<Option<Patron>, AppError> {
        let endpoint = "/auth/login-by-password";
        let response = self
            .request(Method::POST, endpoint)
            .query(&[("telegram_id", telegram_id), ("password", password)])
            .send()
            .await?;
        self.handle_response(response, endpoint).await
    }

    // ---- files ----

    /// Raw bytes of a stored document.
    pub async fn fetch_file(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let url = self.file_url(path);
        log::debug!("[api] GET {}", url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "/files").await);
        }
        Ok(response.bytes().await?.to_vec())
    }
}
