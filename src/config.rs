//! Client configuration.
//!
//! Settings come from three layers: built-in defaults, an optional JSON
//! settings file, and environment variables (a `.env` file is honoured).

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Default ranking auto-save debounce in milliseconds.
pub const DEFAULT_RANKING_AUTOSAVE_MS: u64 = 2000;

/// Default rating field auto-save debounce in milliseconds.
pub const DEFAULT_RATING_AUTOSAVE_MS: u64 = 1000;

/// How long the "removed from ranking" notice stays visible.
pub const DEFAULT_NOTICE_SECS: u64 = 5;

/// Settings filename inside an application data directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Configuration shared by the API client and the auto-save machinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the scholarship API (e.g., `https://api.example.org`).
    pub api_base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Debounce before an edited ranking is saved.
    pub ranking_autosave_ms: u64,

    /// Debounce before an edited rating comment or seen flag is saved.
    pub rating_autosave_ms: u64,

    /// Lifetime of transient notices.
    pub notice_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            timeout_secs: 30,
            ranking_autosave_ms: DEFAULT_RANKING_AUTOSAVE_MS,
            rating_autosave_ms: DEFAULT_RATING_AUTOSAVE_MS,
            notice_secs: DEFAULT_NOTICE_SECS,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `api_base_url` with every other field defaulted.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    /// Load defaults overridden by the environment.
    ///
    /// Recognised variables: `SCHOLARSHIP_API_URL`, `SCHOLARSHIP_TIMEOUT_SECS`,
    /// `SCHOLARSHIP_RANKING_AUTOSAVE_MS`, `SCHOLARSHIP_RATING_AUTOSAVE_MS`,
    /// `SCHOLARSHIP_NOTICE_SECS`.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON settings file, then apply environment overrides.
    ///
    /// A missing file yields the defaults; missing fields fall back individually.
    pub fn load(settings_path: &Path) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let mut config = if settings_path.exists() {
            let raw = std::fs::read_to_string(settings_path)?;
            serde_json::from_str::<Self>(&raw)
                .map_err(|e| AppError::config(format!("Invalid settings file: {}", e)))?
        } else {
            Self::default()
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Persist the settings as pretty JSON, creating parent directories.
    pub fn save(&self, settings_path: &Path) -> Result<(), AppError> {
        if let Some(parent) = settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(settings_path, json)?;
        Ok(())
    }

    /// Reject configurations the client cannot work with.
    pub fn validate(&self) -> Result<(), AppError> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(AppError::config("api_base_url is not set"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::config(format!(
                "api_base_url must start with http:// or https://, got {}",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::config("timeout_secs must be greater than zero"));
        }
        if self.ranking_autosave_ms == 0 || self.rating_autosave_ms == 0 {
            return Err(AppError::config("auto-save delays must be greater than zero"));
        }
        Ok(())
    }

    pub fn ranking_autosave_delay(&self) -> Duration {
        Duration::from_millis(self.ranking_autosave_ms)
    }

    pub fn rating_autosave_delay(&self) -> Duration {
        Duration::from_millis(self.rating_autosave_ms)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.notice_secs)
    }

    fn apply_env(&mut self) -> Result<(), AppError> {
        if let Ok(url) = env::var("SCHOLARSHIP_API_URL") {
            self.api_base_url = url;
        }
        if let Some(v) = env_u64("SCHOLARSHIP_TIMEOUT_SECS")? {
            self.timeout_secs = v;
        }
        if let Some(v) = env_u64("SCHOLARSHIP_RANKING_AUTOSAVE_MS")? {
            self.ranking_autosave_ms = v;
        }
        if let Some(v) = env_u64("SCHOLARSHIP_RATING_AUTOSAVE_MS")? {
            self.rating_autosave_ms = v;
        }
        if let Some(v) = env_u64("SCHOLARSHIP_NOTICE_SECS")? {
            self.notice_secs = v;
        }
        Ok(())
    }
}

fn env_u64(name: &str) -> Result<Option<u64>, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| AppError::config(format!("{} must be a non-negative integer", name))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};
    use tempfile::tempdir;

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn clear_env() {
        for name in [
            "SCHOLARSHIP_API_URL",
            "SCHOLARSHIP_TIMEOUT_SECS",
            "SCHOLARSHIP_RANKING_AUTOSAVE_MS",
            "SCHOLARSHIP_RATING_AUTOSAVE_MS",
            "SCHOLARSHIP_NOTICE_SECS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.ranking_autosave_delay(), Duration::from_secs(2));
        assert_eq!(config.rating_autosave_delay(), Duration::from_secs(1));
        assert_eq!(config.notice_duration(), Duration::from_secs(5));
        assert!(config.validate().is_err(), "empty base url must be rejected");
    }

    #[test]
    fn test_validate_rejects_bad_url_and_zero_delay() {
        let config = ClientConfig::with_base_url("ftp://example.org");
        assert!(config.validate().is_err());

        let mut config = ClientConfig::with_base_url("https://example.org");
        assert!(config.validate().is_ok());
        config.ranking_autosave_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_settings_file() {
        let _guard = env_guard().lock().unwrap();
        clear_env();

        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let mut config = ClientConfig::with_base_url("https://api.example.org");
        config.ranking_autosave_ms = 750;
        config.save(&path).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_settings_file_uses_defaults() {
        let _guard = env_guard().lock().unwrap();
        clear_env();

        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"api_base_url":"http://localhost:8000"}"#).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded.api_base_url, "http://localhost:8000");
        assert_eq!(loaded.timeout_secs, 30);
        assert_eq!(loaded.rating_autosave_ms, DEFAULT_RATING_AUTOSAVE_MS);
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = env_guard().lock().unwrap();
        clear_env();

        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"api_base_url":"http://localhost:8000"}"#).unwrap();

        env::set_var("SCHOLARSHIP_API_URL", "https://scholarship.example.org");
        env::set_var("SCHOLARSHIP_NOTICE_SECS", "9");
        let loaded = ClientConfig::load(&path);
        clear_env();

        let loaded = loaded.unwrap();
        assert_eq!(loaded.api_base_url, "https://scholarship.example.org");
        assert_eq!(loaded.notice_secs, 9);
    }

    #[test]
    fn test_invalid_env_number() {
        let _guard = env_guard().lock().unwrap();
        clear_env();

        env::set_var("SCHOLARSHIP_API_URL", "https://scholarship.example.org");
        env::set_var("SCHOLARSHIP_TIMEOUT_SECS", "soon");
        let result = ClientConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(AppError::Config { .. })));
    }
}
