//! Admin results export: file naming and saving.

use crate::error::AppError;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use std::path::{Path, PathBuf};

/// Name used when the server does not suggest one.
pub const DEFAULT_EXPORT_FILENAME: &str = "ranking.xlsx";

/// A downloaded export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Write the file into `dir` under its suggested name.
    pub fn save_to_dir(&self, dir: &Path) -> Result<PathBuf, AppError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        log::info!("[export] Saved {}", path.display());
        Ok(path)
    }
}

/// Filename from the response headers, or [`DEFAULT_EXPORT_FILENAME`].
pub fn filename_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_content_disposition)
        .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string())
}

/// Extract the filename from a `Content-Disposition` value.
///
/// `filename*=` (RFC 5987) wins over `filename=`. Directory components are
/// stripped so the name is always safe to join onto a directory.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in split_params(value) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let raw = raw.trim().trim_matches('"');
                // charset'language'percent-encoded
                let encoded = raw.splitn(3, '\'').nth(2).unwrap_or(raw);
                extended = urlencoding::decode(encoded).ok().map(|s| s.into_owned());
            }
            "filename" => {
                plain = Some(unquote(raw.trim()));
            }
            _ => {}
        }
    }

    extended.or(plain).and_then(|name| sanitize(&name))
}

/// Split on `;` outside of quoted strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

fn unquote(raw: &str) -> String {
    match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\""),
        None => raw.to_string(),
    }
}

fn sanitize(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        None
    } else {
        Some(base.to_string())
    }
}
