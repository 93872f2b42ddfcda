//! Document preview state.
//!
//! PDFs are embedded by URL; spreadsheets are fetched, handed to a
//! [`SpreadsheetParser`] and rendered as an HTML table. Switching documents
//! while a spreadsheet is still loading must not let the old result win, so
//! every selection hands out a [`PreviewTicket`] that the result is
//! committed against.

use crate::error::AppError;
use crate::services::api_client::ApiClient;
use serde::Serialize;

/// Inline error shown when a spreadsheet cannot be displayed.
pub const SPREADSHEET_ERROR: &str = "Failed to load or parse spreadsheet";

/// Shown for a spreadsheet with no rows.
pub const SPREADSHEET_EMPTY: &str = "No data in spreadsheet";

/// How a document is previewed, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    Pdf,
    Spreadsheet,
    Unsupported,
}

impl PreviewKind {
    pub fn classify(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "xlsx" | "xls" => Self::Spreadsheet,
            _ => Self::Unsupported,
        }
    }
}

/// Rows of the first worksheet; empty cells are empty strings.
pub type SheetRows = Vec<Vec<String>>;

/// Spreadsheet decoding is pluggable; the client ships no parser.
pub trait SpreadsheetParser: Send + Sync {
    fn first_sheet_rows(&self, bytes: &[u8]) -> Result<SheetRows, AppError>;
}

/// Identifies one selection; results for older tickets are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewTicket(u64);

/// What the preview pane currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PreviewContent {
    Empty,
    Frame { url: String },
    Loading { url: String },
    Table { url: String, html: String },
    Error { url: String, message: String },
    Unsupported { url: String },
}

#[derive(Debug, Clone)]
pub struct PreviewState {
    generation: u64,
    content: PreviewContent,
}

impl Default for PreviewState {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewState {
    pub fn new() -> Self {
        Self {
            generation: 0,
            content: PreviewContent::Empty,
        }
    }

    pub fn content(&self) -> &PreviewContent {
        &self.content
    }

    /// Select a document by its file URL.
    ///
    /// Returns the ticket to commit a spreadsheet result against. PDFs and
    /// unsupported files need no fetch and resolve immediately.
    pub fn select(&mut self, url: impl Into<String>) -> PreviewTicket {
        let url = url.into();
        self.generation += 1;
        self.content = match PreviewKind::classify(&url) {
            PreviewKind::Pdf => PreviewContent::Frame { url },
            PreviewKind::Spreadsheet => PreviewContent::Loading { url },
            PreviewKind::Unsupported => PreviewContent::Unsupported { url },
        };
        PreviewTicket(self.generation)
    }

    /// Whether `ticket` still refers to the current selection.
    pub fn is_current(&self, ticket: PreviewTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Store a spreadsheet result. Returns false if the selection moved on.
    pub fn commit(&mut self, ticket: PreviewTicket, result: Result<SheetRows, AppError>) -> bool {
        if !self.is_current(ticket) {
            log::debug!("[preview] Dropping stale spreadsheet result");
            return false;
        }
        let PreviewContent::Loading { url } = &self.content else {
            return false;
        };
        let url = url.clone();
        self.content = match result {
            Ok(rows) => PreviewContent::Table {
                url,
                html: render_table_html(&rows),
            },
            Err(e) => {
                log::warn!("[preview] {}: {}", url, e);
                PreviewContent::Error {
                    url,
                    message: SPREADSHEET_ERROR.to_string(),
                }
            }
        };
        true
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.content = PreviewContent::Empty;
    }
}

/// Fetch a stored spreadsheet and decode its first sheet.
pub async fn load_spreadsheet(
    api: &ApiClient,
    path: &str,
    parser: &dyn SpreadsheetParser,
) -> Result<SheetRows, AppError> {
    let bytes = api.fetch_file(path).await?;
    parser.first_sheet_rows(&bytes)
}

pub fn render_table_html(rows: &[Vec<String>]) -> String {
    if rows.iter().all(|row| row.is_empty()) {
        return format!("<div class=\"preview-empty\">{}</div>", SPREADSHEET_EMPTY);
    }

    let mut html = String::from("<table class=\"preview-table\"><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&escape_html(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
