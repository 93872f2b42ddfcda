//! Scholarship client - reviewer, applicant and admin client for the
//! scholarship application program.
//!
//! The crate talks to the scholarship REST API and owns the client-side
//! state the UI needs: the ranking reconciler with debounced auto-save,
//! rating drafts, document previews and session guards. UI shells call the
//! functions in [`commands`] and render the returned values.

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::ClientConfig;
pub use error::AppError;
pub use services::ApiClient;
