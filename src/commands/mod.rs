//! Command handlers.
//!
//! These are the call sites nearest to user actions. Commands are organized
//! by audience:
//! - `auth`: route guards and login
//! - `applicant`: status page and submission
//! - `patron`: dashboard, rating page and ranking page
//! - `admin`: results, export, statistics and patron management
//!
//! Expected conditions (a 404 for "nothing submitted", a rejected login, an
//! invalid form) come back as typed outcomes; everything else is an `AppError`
//! for the caller to show inline.

pub mod admin;
pub mod applicant;
pub mod auth;
pub mod patron;
