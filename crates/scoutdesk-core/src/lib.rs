//! Core library for scoutdesk, an administration tool for a scout group.
//!
//! Provides the backend client, session and permission handling, the
//! local table cache, data models with form validation, budget and
//! dashboard math, the DNGI form template engine and the PDF, Word and
//! XLSX renderers. The terminal UI lives in `scoutdesk-tui`.

pub mod api;
pub mod auth;
pub mod budget;
pub mod cache;
pub mod config;
pub mod export;
pub mod models;
pub mod stats;
pub mod template;
pub mod utils;
pub mod validation;

pub use api::{friendly_message, ApiClient, ApiError, GeocodeClient};
pub use auth::{Accion, CredentialStore, PermissionError, Permisos, Session, SessionData};
pub use budget::BudgetSummary;
pub use cache::CacheManager;
pub use config::Config;
pub use stats::DashboardStats;
pub use validation::{FormErrors, ValidationError};
