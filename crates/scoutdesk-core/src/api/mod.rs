//! Client module for the hosted backend.
//!
//! `ApiClient` speaks the backend's table, auth and storage endpoints;
//! `operations` adds the multi-step calls (cascading deletes, status
//! toggles, purchases with receipts). `GeocodeClient` resolves activity
//! coordinates into place labels.
//!
//! Requests authenticate with the project API key plus the bearer token
//! obtained from the backend's password sign-in.

pub mod client;
pub mod error;
pub mod geocode;
pub mod operations;

pub use client::ApiClient;
pub use error::{friendly_message, ApiError};
pub use geocode::GeocodeClient;
pub use operations::{PurchaseOutcome, Receipt};
