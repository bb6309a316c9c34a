//! Authentication module for managing user sessions, credentials and
//! permission flags.
//!
//! This module provides:
//! - `Session`: Token-based session management with expiry
//! - `CredentialStore`: Secure OS-level credential storage via keyring
//! - `Permisos`: per-user flags checked before create/edit/delete/export
//!
//! Sessions are persisted to disk and expire when the backend token does.

pub mod credentials;
pub mod permissions;
pub mod session;

pub use credentials::CredentialStore;
pub use permissions::{Accion, PermissionError, Permisos, PROFILES_TABLE};
pub use session::{Session, SessionData};
