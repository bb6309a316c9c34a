use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Token lifetime used when the backend does not report one (1 hour).
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Buffer time before expiry to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    /// Backend user id (a UUID string).
    pub user_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN_SECS
}

impl SessionData {
    fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::seconds(self.expires_in)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at()
    }

    /// Check if the session will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        Utc::now() > self.expires_at() - Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES)
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at() - Utc::now()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }
}

pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load session from disk. Expired sessions are ignored.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            let data: SessionData = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;

            if !data.is_expired() {
                debug!(email = %data.email, minutes_left = data.minutes_until_expiry(), "Loaded session");
                self.data = Some(data);
                return Ok(true);
            }
            debug!("Stored session expired");
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if session is valid
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.user_id.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(created_at: DateTime<Utc>) -> SessionData {
        SessionData {
            token: "tok".to_string(),
            user_id: "0b5c7d1e-1111-2222-3333-444455556666".to_string(),
            email: "jefe@grupo.pe".to_string(),
            created_at,
            expires_in: DEFAULT_EXPIRES_IN_SECS,
        }
    }

    #[test]
    fn test_expiry_and_refresh_window() {
        let fresh = data(Utc::now());
        assert!(!fresh.is_expired());
        assert!(!fresh.needs_refresh());

        let nearly = data(Utc::now() - Duration::minutes(57));
        assert!(!nearly.is_expired());
        assert!(nearly.needs_refresh());

        let old = data(Utc::now() - Duration::minutes(61));
        assert!(old.is_expired());
        assert_eq!(old.minutes_until_expiry(), 0);
    }

    #[test]
    fn test_save_load_and_clear() {
        let temp = tempfile::tempdir().expect("temp dir");
        let mut session = Session::new(temp.path().to_path_buf());
        session.update(data(Utc::now()));
        session.save().expect("save session");

        let mut loaded = Session::new(temp.path().to_path_buf());
        assert!(loaded.load().expect("load session"));
        assert_eq!(loaded.token(), Some("tok"));
        assert!(loaded.is_valid());

        loaded.clear().expect("clear session");
        let mut again = Session::new(temp.path().to_path_buf());
        assert!(!again.load().expect("load after clear"));
    }

    #[test]
    fn test_expired_session_not_loaded() {
        let temp = tempfile::tempdir().expect("temp dir");
        let mut session = Session::new(temp.path().to_path_buf());
        session.update(data(Utc::now() - Duration::hours(2)));
        session.save().expect("save session");

        let mut loaded = Session::new(temp.path().to_path_buf());
        assert!(!loaded.load().expect("load session"));
        assert!(loaded.data.is_none());
    }
}
