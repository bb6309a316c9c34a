//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! backend URL, storage bucket, group name, last used username, export
//! directory and geocoding endpoint.
//!
//! Configuration is stored at `~/.config/scoutdesk/config.json`. Secrets
//! (API key, passwords) live in the OS keychain, never in this file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "scoutdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_BUCKET: &str = "documentos";
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org";

pub const ENV_BACKEND_URL: &str = "SCOUTDESK_BACKEND_URL";
pub const ENV_API_KEY: &str = "SCOUTDESK_API_KEY";
pub const ENV_USERNAME: &str = "SCOUTDESK_USERNAME";
pub const ENV_PASSWORD: &str = "SCOUTDESK_PASSWORD";
pub const ENV_EXPORT_DIR: &str = "SCOUTDESK_EXPORT_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub backend_url: Option<String>,
    pub storage_bucket: Option<String>,
    /// Shown as the subtitle of generated forms.
    pub group_name: Option<String>,
    pub last_username: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub geocode_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override fields from `SCOUTDESK_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_BACKEND_URL) {
            self.backend_url = Some(url);
        }
        if let Some(user) = get(ENV_USERNAME) {
            self.last_username = Some(user);
        }
        if let Some(dir) = get(ENV_EXPORT_DIR) {
            self.export_dir = Some(PathBuf::from(dir));
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn backend_url(&self) -> Result<&str> {
        self.backend_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No backend URL configured. Set {} or add backend_url to the config file",
                    ENV_BACKEND_URL
                )
            })
    }

    pub fn bucket(&self) -> &str {
        self.storage_bucket.as_deref().unwrap_or(DEFAULT_BUCKET)
    }

    pub fn geocode_url(&self) -> &str {
        self.geocode_url.as_deref().unwrap_or(DEFAULT_GEOCODE_URL)
    }

    /// Export directory, falling back to the user's documents folder.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(|| dirs::document_dir().map(|d| d.join(APP_NAME)))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn group_name(&self) -> &str {
        self.group_name.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = Config::load_from(&temp.path().join("none.json")).expect("load");
        assert!(config.backend_url.is_none());
        assert_eq!(config.bucket(), DEFAULT_BUCKET);
        assert!(config.backend_url().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            backend_url: Some("https://abc.supabase.co/".to_string()),
            group_name: Some("Grupo Scout Lima 12".to_string()),
            ..Default::default()
        };
        config.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("reload");
        assert_eq!(loaded.backend_url().expect("url"), "https://abc.supabase.co");
        assert_eq!(loaded.group_name(), "Grupo Scout Lima 12");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://localhost:54321"),
            (ENV_USERNAME, "jefe@grupo.pe"),
            (ENV_EXPORT_DIR, ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config {
            export_dir: Some(PathBuf::from("/tmp/exports")),
            ..Default::default()
        };
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.backend_url.as_deref(), Some("http://localhost:54321"));
        assert_eq!(config.last_username.as_deref(), Some("jefe@grupo.pe"));
        // Blank values do not override
        assert_eq!(config.export_dir, Some(PathBuf::from("/tmp/exports")));
    }
}
