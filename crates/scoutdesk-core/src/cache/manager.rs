use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::auth::Permisos;
use crate::models::{ActividadExterior, Dirigente, ProgramaSemanal, Record, Scout};

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

const PERMISOS_CACHE: &str = "permisos";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// Last fetched copy of each backend table, one JSON file per table.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.cache_path(name), contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        debug!(cache = name, "Cache written");
        Ok(())
    }

    // ===== Tables =====

    /// Cached rows of `T`'s table.
    pub fn load_rows<T: Record>(&self) -> Result<Option<CachedData<Vec<T>>>> {
        self.load(T::TABLE)
    }

    pub fn save_rows<T: Record>(&self, rows: &[T]) -> Result<()> {
        self.save(T::TABLE, &rows)
    }

    // ===== Permissions =====

    pub fn load_permisos(&self) -> Result<Option<CachedData<Permisos>>> {
        self.load(PERMISOS_CACHE)
    }

    pub fn save_permisos(&self, permisos: &Permisos) -> Result<()> {
        self.save(PERMISOS_CACHE, permisos)
    }

    /// Remove every cached file, e.g. on logout.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            let is_cache = path.extension().is_some_and(|e| e == "json")
                && path.file_stem().is_some_and(|s| s != "session");
            if is_cache {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    // ===== Cache Age Information =====

    /// Age of one table's cache, logging errors without failing
    fn table_age<T: Record>(&self) -> Option<String> {
        match self.load_rows::<T>() {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(cache = T::TABLE, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    fn table_stale<T: Record>(&self) -> bool {
        match self.load_rows::<T>() {
            Ok(Some(cached)) => cached.is_stale(),
            Ok(None) => true,
            Err(e) => {
                debug!(cache = T::TABLE, error = %e, "Failed to load cache for staleness check");
                true
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        CacheAges {
            scouts: self.table_age::<Scout>(),
            dirigentes: self.table_age::<Dirigente>(),
            programas: self.table_age::<ProgramaSemanal>(),
            actividades: self.table_age::<ActividadExterior>(),
        }
    }

    /// Check if any of the main tables is stale or missing
    pub fn any_stale(&self) -> bool {
        self.table_stale::<Scout>()
            || self.table_stale::<Dirigente>()
            || self.table_stale::<ProgramaSemanal>()
            || self.table_stale::<ActividadExterior>()
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub scouts: Option<String>,
    pub dirigentes: Option<String>,
    pub programas: Option<String>,
    pub actividades: Option<String>,
}

impl CacheAges {
    /// Age of the first main table that has a cache
    pub fn last_updated(&self) -> String {
        [&self.scouts, &self.dirigentes, &self.actividades, &self.programas]
            .into_iter()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patrulla, Rama};
    use chrono::Duration;

    fn manager() -> (tempfile::TempDir, CacheManager) {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache = CacheManager::new(temp.path().join("cache")).expect("cache");
        (temp, cache)
    }

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_rounding() {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");
        cached.cached_at = Utc::now() - Duration::hours(30);
        assert_eq!(cached.age_display(), "1d ago");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale());
    }

    #[test]
    fn test_rows_round_trip_by_table() {
        let (_temp, cache) = manager();
        assert!(cache.load_rows::<Patrulla>().expect("load").is_none());

        let patrullas = vec![Patrulla {
            id: Some(3),
            nombre: "Halcones".to_string(),
            rama: Rama::Tropa,
            activa: true,
            ..Default::default()
        }];
        cache.save_rows(&patrullas).expect("save");

        let cached = cache.load_rows::<Patrulla>().expect("load").expect("cached");
        assert_eq!(cached.data, patrullas);
        assert!(cache.cache_path(Patrulla::TABLE).exists());
    }

    #[test]
    fn test_any_stale_until_all_main_tables_cached() {
        let (_temp, cache) = manager();
        assert!(cache.any_stale());
        cache.save_rows::<Scout>(&[]).expect("scouts");
        cache.save_rows::<Dirigente>(&[]).expect("dirigentes");
        cache.save_rows::<ProgramaSemanal>(&[]).expect("programas");
        assert!(cache.any_stale());
        cache.save_rows::<ActividadExterior>(&[]).expect("actividades");
        assert!(!cache.any_stale());
        assert_eq!(cache.get_cache_ages().last_updated(), "just now");
    }

    #[test]
    fn test_clear_keeps_session_file() {
        let (_temp, cache) = manager();
        cache.save_permisos(&Permisos::default()).expect("permisos");
        cache.save_rows::<Scout>(&[]).expect("scouts");
        std::fs::write(cache.cache_path("session"), "{}").expect("session");

        assert_eq!(cache.clear().expect("clear"), 2);
        assert!(cache.load_permisos().expect("load").is_none());
        assert!(cache.cache_path("session").exists());
    }

    #[test]
    fn test_cache_ages_last_updated_empty() {
        assert_eq!(CacheAges::default().last_updated(), "never");
    }
}
