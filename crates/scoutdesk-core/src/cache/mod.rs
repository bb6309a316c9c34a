//! Local caching of backend tables.
//!
//! The `CacheManager` keeps the last fetched copy of each table as JSON so
//! the UI can show data immediately on start-up while a refresh runs. Data
//! is considered stale after 60 minutes.

pub mod manager;

pub use manager::{CacheAges, CacheManager, CachedData};
