//! Cache location for the Quarry CLI.
//!
//! Uses platform-specific cache directories:
//! - Linux: `~/.cache/quarry/`
//! - macOS: `~/Library/Caches/quarry/`
//! - Windows: `%LOCALAPPDATA%\quarry\cache\`

use quarry::data::cache::SqliteCache;
use quarry::data::error::DataError;
use std::path::PathBuf;

/// Get the default cache directory path.
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quarry")
}

/// Get the default cache database path.
pub(crate) fn default_cache_path() -> PathBuf {
    default_cache_dir().join("quarry.db")
}

/// Open the cache, creating the directory if needed.
pub(crate) fn open_cache() -> Result<SqliteCache, DataError> {
    let cache_path = default_cache_path();

    // Ensure parent directory exists
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    SqliteCache::new(&cache_path)
}
