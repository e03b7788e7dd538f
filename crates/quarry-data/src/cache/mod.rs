//! Caching layer for provider responses.
//!
//! Cache-aside with configurable expiry: callers consult the cache, fetch
//! on miss, and write back. Only provider payloads are stored; reconciled
//! series are always recomputed.

pub mod sqlite;

pub use sqlite::{CacheStats, SqliteCache};
