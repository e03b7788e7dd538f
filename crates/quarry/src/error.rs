//! Error types for the Quarry facade.
//!
//! The facade is the conversion boundary of the system: raw provider
//! errors (network, parsing, database) never cross it. Anything that
//! prevents a series from being produced surfaces as [`Error::DataUnavailable`];
//! degraded-but-usable conditions travel as warnings on the result instead.

use quarry_data::DataError;
use thiserror::Error;

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A required data source (EPS facts, net-income facts, share counts,
    /// price history) is entirely missing or unreachable for a symbol.
    #[error("no data available for {symbol}: {reason}")]
    DataUnavailable {
        /// Symbol that was requested.
        symbol: String,
        /// What was missing or failed, in provider terms.
        reason: String,
    },

    /// A provider could not be constructed before any symbol was
    /// requested (HTTP client initialization).
    #[error("provider initialization failed: {0}")]
    Init(#[source] DataError),
}

impl Error {
    /// Convert a provider-level failure into the boundary error.
    pub fn data_unavailable(symbol: &str, err: &DataError) -> Self {
        Self::DataUnavailable {
            symbol: symbol.to_string(),
            reason: err.to_string(),
        }
    }
}
