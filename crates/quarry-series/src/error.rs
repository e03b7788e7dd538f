//! Error types for the reconciliation pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, SeriesError>;

/// Errors that can occur during reconciliation.
///
/// The pipeline is deliberately hard to fail: split-adjustment problems
/// degrade to the unadjusted value for that record and undefined ratios are
/// dropped date by date. The only hard failure is a required input source
/// that is entirely absent.
#[derive(Debug, Error)]
pub enum SeriesError {
    /// A required fact source is entirely absent; reconciliation cannot
    /// proceed without it.
    #[error("missing {missing} facts, cannot reconcile")]
    MissingSource {
        /// Which source was absent (e.g. "diluted EPS", "net income").
        missing: &'static str,
    },
}
