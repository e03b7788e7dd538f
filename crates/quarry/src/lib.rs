#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quarrydata/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod service;

// Re-export main types from sub-crates
pub use quarry_data as data;
pub use quarry_output as output;
pub use quarry_series as series;

pub use error::{Error, Result};
pub use service::{
    Analysis, EpsService, EpsSource, PriceEarningsView, ServiceConfig, Warning, compute_ttm_and_pe,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
