#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quarrydata/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod classify;
pub mod derive;
pub mod error;
pub mod fact;
pub mod reconcile;
pub mod resolve;
pub mod split;
pub mod ttm;

pub use align::{AlignedPoint, DailyClose, DisplayBounds};
pub use error::{Result, SeriesError};
pub use fact::{EpsPoint, FactBundle, Metric, NormalizedFacts, PeriodicFact, RawFact};
pub use reconcile::reconcile;
pub use ttm::TtmPoint;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
