//! End-to-end reconciliation of a raw fact bundle.

use crate::error::Result;
use crate::fact::{self, EpsPoint, FactBundle};
use crate::resolve::resolve_duplicates;
use crate::{derive, split};

/// Run the full reconciliation pipeline over one company's fact bundle.
///
/// Normalization, quarter derivation, duplicate resolution, and split
/// normalization run in order; the output is one split-adjusted EPS value
/// per distinct period end, sorted ascending.
///
/// # Errors
/// Fails only when a required source (EPS, net income, share count) is
/// entirely absent; every other irregularity degrades per record.
pub fn reconcile(bundle: &FactBundle) -> Result<Vec<EpsPoint>> {
    let facts = fact::normalize(bundle)?;
    let pool = derive::derive_quarters(&facts.eps);
    let resolved = resolve_duplicates(pool);
    Ok(split::adjust(
        &resolved,
        &facts.net_income,
        facts.current_shares,
    ))
}
