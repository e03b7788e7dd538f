//! Periodic fact model and normalization of raw disclosure records.
//!
//! Regulatory filers disclose the same metric at inconsistent cadences and
//! occasionally restate prior periods. This module turns the raw per-metric
//! record arrays into a uniform [`PeriodicFact`] representation and selects
//! the filer's current share count, which later anchors split normalization.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeriesError};

/// Financial metric a disclosed fact refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Diluted earnings per share.
    DilutedEps,
    /// Net income attributable to shareholders.
    NetIncome,
    /// Common shares outstanding (instantaneous snapshot).
    SharesOutstanding,
}

/// Raw disclosure record as handed over by the regulatory facts provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFact {
    /// Period start; absent for instantaneous snapshot facts.
    pub start: Option<NaiveDate>,
    /// Period end; the authoritative key for alignment.
    pub end: NaiveDate,
    /// Date the disclosure was submitted.
    pub filed: NaiveDate,
    /// Disclosed value.
    pub value: f64,
}

/// One disclosed value for one metric over one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicFact {
    /// The metric this fact discloses.
    pub metric: Metric,
    /// Period start; `None` marks an instantaneous snapshot.
    pub period_start: Option<NaiveDate>,
    /// Period end.
    pub period_end: NaiveDate,
    /// Filing date, used only for tie-breaking between restatements.
    pub filed: NaiveDate,
    /// Disclosed value.
    pub value: f64,
}

impl PeriodicFact {
    /// Build a fact from a raw provider record.
    pub const fn from_raw(metric: Metric, raw: &RawFact) -> Self {
        Self {
            metric,
            period_start: raw.start,
            period_end: raw.end,
            filed: raw.filed,
            value: raw.value,
        }
    }

    /// Reporting-period length in days.
    ///
    /// Snapshot facts (no start date) return `None` and never enter
    /// duration classification, but they remain available to end-date
    /// lookups.
    pub fn duration_days(&self) -> Option<i64> {
        let start = self.period_start?;
        Some((self.period_end - start).num_days())
    }
}

/// A reconciled earnings-per-share value keyed by period end date.
///
/// This is the shape shared by resolved quarters, split-adjusted quarters,
/// and the secondary provider's pre-reported fallback series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsPoint {
    /// Period end date.
    pub date: NaiveDate,
    /// EPS value.
    pub value: f64,
}

/// Raw per-metric fact arrays for one company, exactly as supplied by the
/// regulatory facts provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactBundle {
    /// Diluted EPS facts.
    pub diluted_eps: Vec<RawFact>,
    /// Net income facts.
    pub net_income: Vec<RawFact>,
    /// Shares-outstanding facts from the entity-level namespace.
    pub shares_entity: Vec<RawFact>,
    /// Shares-outstanding facts from the statement-level namespace,
    /// consulted only when the entity-level namespace is empty.
    pub shares_statement: Vec<RawFact>,
}

/// Output of fact normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFacts {
    /// Diluted EPS facts in period form.
    pub eps: Vec<PeriodicFact>,
    /// Net income facts in period form, snapshots included.
    pub net_income: Vec<PeriodicFact>,
    /// Share count on the filer's current basis: the value of the
    /// share-count fact with the most recent end date.
    pub current_shares: f64,
}

/// Normalize a raw fact bundle.
///
/// Fails when the EPS facts, the net income facts, or every share-count
/// namespace is entirely absent; reconciliation cannot proceed without all
/// three. Records violating `end >= start` are dropped.
///
/// # Errors
/// Returns [`SeriesError::MissingSource`] naming the absent source.
pub fn normalize(bundle: &FactBundle) -> Result<NormalizedFacts> {
    let eps = to_periodic(Metric::DilutedEps, &bundle.diluted_eps);
    if eps.is_empty() {
        return Err(SeriesError::MissingSource {
            missing: "diluted EPS",
        });
    }

    let net_income = to_periodic(Metric::NetIncome, &bundle.net_income);
    if net_income.is_empty() {
        return Err(SeriesError::MissingSource {
            missing: "net income",
        });
    }

    let shares = if bundle.shares_entity.is_empty() {
        &bundle.shares_statement
    } else {
        &bundle.shares_entity
    };
    let current_shares = shares
        .iter()
        .max_by_key(|f| f.end)
        .map(|f| f.value)
        .ok_or(SeriesError::MissingSource {
            missing: "shares outstanding",
        })?;

    Ok(NormalizedFacts {
        eps,
        net_income,
        current_shares,
    })
}

fn to_periodic(metric: Metric, raw: &[RawFact]) -> Vec<PeriodicFact> {
    raw.iter()
        .filter(|f| f.start.is_none_or(|s| s <= f.end))
        .map(|f| PeriodicFact::from_raw(metric, f))
        .collect()
}
