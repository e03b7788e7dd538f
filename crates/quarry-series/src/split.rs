//! Share-count normalization of historical EPS.
//!
//! A split multiplies the share count and divides per-share figures, which
//! silently breaks naive EPS comparisons across time. Without a full share
//! history, the split factor is inferred per quarter: net income divided by
//! EPS implies the share count in force back then, and the ratio of the
//! current count to that implied count is snapped to the nearest canonical
//! split ratio. Snapping suppresses buyback and issuance noise while still
//! capturing genuine split events; it is a heuristic, not a cap-table
//! reconstruction, and it may read a very large non-split change as a
//! split.

use crate::derive::QuarterCandidate;
use crate::fact::{EpsPoint, PeriodicFact};

/// Canonical split ratios observed in practice.
pub const CANONICAL_SPLIT_FACTORS: [f64; 10] =
    [1.0, 2.0, 4.0, 7.0, 10.0, 20.0, 28.0, 40.0, 50.0, 100.0];

/// Snap an implied share-count ratio to the nearest canonical split factor
/// by absolute difference.
pub fn snap_to_split_factor(ratio: f64) -> f64 {
    let mut nearest = CANONICAL_SPLIT_FACTORS[0];
    for factor in CANONICAL_SPLIT_FACTORS {
        if (factor - ratio).abs() < (nearest - ratio).abs() {
            nearest = factor;
        }
    }
    nearest
}

/// Rescale resolved quarterly EPS values onto the current share-count
/// basis.
///
/// Adjustment never fails a record: a zero EPS, a missing net-income
/// lookup, or a non-finite implied ratio leaves that record's original
/// value in place. The output keeps the input's order and end dates.
pub fn adjust(
    records: &[QuarterCandidate],
    net_income: &[PeriodicFact],
    current_shares: f64,
) -> Vec<EpsPoint> {
    records
        .iter()
        .map(|record| EpsPoint {
            date: record.end,
            value: adjusted_value(record, net_income, current_shares),
        })
        .collect()
}

fn adjusted_value(
    record: &QuarterCandidate,
    net_income: &[PeriodicFact],
    current_shares: f64,
) -> f64 {
    if record.value == 0.0 {
        return record.value;
    }
    let Some(income) = lookup_net_income(net_income, record) else {
        return record.value;
    };

    let implied_shares_then = income.value / record.value;
    let ratio = current_shares / implied_shares_then;
    if !ratio.is_finite() {
        return record.value;
    }

    record.value / snap_to_split_factor(ratio)
}

/// Find the net-income fact backing a quarterly record.
///
/// Exact end-date matches win; among several exact matches (quarterly and
/// cumulative figures can share an end date) the one with the closest
/// duration is chosen, with unknown durations ranking last. When no exact
/// match exists, the fact with the nearest end date is the fallback.
fn lookup_net_income<'a>(
    facts: &'a [PeriodicFact],
    record: &QuarterCandidate,
) -> Option<&'a PeriodicFact> {
    let mut exact: Vec<&PeriodicFact> = facts
        .iter()
        .filter(|f| f.period_end == record.end)
        .collect();

    match exact.len() {
        0 => facts
            .iter()
            .min_by_key(|f| (f.period_end - record.end).num_days().abs()),
        1 => exact.pop(),
        _ => exact.into_iter().min_by_key(|f| {
            f.duration_days()
                .map_or(i64::MAX, |d| (d - record.duration_days).abs())
        }),
    }
}
