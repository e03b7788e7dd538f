//! Trailing-twelve-month aggregation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fact::EpsPoint;

/// Calendar days covered by the trailing window, current date included.
const WINDOW_DAYS: i64 = 365;

/// A trailing-twelve-month EPS sum at a given date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TtmPoint {
    /// Record date.
    pub date: NaiveDate,
    /// Sum of EPS values over the trailing window.
    pub value: f64,
}

/// Compute the trailing-365-day EPS sum at every record date.
///
/// The window is right-closed: it covers the 365 calendar days ending at
/// (and including) the record's own date. Minimum window population is one,
/// so a lone early quarter yields a TTM value equal to itself; the warm-up
/// figures are biased low but are produced rather than withheld.
pub fn trailing_sum(points: &[EpsPoint]) -> Vec<TtmPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);

    let mut out = Vec::with_capacity(sorted.len());
    let mut window_start = 0usize;
    for i in 0..sorted.len() {
        while (sorted[i].date - sorted[window_start].date).num_days() >= WINDOW_DAYS {
            window_start += 1;
        }
        let value: f64 = sorted[window_start..=i].iter().map(|p| p.value).sum();
        out.push(TtmPoint {
            date: sorted[i].date,
            value,
        });
    }
    out
}

/// Collapse same-day duplicate observations by arithmetic mean.
///
/// The secondary provider reports multiple rows at identical dates with
/// differing precision and carries no filing order to break the tie, so
/// the mean is the only defensible collapse. This policy is distinct from
/// duplicate resolution on filings, which keeps the latest-filed value.
pub fn mean_by_date(points: &[EpsPoint]) -> Vec<EpsPoint> {
    let mut grouped: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for p in points {
        let entry = grouped.entry(p.date).or_insert((0.0, 0));
        entry.0 += p.value;
        entry.1 += 1;
    }
    grouped
        .into_iter()
        .map(|(date, (sum, count))| EpsPoint {
            date,
            value: sum / f64::from(count),
        })
        .collect()
}
