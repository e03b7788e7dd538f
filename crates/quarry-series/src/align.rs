//! Price alignment and ratio computation.
//!
//! The TTM series is sparse (one point per reconciled quarter) while the
//! price series is daily. Alignment forward-fills the most recent TTM value
//! known at or before each trading date, never a later one, and computes
//! the P/E ratio. Dates whose ratio is undefined or non-finite are dropped
//! from the output rather than carried as sentinels.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ttm::TtmPoint;

/// A daily closing price observation (timezone-naive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    /// Trading date.
    pub date: NaiveDate,
    /// Closing price.
    pub close: f64,
}

/// One aligned observation: price, the TTM EPS known on that date, and
/// their ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedPoint {
    /// Trading date.
    pub date: NaiveDate,
    /// Closing price.
    pub close: f64,
    /// Most recent TTM EPS at or before this date.
    pub ttm_eps: f64,
    /// `close / ttm_eps`; always finite.
    pub pe: f64,
}

/// Chart axis bounds chosen for the P/E series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayBounds {
    /// Lower axis bound.
    pub lower: f64,
    /// Upper axis bound.
    pub upper: f64,
}

/// Percentile pair defining the retained ratio range.
const LOWER_PERCENTILE: f64 = 2.0;
const UPPER_PERCENTILE: f64 = 98.0;

/// Containment envelope for pathological ratios near zero EPS.
const BOUND_FLOOR: f64 = -100.0;
const BOUND_CEILING: f64 = 600.0;

/// Join a daily price series onto the TTM series and compute P/E ratios.
///
/// Forward-fill without look-ahead: each trading date takes the most
/// recent TTM value dated at or before it. Trading dates before the first
/// TTM date produce no entry, and dates whose ratio is non-finite (zero
/// EPS) are dropped.
pub fn align(prices: &[DailyClose], ttm: &[TtmPoint]) -> Vec<AlignedPoint> {
    if ttm.is_empty() {
        return Vec::new();
    }

    let mut prices = prices.to_vec();
    prices.sort_by_key(|p| p.date);
    let mut ttm = ttm.to_vec();
    ttm.sort_by_key(|t| t.date);

    let mut aligned = Vec::with_capacity(prices.len());
    let mut current = 0usize;
    for price in &prices {
        if price.date < ttm[0].date {
            continue;
        }
        while current + 1 < ttm.len() && ttm[current + 1].date <= price.date {
            current += 1;
        }
        let ttm_eps = ttm[current].value;
        let pe = price.close / ttm_eps;
        if pe.is_finite() {
            aligned.push(AlignedPoint {
                date: price.date,
                close: price.close,
                ttm_eps,
                pe,
            });
        }
    }
    aligned
}

/// Choose display bounds for the aligned P/E series.
///
/// The 2nd and 98th percentiles of the retained ratios are clamped into
/// the containment envelope, swapped if inverted, and an all-positive
/// range is floored at zero the way P/E axes conventionally are. Returns
/// `None` when there is nothing to chart.
pub fn display_bounds(aligned: &[AlignedPoint]) -> Option<DisplayBounds> {
    if aligned.is_empty() {
        return None;
    }

    let mut ratios: Vec<f64> = aligned.iter().map(|p| p.pe).collect();
    ratios.sort_by(f64::total_cmp);

    let mut lower = percentile(&ratios, LOWER_PERCENTILE).clamp(BOUND_FLOOR, BOUND_CEILING);
    let mut upper = percentile(&ratios, UPPER_PERCENTILE).clamp(BOUND_FLOOR, BOUND_CEILING);
    if lower > upper {
        std::mem::swap(&mut lower, &mut upper);
    }
    if lower > 0.0 && upper > lower {
        lower = 0.0;
    }
    Some(DisplayBounds { lower, upper })
}

/// Linear-interpolation percentile over a sorted, non-empty slice.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let below = rank.floor() as usize;
    let above = rank.ceil() as usize;
    if below == above {
        sorted[below]
    } else {
        let weight = rank - below as f64;
        sorted[below] * (1.0 - weight) + sorted[above] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn close(d: NaiveDate, price: f64) -> DailyClose {
        DailyClose {
            date: d,
            close: price,
        }
    }

    fn ttm(d: NaiveDate, value: f64) -> TtmPoint {
        TtmPoint { date: d, value }
    }

    #[test]
    fn test_forward_fill_applies_until_next_ttm_date() {
        let prices = vec![
            close(date(2023, 1, 30), 10.0),
            close(date(2023, 2, 1), 10.0),
            close(date(2023, 3, 15), 12.0),
            close(date(2023, 5, 2), 14.0),
        ];
        let series = vec![ttm(date(2023, 2, 1), 2.0), ttm(date(2023, 5, 2), 4.0)];
        let aligned = align(&prices, &series);

        // 2023-01-30 precedes the first TTM date: no entry
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned[0].date, date(2023, 2, 1));
        assert_relative_eq!(aligned[0].ttm_eps, 2.0);
        assert_relative_eq!(aligned[1].ttm_eps, 2.0);
        // the next TTM date applies from its own day onward
        assert_relative_eq!(aligned[2].ttm_eps, 4.0);
        assert_relative_eq!(aligned[2].pe, 3.5);
    }

    #[test]
    fn test_no_look_ahead() {
        let prices = vec![close(date(2023, 4, 1), 10.0)];
        let series = vec![ttm(date(2023, 2, 1), 2.0), ttm(date(2023, 4, 2), 100.0)];
        let aligned = align(&prices, &series);
        assert_eq!(aligned.len(), 1);
        assert_relative_eq!(aligned[0].ttm_eps, 2.0);
        assert!(aligned.iter().all(|p| p.date >= date(2023, 2, 1)));
    }

    #[test]
    fn test_zero_eps_dates_are_dropped() {
        let prices = vec![
            close(date(2023, 2, 1), 10.0),
            close(date(2023, 5, 2), 14.0),
        ];
        let series = vec![ttm(date(2023, 2, 1), 0.0), ttm(date(2023, 5, 2), 2.0)];
        let aligned = align(&prices, &series);
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned[0].date, date(2023, 5, 2));
    }

    #[test]
    fn test_negative_eps_is_kept() {
        let prices = vec![close(date(2023, 2, 1), 10.0)];
        let series = vec![ttm(date(2023, 2, 1), -2.0)];
        let aligned = align(&prices, &series);
        assert_eq!(aligned.len(), 1);
        assert_relative_eq!(aligned[0].pe, -5.0);
    }

    #[test]
    fn test_empty_ttm_yields_empty_alignment() {
        let prices = vec![close(date(2023, 2, 1), 10.0)];
        assert!(align(&prices, &[]).is_empty());
    }

    #[test]
    fn test_aligned_never_exceeds_price_count() {
        let prices: Vec<DailyClose> = (1..=28)
            .map(|d| close(date(2023, 2, d), f64::from(d)))
            .collect();
        let series = vec![ttm(date(2023, 2, 10), 1.5)];
        let aligned = align(&prices, &series);
        assert!(aligned.len() <= prices.len());
        assert_eq!(aligned.len(), 19);
    }

    fn bounds_of(ratios: &[f64]) -> DisplayBounds {
        let aligned: Vec<AlignedPoint> = ratios
            .iter()
            .enumerate()
            .map(|(i, &pe)| AlignedPoint {
                date: date(2023, 1, 1) + chrono::Duration::days(i as i64),
                close: 1.0,
                ttm_eps: 1.0,
                pe,
            })
            .collect();
        display_bounds(&aligned).unwrap()
    }

    #[test]
    fn test_all_positive_range_is_floored_at_zero() {
        // percentiles land on (5, 40)
        let ratios: Vec<f64> = vec![5.0; 50]
            .into_iter()
            .chain(vec![40.0; 50])
            .collect();
        let b = bounds_of(&ratios);
        assert_relative_eq!(b.lower, 0.0);
        assert_relative_eq!(b.upper, 40.0);
    }

    #[test]
    fn test_negative_lower_bound_is_kept() {
        let ratios: Vec<f64> = vec![-20.0; 50]
            .into_iter()
            .chain(vec![30.0; 50])
            .collect();
        let b = bounds_of(&ratios);
        assert_relative_eq!(b.lower, -20.0);
        assert_relative_eq!(b.upper, 30.0);
    }

    #[test]
    fn test_runaway_ratios_collapse_to_the_ceiling() {
        let ratios: Vec<f64> = vec![700.0; 50]
            .into_iter()
            .chain(vec![750.0; 50])
            .collect();
        let b = bounds_of(&ratios);
        assert_relative_eq!(b.lower, 600.0);
        assert_relative_eq!(b.upper, 600.0);
    }

    #[test]
    fn test_no_bounds_for_empty_series() {
        assert!(display_bounds(&[]).is_none());
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&sorted, 0.0), 1.0);
        assert_relative_eq!(percentile(&sorted, 100.0), 4.0);
        assert_relative_eq!(percentile(&sorted, 50.0), 2.5);
    }
}
