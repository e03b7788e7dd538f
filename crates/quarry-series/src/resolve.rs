//! Duplicate filing resolution.
//!
//! A fiscal period end can surface more than once in the pool: restated
//! filings, amended reports, and the synthesized Q4 all land on the same
//! end date. Later filings supersede earlier ones for the same period.

use crate::derive::QuarterCandidate;

/// Collapse candidates sharing an end date, keeping the most recently
/// filed, and return the survivors sorted ascending by end date.
///
/// The output is guaranteed unique and strictly ascending on `end`.
pub fn resolve_duplicates(mut candidates: Vec<QuarterCandidate>) -> Vec<QuarterCandidate> {
    candidates.sort_by_key(|c| (c.end, c.filed));

    let mut resolved: Vec<QuarterCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match resolved.last_mut() {
            Some(last) if last.end == candidate.end => *last = candidate,
            _ => resolved.push(candidate),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::QuarterSource;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidate(end: NaiveDate, filed: NaiveDate, value: f64) -> QuarterCandidate {
        QuarterCandidate {
            end,
            filed,
            value,
            duration_days: 90,
            source: QuarterSource::Reported,
        }
    }

    #[test]
    fn test_latest_filing_wins() {
        let resolved = resolve_duplicates(vec![
            candidate(date(2023, 3, 31), date(2023, 5, 10), 0.50),
            candidate(date(2023, 3, 31), date(2024, 2, 15), 0.48), // restated
            candidate(date(2023, 3, 31), date(2023, 4, 28), 0.52),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].value, 0.48);
    }

    #[test]
    fn test_output_unique_and_strictly_ascending() {
        let resolved = resolve_duplicates(vec![
            candidate(date(2023, 9, 30), date(2023, 11, 1), 0.60),
            candidate(date(2023, 3, 31), date(2023, 5, 1), 0.50),
            candidate(date(2023, 6, 30), date(2023, 8, 1), 0.55),
            candidate(date(2023, 6, 30), date(2023, 8, 2), 0.56),
        ]);
        let ends: Vec<_> = resolved.iter().map(|c| c.end).collect();
        assert_eq!(
            ends,
            vec![date(2023, 3, 31), date(2023, 6, 30), date(2023, 9, 30)]
        );
        assert!(ends.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(resolved[1].value, 0.56);
    }

    #[test]
    fn test_empty_pool() {
        assert!(resolve_duplicates(Vec::new()).is_empty());
    }
}
