//! Fourth-quarter synthesis from annual and cumulative disclosures.
//!
//! Most filers never report a discrete Q4 figure: the fourth quarter hides
//! inside the annual total. Where an annual fact has a nine-month
//! counterpart ending close enough, Q4 is the difference; where it does
//! not, the annual value is split evenly across four quarters as a
//! lower-confidence approximation that is kept rather than discarded.

use chrono::NaiveDate;

use crate::classify::{PeriodBucket, classify};
use crate::fact::PeriodicFact;

/// Fiscal-calendar offset tolerated when pairing an annual fact with its
/// nine-month counterpart.
const NINE_MONTH_MATCH_TOLERANCE_DAYS: i64 = 12;

/// Duration assigned to synthesized fourth quarters.
const SYNTHETIC_QUARTER_DAYS: i64 = 90;

/// How a quarterly EPS value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarterSource {
    /// Disclosed directly by the filer as a discrete quarter.
    Reported,
    /// Synthesized as annual minus the matching nine-month cumulative.
    AnnualMinusNineMonth,
    /// Approximated as one quarter of the annual value; lower confidence.
    AnnualEvenSplit,
}

/// One quarter's EPS value ahead of duplicate resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterCandidate {
    /// Period end date.
    pub end: NaiveDate,
    /// Filing date, for restatement tie-breaking.
    pub filed: NaiveDate,
    /// EPS value.
    pub value: f64,
    /// Reporting-period length in days.
    pub duration_days: i64,
    /// Provenance of the value.
    pub source: QuarterSource,
}

/// Produce one EPS candidate per fiscal quarter from classified EPS facts.
///
/// The output pool is the union of natively reported quarterly facts and a
/// derived Q4 for every annual fact; it is unsorted and may contain
/// duplicate end dates, which the duplicate resolver collapses next.
pub fn derive_quarters(eps: &[PeriodicFact]) -> Vec<QuarterCandidate> {
    let mut quarterly = Vec::new();
    let mut nine_month = Vec::new();
    let mut annual = Vec::new();

    for fact in eps {
        match classify(fact) {
            Some(PeriodBucket::Quarterly) => quarterly.push(fact),
            Some(PeriodBucket::NineMonthCumulative) => nine_month.push(fact),
            Some(PeriodBucket::Annual) => annual.push(fact),
            None => {}
        }
    }

    let mut pool: Vec<QuarterCandidate> = quarterly
        .iter()
        .filter_map(|f| {
            let duration_days = f.duration_days()?;
            Some(QuarterCandidate {
                end: f.period_end,
                filed: f.filed,
                value: f.value,
                duration_days,
                source: QuarterSource::Reported,
            })
        })
        .collect();

    for a in &annual {
        pool.push(derive_fourth_quarter(a, &nine_month));
    }

    pool
}

/// Synthesize a Q4 candidate for one annual fact.
fn derive_fourth_quarter(
    annual: &PeriodicFact,
    nine_month: &[&PeriodicFact],
) -> QuarterCandidate {
    let counterpart = nine_month
        .iter()
        .map(|n| (n, (n.period_end - annual.period_end).num_days().abs()))
        .filter(|(_, offset)| *offset <= NINE_MONTH_MATCH_TOLERANCE_DAYS)
        .min_by_key(|(_, offset)| *offset)
        .map(|(n, _)| n);

    let (value, source) = match counterpart {
        Some(n) => (annual.value - n.value, QuarterSource::AnnualMinusNineMonth),
        None => (annual.value / 4.0, QuarterSource::AnnualEvenSplit),
    };

    QuarterCandidate {
        end: annual.period_end,
        filed: annual.filed,
        value,
        duration_days: SYNTHETIC_QUARTER_DAYS,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::Metric;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn eps_fact(duration: i64, end: NaiveDate, value: f64) -> PeriodicFact {
        PeriodicFact {
            metric: Metric::DilutedEps,
            period_start: Some(end - Duration::days(duration)),
            period_end: end,
            filed: end,
            value,
        }
    }

    #[test]
    fn test_q4_from_annual_minus_nine_month() {
        let facts = vec![
            eps_fact(365, date(2023, 12, 31), 4.00),
            eps_fact(273, date(2023, 9, 30), 3.10),
            // nine-month counterpart 8 days off the annual end
            eps_fact(273, date(2023, 12, 23), 3.10),
        ];
        let pool = derive_quarters(&facts);
        assert_eq!(pool.len(), 1);
        let q4 = &pool[0];
        assert_relative_eq!(q4.value, 0.90, epsilon = 1e-12);
        assert_eq!(q4.end, date(2023, 12, 31));
        assert_eq!(q4.duration_days, 90);
        assert_eq!(q4.source, QuarterSource::AnnualMinusNineMonth);
    }

    #[test]
    fn test_q4_even_split_when_no_counterpart_in_tolerance() {
        let facts = vec![
            eps_fact(365, date(2023, 12, 31), 4.00),
            // 92 days away from the annual end: outside the ±12-day window
            eps_fact(273, date(2023, 9, 30), 3.10),
        ];
        let pool = derive_quarters(&facts);
        assert_eq!(pool.len(), 1);
        assert_relative_eq!(pool[0].value, 1.00, epsilon = 1e-12);
        assert_eq!(pool[0].source, QuarterSource::AnnualEvenSplit);
    }

    #[test]
    fn test_closest_counterpart_wins() {
        let facts = vec![
            eps_fact(365, date(2023, 12, 31), 4.00),
            eps_fact(273, date(2023, 12, 21), 3.00),
            eps_fact(273, date(2024, 1, 2), 3.20),
        ];
        let pool = derive_quarters(&facts);
        // 2024-01-02 is 2 days away, 2023-12-21 is 10 days away
        assert_relative_eq!(pool[0].value, 0.80, epsilon = 1e-12);
    }

    #[test]
    fn test_native_quarters_join_the_pool() {
        let facts = vec![
            eps_fact(90, date(2023, 3, 31), 0.50),
            eps_fact(91, date(2023, 6, 30), 0.55),
            eps_fact(365, date(2023, 12, 31), 4.00),
        ];
        let pool = derive_quarters(&facts);
        assert_eq!(pool.len(), 3);
        assert!(
            pool.iter()
                .filter(|c| c.source == QuarterSource::Reported)
                .count()
                == 2
        );
    }

    #[test]
    fn test_unclassifiable_facts_are_ignored() {
        let facts = vec![
            eps_fact(180, date(2023, 6, 30), 1.05), // half-year: no bucket
            eps_fact(90, date(2023, 3, 31), 0.50),
        ];
        let pool = derive_quarters(&facts);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].end, date(2023, 3, 31));
    }
}
