//! Reporting-period duration classification.
//!
//! Filers disclose EPS over discrete quarters, nine-month year-to-date
//! spans, and full fiscal years, with period lengths that wobble around the
//! nominal figure as fiscal calendars shift. Classification buckets a fact
//! by its duration; facts outside every bucket (or with no computable
//! duration) are excluded from quarter derivation.

use crate::fact::PeriodicFact;

/// Duration bucket for a reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodBucket {
    /// A single discrete quarter (60 < days < 110).
    Quarterly,
    /// Nine-month year-to-date span (240 < days < 290).
    NineMonthCumulative,
    /// Full fiscal year (340 < days < 380).
    Annual,
}

/// Bucket a fact by reporting-period duration.
///
/// Returns `None` for snapshot facts and for durations outside every
/// bucket. The bounds are exclusive on both sides.
pub fn classify(fact: &PeriodicFact) -> Option<PeriodBucket> {
    let days = fact.duration_days()?;
    if days > 60 && days < 110 {
        Some(PeriodBucket::Quarterly)
    } else if days > 240 && days < 290 {
        Some(PeriodBucket::NineMonthCumulative)
    } else if days > 340 && days < 380 {
        Some(PeriodBucket::Annual)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::Metric;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn fact_with_duration(days: i64) -> PeriodicFact {
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        PeriodicFact {
            metric: Metric::DilutedEps,
            period_start: Some(end - chrono::Duration::days(days)),
            period_end: end,
            filed: end,
            value: 1.0,
        }
    }

    #[rstest]
    #[case(61, Some(PeriodBucket::Quarterly))]
    #[case(90, Some(PeriodBucket::Quarterly))]
    #[case(109, Some(PeriodBucket::Quarterly))]
    #[case(241, Some(PeriodBucket::NineMonthCumulative))]
    #[case(273, Some(PeriodBucket::NineMonthCumulative))]
    #[case(289, Some(PeriodBucket::NineMonthCumulative))]
    #[case(341, Some(PeriodBucket::Annual))]
    #[case(365, Some(PeriodBucket::Annual))]
    #[case(379, Some(PeriodBucket::Annual))]
    fn test_in_bucket(#[case] days: i64, #[case] expected: Option<PeriodBucket>) {
        assert_eq!(classify(&fact_with_duration(days)), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(60)]
    #[case(110)]
    #[case(180)]
    #[case(240)]
    #[case(290)]
    #[case(340)]
    #[case(380)]
    #[case(730)]
    fn test_outside_every_bucket(#[case] days: i64) {
        assert_eq!(classify(&fact_with_duration(days)), None);
    }

    #[test]
    fn test_snapshot_is_unclassifiable() {
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let snapshot = PeriodicFact {
            metric: Metric::SharesOutstanding,
            period_start: None,
            period_end: end,
            filed: end,
            value: 1.0,
        };
        assert_eq!(classify(&snapshot), None);
    }
}
