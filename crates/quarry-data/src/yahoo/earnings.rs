//! Reported earnings history from Yahoo Finance.
//!
//! This is the fallback earnings source: when regulatory reconciliation
//! yields nothing, the pre-reported EPS-by-date series from the
//! quoteSummary endpoint feeds the same downstream TTM stage.

use crate::error::{DataError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

/// quoteSummary endpoint serving the earnings-history module.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// One reported earnings observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedEarnings {
    /// Fiscal quarter end date.
    pub date: NaiveDate,
    /// Reported (actual) EPS for that quarter.
    pub reported_eps: f64,
}

/// Yahoo Finance reported-earnings provider.
#[derive(Debug)]
pub struct YahooEarningsProvider {
    client: reqwest::Client,
    rate_limit_delay: Duration,
}

impl YahooEarningsProvider {
    /// Create a new reported-earnings provider with default rate limiting (1 req/sec).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a new provider with custom rate limiting.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DataError::Network)?;
        Ok(Self {
            client,
            rate_limit_delay,
        })
    }

    /// Fetch the reported-EPS history for a symbol.
    ///
    /// Entries missing a reported value or a parseable quarter date are
    /// dropped. At most `limit` of the most recent observations are
    /// returned, ordered ascending by date.
    pub async fn fetch_reported_eps(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<ReportedEarnings>> {
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let url = format!("{}/{}?modules=earningsHistory", QUOTE_SUMMARY_URL, symbol);
        let response = self.client.get(&url).send().await.map_err(DataError::Network)?;

        if !response.status().is_success() {
            return Err(DataError::YahooApi(format!(
                "Failed to fetch earnings history for {}: HTTP {}",
                symbol,
                response.status()
            )));
        }

        let envelope: QuoteSummaryEnvelope =
            response.json().await.map_err(DataError::Network)?;

        // Apply rate limiting
        sleep(self.rate_limit_delay).await;

        let mut earnings = extract_reported_eps(&envelope);
        if earnings.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No reported earnings returned".to_string(),
            });
        }

        if earnings.len() > limit {
            earnings.drain(..earnings.len() - limit);
        }
        Ok(earnings)
    }
}

fn extract_reported_eps(envelope: &QuoteSummaryEnvelope) -> Vec<ReportedEarnings> {
    let mut earnings: Vec<ReportedEarnings> = envelope
        .quote_summary
        .result
        .iter()
        .flatten()
        .filter_map(|r| r.earnings_history.as_ref())
        .flat_map(|h| &h.history)
        .filter_map(|entry| {
            let eps = entry.eps_actual.as_ref()?.raw?;
            let date = entry.quarter.as_ref()?.date()?;
            Some(ReportedEarnings {
                date,
                reported_eps: eps,
            })
        })
        .collect();
    earnings.sort_by_key(|e| e.date);
    earnings
}

/// Envelope of the quoteSummary response.
#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    #[serde(rename = "earningsHistory", default)]
    earnings_history: Option<EarningsHistory>,
}

#[derive(Debug, Deserialize)]
struct EarningsHistory {
    #[serde(default)]
    history: Vec<EarningsQuarter>,
}

#[derive(Debug, Deserialize)]
struct EarningsQuarter {
    #[serde(rename = "epsActual", default)]
    eps_actual: Option<FormattedValue>,
    #[serde(default)]
    quarter: Option<FormattedValue>,
}

/// Yahoo's `{raw, fmt}` value wrapper.
#[derive(Debug, Deserialize)]
struct FormattedValue {
    #[serde(default)]
    raw: Option<f64>,
    #[serde(default)]
    fmt: Option<String>,
}

impl FormattedValue {
    /// Interpret the value as a date: the `fmt` field when it parses,
    /// otherwise the `raw` field as a Unix timestamp.
    fn date(&self) -> Option<NaiveDate> {
        if let Some(fmt) = &self.fmt
            && let Ok(date) = NaiveDate::parse_from_str(fmt, "%Y-%m-%d")
        {
            return Some(date);
        }
        let secs = self.raw? as i64;
        Some(DateTime::<Utc>::from_timestamp(secs, 0)?.date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "quoteSummary": {
            "result": [{
                "earningsHistory": {
                    "history": [
                        {"epsActual": {"raw": 1.26, "fmt": "1.26"},
                         "quarter": {"raw": 1688083200, "fmt": "2023-06-30"}},
                        {"epsActual": {"raw": 1.46, "fmt": "1.46"},
                         "quarter": {"raw": 1696032000, "fmt": "2023-09-30"}},
                        {"epsActual": {},
                         "quarter": {"raw": 1703980800, "fmt": "2023-12-31"}}
                    ]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_extracts_reported_eps_sorted_ascending() {
        let envelope: QuoteSummaryEnvelope = serde_json::from_str(PAYLOAD).unwrap();
        let earnings = extract_reported_eps(&envelope);
        assert_eq!(earnings.len(), 2);
        assert_eq!(
            earnings[0].date,
            NaiveDate::from_ymd_opt(2023, 6, 30).unwrap()
        );
        assert_eq!(earnings[0].reported_eps, 1.26);
        assert!(earnings[0].date < earnings[1].date);
    }

    #[test]
    fn test_entries_without_a_reported_value_are_dropped() {
        let envelope: QuoteSummaryEnvelope = serde_json::from_str(PAYLOAD).unwrap();
        let earnings = extract_reported_eps(&envelope);
        assert!(earnings.iter().all(|e| e.reported_eps > 0.0));
        assert_eq!(earnings.len(), 2);
    }

    #[test]
    fn test_date_falls_back_to_raw_timestamp() {
        let value = FormattedValue {
            raw: Some(1_696_032_000.0),
            fmt: None,
        };
        assert_eq!(
            value.date(),
            Some(NaiveDate::from_ymd_opt(2023, 9, 30).unwrap())
        );
    }

    #[test]
    fn test_empty_result_extracts_nothing() {
        let envelope: QuoteSummaryEnvelope =
            serde_json::from_str(r#"{"quoteSummary": {"result": null, "error": null}}"#).unwrap();
        assert!(extract_reported_eps(&envelope).is_empty());
    }
}
