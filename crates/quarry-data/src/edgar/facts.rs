//! Typed model of the SEC EDGAR Company Facts payload.
//!
//! The payload carries every XBRL fact a filer has ever disclosed, keyed
//! by taxonomy and tag. Quarry consumes a fixed set of four tags; no
//! general taxonomy support is attempted.

use crate::error::Result;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;

/// US-GAAP taxonomy key.
pub const TAXONOMY_US_GAAP: &str = "us-gaap";

/// Document and Entity Information taxonomy key.
pub const TAXONOMY_DEI: &str = "dei";

/// Diluted earnings-per-share tag (us-gaap).
pub const TAG_DILUTED_EPS: &str = "EarningsPerShareDiluted";

/// Net income tag (us-gaap).
pub const TAG_NET_INCOME: &str = "NetIncomeLoss";

/// Entity-level shares-outstanding tag (dei).
pub const TAG_SHARES_ENTITY: &str = "EntityCommonStockSharesOutstanding";

/// Statement-level shares-outstanding tag (us-gaap).
pub const TAG_SHARES_COMMON: &str = "CommonStockSharesOutstanding";

/// Response from the SEC EDGAR Company Facts API.
#[derive(Debug, Deserialize)]
pub struct CompanyFactsResponse {
    /// CIK number
    pub cik: u64,
    /// Entity name
    #[serde(rename = "entityName")]
    pub entity_name: String,
    /// Facts organized by taxonomy and tag
    pub facts: HashMap<String, HashMap<String, TagFacts>>,
}

/// Facts for a specific XBRL tag.
#[derive(Debug, Deserialize)]
pub struct TagFacts {
    /// Label/description
    #[serde(default)]
    pub label: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Units (USD, shares, etc.) containing the actual fact values
    pub units: Option<HashMap<String, Vec<FactValue>>>,
}

/// A single fact value with metadata.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct FactValue {
    /// Start date of the period; absent for instantaneous facts
    #[serde(default)]
    pub start: Option<String>,
    /// End date of the period
    pub end: String,
    /// Value
    pub val: f64,
    /// Accession number
    #[serde(default)]
    pub accn: Option<String>,
    /// Fiscal year
    #[serde(default)]
    pub fy: Option<i32>,
    /// Fiscal period
    #[serde(default)]
    pub fp: Option<String>,
    /// Form type
    #[serde(default)]
    pub form: Option<String>,
    /// Filed date
    #[serde(default)]
    pub filed: Option<String>,
    /// Frame (instant or duration)
    #[serde(default)]
    pub frame: Option<String>,
}

/// A fact value with its dates parsed, ready for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedValue {
    /// Period start; `None` for instantaneous facts.
    pub start: Option<NaiveDate>,
    /// Period end.
    pub end: NaiveDate,
    /// Filing date; falls back to the period end when the payload omits
    /// it, so downstream tie-breaking stays total.
    pub filed: NaiveDate,
    /// Disclosed value.
    pub value: f64,
}

impl CompanyFactsResponse {
    /// Parse a raw company-facts JSON payload.
    ///
    /// # Errors
    /// Returns `DataError::Serialization` on malformed JSON.
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// All reported values for a tag, flattened across units.
    ///
    /// EPS facts live under a `USD/shares` unit, monetary facts under
    /// `USD`, and share counts under `shares`; each consumed tag carries
    /// exactly one unit in practice, so flattening is safe. Values whose
    /// end date fails to parse are skipped.
    pub fn reported_values(&self, taxonomy: &str, tag: &str) -> Vec<ReportedValue> {
        let Some(units) = self
            .facts
            .get(taxonomy)
            .and_then(|tags| tags.get(tag))
            .and_then(|t| t.units.as_ref())
        else {
            return Vec::new();
        };

        units
            .values()
            .flatten()
            .filter_map(|v| {
                let end = parse_date(&v.end)?;
                let start = v.start.as_deref().and_then(parse_date);
                let filed = v.filed.as_deref().and_then(parse_date).unwrap_or(end);
                Some(ReportedValue {
                    start,
                    end,
                    filed,
                    value: v.val,
                })
            })
            .collect()
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "cik": 320193,
        "entityName": "Apple Inc.",
        "facts": {
            "dei": {
                "EntityCommonStockSharesOutstanding": {
                    "label": "Entity Common Stock, Shares Outstanding",
                    "units": {
                        "shares": [
                            {"end": "2023-10-20", "val": 15552752000, "filed": "2023-11-03"}
                        ]
                    }
                }
            },
            "us-gaap": {
                "EarningsPerShareDiluted": {
                    "label": "Earnings Per Share, Diluted",
                    "units": {
                        "USD/shares": [
                            {"start": "2023-07-02", "end": "2023-09-30", "val": 1.46,
                             "accn": "0000320193-23-000106", "fy": 2023, "fp": "FY",
                             "form": "10-K", "filed": "2023-11-03"},
                            {"start": "2022-10-01", "end": "2023-09-30", "val": 6.13,
                             "form": "10-K", "filed": "2023-11-03"}
                        ]
                    }
                },
                "NetIncomeLoss": {
                    "units": {
                        "USD": [
                            {"start": "2023-07-02", "end": "2023-09-30", "val": 22956000000}
                        ]
                    }
                }
            }
        }
    }"#;

    #[test]
    fn test_parses_company_facts_payload() {
        let facts = CompanyFactsResponse::from_json(PAYLOAD).unwrap();
        assert_eq!(facts.cik, 320193);
        assert_eq!(facts.entity_name, "Apple Inc.");
    }

    #[test]
    fn test_reported_values_for_eps_tag() {
        let facts = CompanyFactsResponse::from_json(PAYLOAD).unwrap();
        let eps = facts.reported_values(TAXONOMY_US_GAAP, TAG_DILUTED_EPS);
        assert_eq!(eps.len(), 2);

        let q4 = eps.iter().find(|v| v.value == 1.46).unwrap();
        assert_eq!(
            q4.start,
            Some(NaiveDate::from_ymd_opt(2023, 7, 2).unwrap())
        );
        assert_eq!(q4.end, NaiveDate::from_ymd_opt(2023, 9, 30).unwrap());
        assert_eq!(q4.filed, NaiveDate::from_ymd_opt(2023, 11, 3).unwrap());
    }

    #[test]
    fn test_missing_filed_falls_back_to_end_date() {
        let facts = CompanyFactsResponse::from_json(PAYLOAD).unwrap();
        let income = facts.reported_values(TAXONOMY_US_GAAP, TAG_NET_INCOME);
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].filed, income[0].end);
    }

    #[test]
    fn test_shares_live_in_the_dei_taxonomy() {
        let facts = CompanyFactsResponse::from_json(PAYLOAD).unwrap();
        let shares = facts.reported_values(TAXONOMY_DEI, TAG_SHARES_ENTITY);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].start, None);

        // statement-level namespace is absent in this payload
        assert!(
            facts
                .reported_values(TAXONOMY_US_GAAP, TAG_SHARES_COMMON)
                .is_empty()
        );
    }

    #[test]
    fn test_unknown_tag_yields_no_values() {
        let facts = CompanyFactsResponse::from_json(PAYLOAD).unwrap();
        assert!(facts.reported_values(TAXONOMY_US_GAAP, "Assets").is_empty());
    }
}
