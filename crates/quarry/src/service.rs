//! The reconciliation service: providers wired into the pipeline.
//!
//! `EpsService` owns the data collaborators (EDGAR client, Yahoo quote and
//! earnings providers, optional SQLite cache) and sequences the flow the
//! presentation layer consumes: fetch facts, reconcile, fall back to the
//! reported-earnings series when reconciliation yields nothing, aggregate,
//! align, and attach warnings. Every provider failure crossing this layer
//! becomes [`Error::DataUnavailable`].

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use quarry_data::DataError;
use quarry_data::cache::SqliteCache;
use quarry_data::edgar::{self, CompanyFactsResponse, EdgarClient, ReportedValue};
use quarry_data::yahoo::{DailyQuote, YahooEarningsProvider, YahooQuoteProvider};
use quarry_series::align::{AlignedPoint, DailyClose, DisplayBounds};
use quarry_series::fact::{EpsPoint, FactBundle, RawFact};
use quarry_series::ttm::TtmPoint;
use quarry_series::{align, reconcile, ttm};

use crate::error::{Error, Result};

/// Configuration for the reconciliation service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Years of daily price history to fetch.
    pub years_of_history: u32,
    /// Maximum age of cached provider payloads before they are refetched.
    pub cache_max_age_days: i64,
    /// Maximum reported-earnings observations requested on the fallback
    /// path.
    pub earnings_limit: usize,
    /// Days after which the most recent reconciled period counts as stale.
    pub stale_after_days: i64,
    /// Ignore cached data and refetch (cache writes still happen).
    pub force_refresh: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            years_of_history: 10,
            cache_max_age_days: 1,
            earnings_limit: 100,
            stale_after_days: 240,
            force_refresh: false,
        }
    }
}

/// Which source produced the quarterly EPS series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpsSource {
    /// Reconciled from regulatory company facts.
    RegulatoryFacts,
    /// Secondary provider's pre-reported earnings (fallback).
    ReportedEarnings,
}

impl std::fmt::Display for EpsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegulatoryFacts => write!(f, "SEC company facts"),
            Self::ReportedEarnings => write!(f, "reported earnings (fallback)"),
        }
    }
}

/// Soft conditions worth surfacing alongside a usable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warning {
    /// The most recent reconciled period end is well behind the as-of
    /// date; the series is usable but the tail of the chart is old news.
    StaleData {
        /// End date of the most recent reconciled period.
        last_period_end: NaiveDate,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StaleData { last_period_end } => {
                write!(f, "most recent reconciled period ended {}", last_period_end)
            }
        }
    }
}

/// The pure TTM + alignment stage over an EPS series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEarningsView {
    /// Trailing-twelve-month EPS series.
    pub ttm: Vec<TtmPoint>,
    /// Price series joined with TTM EPS and P/E ratios.
    pub aligned: Vec<AlignedPoint>,
    /// Chart display bounds for the P/E series, when anything survived.
    pub bounds: Option<DisplayBounds>,
}

/// Compute the TTM series, the aligned P/E series, and display bounds for
/// any quarterly EPS series, reconciled or fallback.
pub fn compute_ttm_and_pe(prices: &[DailyClose], eps: &[EpsPoint]) -> PriceEarningsView {
    let ttm = ttm::trailing_sum(eps);
    let aligned = align::align(prices, &ttm);
    let bounds = align::display_bounds(&aligned);
    PriceEarningsView {
        ttm,
        aligned,
        bounds,
    }
}

/// Everything the presentation layer needs for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Requested symbol, uppercased.
    pub symbol: String,
    /// Filer display name, when the facts payload carried one.
    pub company_name: Option<String>,
    /// Which source produced the quarterly series.
    pub source: EpsSource,
    /// Split-adjusted quarterly EPS series.
    pub quarterly_eps: Vec<EpsPoint>,
    /// Daily closing prices.
    pub prices: Vec<DailyClose>,
    /// Trailing-twelve-month EPS series.
    pub ttm: Vec<TtmPoint>,
    /// Aligned price/EPS/P-E series.
    pub aligned: Vec<AlignedPoint>,
    /// Chart display bounds for the P/E series.
    pub bounds: Option<DisplayBounds>,
    /// Soft warnings attached to the result.
    pub warnings: Vec<Warning>,
}

/// Build a pipeline fact bundle from a parsed company-facts payload.
///
/// Only the fixed tag set is consulted: diluted EPS and net income from
/// us-gaap, and the two shares-outstanding namespaces (entity-level dei
/// first, statement-level us-gaap as the alternate).
pub fn bundle_from_facts(facts: &CompanyFactsResponse) -> FactBundle {
    FactBundle {
        diluted_eps: to_raw_facts(&facts.reported_values(edgar::TAXONOMY_US_GAAP, edgar::TAG_DILUTED_EPS)),
        net_income: to_raw_facts(&facts.reported_values(edgar::TAXONOMY_US_GAAP, edgar::TAG_NET_INCOME)),
        shares_entity: to_raw_facts(&facts.reported_values(edgar::TAXONOMY_DEI, edgar::TAG_SHARES_ENTITY)),
        shares_statement: to_raw_facts(
            &facts.reported_values(edgar::TAXONOMY_US_GAAP, edgar::TAG_SHARES_COMMON),
        ),
    }
}

fn to_raw_facts(values: &[ReportedValue]) -> Vec<RawFact> {
    values
        .iter()
        .map(|v| RawFact {
            start: v.start,
            end: v.end,
            filed: v.filed,
            value: v.value,
        })
        .collect()
}

/// Flag a quarterly series whose most recent period end is older than the
/// staleness threshold.
fn staleness_warning(
    eps: &[EpsPoint],
    as_of: NaiveDate,
    stale_after_days: i64,
) -> Option<Warning> {
    let last_period_end = eps.iter().map(|p| p.date).max()?;
    ((as_of - last_period_end).num_days() > stale_after_days)
        .then_some(Warning::StaleData { last_period_end })
}

/// Reconciliation service owning the data collaborators.
#[derive(Debug)]
pub struct EpsService {
    edgar: EdgarClient,
    quotes: YahooQuoteProvider,
    earnings: YahooEarningsProvider,
    cache: Option<SqliteCache>,
    config: ServiceConfig,
}

impl EpsService {
    /// Create a service without a cache.
    ///
    /// # Errors
    /// Returns [`Error::Init`] when a provider's HTTP client cannot be
    /// constructed.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Ok(Self {
            edgar: EdgarClient::new().map_err(Error::Init)?,
            quotes: YahooQuoteProvider::new().map_err(Error::Init)?,
            earnings: YahooEarningsProvider::new().map_err(Error::Init)?,
            cache: None,
            config,
        })
    }

    /// Create a service backed by a cache-aside store.
    ///
    /// # Errors
    /// Returns [`Error::Init`] when a provider's HTTP client cannot be
    /// constructed.
    pub fn with_cache(config: ServiceConfig, cache: SqliteCache) -> Result<Self> {
        let mut service = Self::new(config)?;
        service.cache = Some(cache);
        Ok(service)
    }

    /// Reconcile the split-adjusted quarterly EPS series for a ticker from
    /// regulatory company facts.
    ///
    /// # Errors
    /// Returns [`Error::DataUnavailable`] when the provider fails or a
    /// required fact source is entirely absent.
    pub async fn reconcile_eps(&self, symbol: &str) -> Result<Vec<EpsPoint>> {
        let symbol = symbol.to_uppercase();
        let facts = self
            .fetch_company_facts(&symbol)
            .await
            .map_err(|e| Error::data_unavailable(&symbol, &e))?;
        reconcile(&bundle_from_facts(&facts)).map_err(|e| Error::DataUnavailable {
            symbol,
            reason: e.to_string(),
        })
    }

    /// Fetch the daily close series covering the configured history span.
    ///
    /// # Errors
    /// Returns [`Error::DataUnavailable`] when no price history exists.
    pub async fn fetch_price_history(&self, symbol: &str) -> Result<Vec<DailyClose>> {
        let symbol = symbol.to_uppercase();
        let end = Utc::now();
        let start = end - Duration::days(i64::from(self.config.years_of_history) * 365);
        let quotes = self
            .cached_quotes(&symbol, start, end)
            .await
            .map_err(|e| Error::data_unavailable(&symbol, &e))?;
        Ok(quotes
            .into_iter()
            .map(|q| DailyClose {
                date: q.date,
                close: q.close,
            })
            .collect())
    }

    /// Run the full flow for one ticker: price history, reconciliation
    /// with the reported-earnings fallback, TTM aggregation, alignment,
    /// display bounds, and staleness warning.
    ///
    /// # Errors
    /// Returns [`Error::DataUnavailable`] when price history is missing or
    /// both earnings paths come up empty.
    pub async fn analyze(&self, symbol: &str) -> Result<Analysis> {
        let symbol = symbol.to_uppercase();
        let prices = self.fetch_price_history(&symbol).await?;

        let mut company_name = None;
        let mut quarterly_eps = Vec::new();
        let mut source = EpsSource::RegulatoryFacts;

        if let Ok(facts) = self.fetch_company_facts(&symbol).await {
            company_name = Some(facts.entity_name.clone());
            quarterly_eps = reconcile(&bundle_from_facts(&facts)).unwrap_or_default();
        }

        if quarterly_eps.is_empty() {
            quarterly_eps = self
                .fallback_eps(&symbol)
                .await
                .map_err(|e| Error::data_unavailable(&symbol, &e))?;
            source = EpsSource::ReportedEarnings;
        }

        let view = compute_ttm_and_pe(&prices, &quarterly_eps);
        let warnings = staleness_warning(
            &quarterly_eps,
            Utc::now().date_naive(),
            self.config.stale_after_days,
        )
        .into_iter()
        .collect();

        Ok(Analysis {
            symbol,
            company_name,
            source,
            quarterly_eps,
            prices,
            ttm: view.ttm,
            aligned: view.aligned,
            bounds: view.bounds,
            warnings,
        })
    }

    /// Cache statistics, when a cache is attached.
    pub fn cache_stats(&self) -> Option<quarry_data::cache::CacheStats> {
        self.cache.as_ref().and_then(|c| c.get_stats().ok())
    }

    async fn lookup_cik(&self, symbol: &str) -> std::result::Result<String, DataError> {
        if let Some(cache) = &self.cache
            && !self.config.force_refresh
            && let Ok(Some(cik)) = cache.get_cik(symbol)
        {
            return Ok(cik);
        }

        let cik = self.edgar.get_company_cik(symbol).await?;
        if let Some(cache) = &self.cache {
            cache.put_cik(symbol, &cik, None).ok();
        }
        Ok(cik)
    }

    async fn fetch_company_facts(
        &self,
        symbol: &str,
    ) -> std::result::Result<CompanyFactsResponse, DataError> {
        if let Some(cache) = &self.cache
            && !self.config.force_refresh
            && let Ok(Some(payload)) =
                cache.get_company_facts(symbol, self.config.cache_max_age_days)
        {
            return CompanyFactsResponse::from_json(&payload);
        }

        let cik = self.lookup_cik(symbol).await?;
        let payload = self.edgar.get_company_facts_json(&cik).await?;
        let facts = CompanyFactsResponse::from_json(&payload)?;
        if let Some(cache) = &self.cache {
            cache.put_company_facts(symbol, &payload).ok();
            cache.put_cik(symbol, &cik, Some(&facts.entity_name)).ok();
        }
        Ok(facts)
    }

    async fn cached_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> std::result::Result<Vec<DailyQuote>, DataError> {
        let (start_date, end_date) = (start.date_naive(), end.date_naive());
        if let Some(cache) = &self.cache
            && !self.config.force_refresh
            && cache.has_quotes(symbol, start_date, end_date).unwrap_or(false)
            && let Ok(quotes) = cache.get_quotes(symbol, start_date, end_date)
        {
            return Ok(quotes);
        }

        let quotes = self.quotes.fetch_daily_closes(symbol, start, end).await?;
        if let Some(cache) = &self.cache {
            cache.put_quotes(symbol, &quotes).ok();
        }
        Ok(quotes)
    }

    /// The secondary provider's pre-reported EPS series, same-day
    /// duplicates collapsed by mean before it enters the TTM stage.
    async fn fallback_eps(&self, symbol: &str) -> std::result::Result<Vec<EpsPoint>, DataError> {
        let reported = if let Some(cache) = &self.cache
            && !self.config.force_refresh
            && let Ok(Some(cached)) =
                cache.get_reported_earnings(symbol, self.config.cache_max_age_days)
        {
            cached
        } else {
            let fetched = self
                .earnings
                .fetch_reported_eps(symbol, self.config.earnings_limit)
                .await?;
            if let Some(cache) = &self.cache {
                cache.put_reported_earnings(symbol, &fetched).ok();
            }
            fetched
        };

        let points: Vec<EpsPoint> = reported
            .iter()
            .map(|e| EpsPoint {
                date: e.date,
                value: e.reported_eps,
            })
            .collect();
        Ok(ttm::mean_by_date(&points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const PAYLOAD: &str = r#"{
        "cik": 320193,
        "entityName": "Apple Inc.",
        "facts": {
            "dei": {
                "EntityCommonStockSharesOutstanding": {
                    "units": {"shares": [
                        {"end": "2023-10-20", "val": 15552752000, "filed": "2023-11-03"}
                    ]}
                }
            },
            "us-gaap": {
                "EarningsPerShareDiluted": {
                    "units": {"USD/shares": [
                        {"start": "2023-07-02", "end": "2023-09-30", "val": 1.46, "filed": "2023-11-03"}
                    ]}
                },
                "NetIncomeLoss": {
                    "units": {"USD": [
                        {"start": "2023-07-02", "end": "2023-09-30", "val": 22956000000, "filed": "2023-11-03"}
                    ]}
                }
            }
        }
    }"#;

    #[test]
    fn test_bundle_from_facts_maps_every_tag() {
        let facts = CompanyFactsResponse::from_json(PAYLOAD).unwrap();
        let bundle = bundle_from_facts(&facts);
        assert_eq!(bundle.diluted_eps.len(), 1);
        assert_eq!(bundle.net_income.len(), 1);
        assert_eq!(bundle.shares_entity.len(), 1);
        assert!(bundle.shares_statement.is_empty());

        assert_eq!(bundle.diluted_eps[0].end, date(2023, 9, 30));
        assert_eq!(bundle.diluted_eps[0].filed, date(2023, 11, 3));
        assert_eq!(bundle.diluted_eps[0].start, Some(date(2023, 7, 2)));
    }

    #[test]
    fn test_reconcile_runs_on_mapped_bundle() {
        let facts = CompanyFactsResponse::from_json(PAYLOAD).unwrap();
        let points = reconcile(&bundle_from_facts(&facts)).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, date(2023, 9, 30));
    }

    #[test]
    fn test_staleness_warning_thresholds() {
        let eps = vec![EpsPoint {
            date: date(2023, 9, 30),
            value: 1.0,
        }];

        // 240 days after the period end is still fresh
        assert_eq!(staleness_warning(&eps, date(2024, 5, 27), 240), None);
        // one more day crosses the threshold
        assert_eq!(
            staleness_warning(&eps, date(2024, 5, 28), 240),
            Some(Warning::StaleData {
                last_period_end: date(2023, 9, 30)
            })
        );
        // an empty series has nothing to be stale about
        assert_eq!(staleness_warning(&[], date(2024, 5, 28), 240), None);
    }

    #[test]
    fn test_compute_ttm_and_pe_composition() {
        let eps = vec![
            EpsPoint {
                date: date(2023, 3, 31),
                value: 0.50,
            },
            EpsPoint {
                date: date(2023, 6, 30),
                value: 0.55,
            },
        ];
        let prices = vec![
            DailyClose {
                date: date(2023, 3, 31),
                close: 10.0,
            },
            DailyClose {
                date: date(2023, 7, 3),
                close: 42.0,
            },
        ];

        let view = compute_ttm_and_pe(&prices, &eps);
        assert_eq!(view.ttm.len(), 2);
        assert_eq!(view.aligned.len(), 2);
        assert_relative_eq!(view.aligned[0].pe, 20.0);
        assert_relative_eq!(view.aligned[1].pe, 40.0);
        let bounds = view.bounds.unwrap();
        assert_relative_eq!(bounds.lower, 0.0);
    }
}
