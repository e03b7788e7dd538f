//! SEC EDGAR API client with rate limiting.

use crate::error::{DataError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// SEC EDGAR API base URL
const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// Company tickers mapping file (hosted at www.sec.gov, not data.sec.gov)
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Default rate limit: 10 requests per second (SEC requirement)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// User agent for SEC EDGAR requests (SEC requires identifying information)
const USER_AGENT: &str = "Quarry/0.1 (contact@quarrydata.io)";

/// Company information from tickers endpoint
/// The SEC returns: {"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}, ...}
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct CompanyInfo {
    /// CIK as a number (SEC returns this as an integer despite the name)
    cik_str: u64,
    /// Ticker symbol
    ticker: String,
    /// Company name
    title: String,
}

/// Rate limiter to ensure we don't exceed SEC's rate limits
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// SEC EDGAR API client with rate limiting
pub struct EdgarClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    base_url: String,
}

impl std::fmt::Debug for EdgarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgarClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl EdgarClient {
    /// Create a new EDGAR client with default settings (10 req/sec)
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(DEFAULT_RATE_LIMIT)
    }

    /// Create a new EDGAR client with custom rate limit
    ///
    /// # Arguments
    /// * `min_interval` - Minimum duration between requests
    ///
    /// # Example
    /// ```no_run
    /// use quarry_data::edgar::EdgarClient;
    /// use std::time::Duration;
    ///
    /// # fn example() -> quarry_data::Result<()> {
    /// // 5 requests per second
    /// let client = EdgarClient::with_rate_limit(Duration::from_millis(200))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_rate_limit(min_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
            base_url: EDGAR_BASE_URL.to_string(),
        })
    }

    /// Look up a company's CIK number from its ticker symbol
    ///
    /// # Arguments
    /// * `ticker` - Stock ticker symbol (e.g., "AAPL")
    ///
    /// # Returns
    /// The company's CIK number as a zero-padded 10-digit string
    ///
    /// # Errors
    /// Returns `DataError::CikNotFound` if the ticker is not found
    pub async fn get_company_cik(&self, ticker: &str) -> Result<String> {
        if ticker.is_empty() {
            return Err(DataError::InvalidSymbol("Empty ticker".to_string()));
        }

        self.rate_limiter.lock().await.wait().await;

        let response = self
            .client
            .get(COMPANY_TICKERS_URL)
            .send()
            .await
            .map_err(DataError::Network)?;

        if !response.status().is_success() {
            return Err(DataError::EdgarApi(format!(
                "Failed to fetch company tickers: HTTP {}",
                response.status()
            )));
        }

        let companies: HashMap<String, CompanyInfo> =
            response.json().await.map_err(DataError::Network)?;

        companies
            .values()
            .find(|c| c.ticker.eq_ignore_ascii_case(ticker))
            .map(|c| format!("{:010}", c.cik_str))
            .ok_or_else(|| DataError::CikNotFound(ticker.to_string()))
    }

    /// Fetch the raw company-facts JSON payload for a CIK
    ///
    /// The Company Facts API returns every XBRL fact the filer has
    /// disclosed in a single response; the raw text is returned so callers
    /// can cache it verbatim before parsing.
    ///
    /// # Errors
    /// Returns `DataError::EdgarApi` on a non-success status
    pub async fn get_company_facts_json(&self, cik: &str) -> Result<String> {
        self.rate_limiter.lock().await.wait().await;

        let url = format!("{}/api/xbrl/companyfacts/CIK{}.json", self.base_url, cik);
        let response = self.client.get(&url).send().await.map_err(DataError::Network)?;

        if !response.status().is_success() {
            return Err(DataError::EdgarApi(format!(
                "Failed to fetch company facts for CIK {}: HTTP {}",
                cik,
                response.status()
            )));
        }

        response.text().await.map_err(DataError::Network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        assert!(EdgarClient::new().is_ok());
        assert!(EdgarClient::with_rate_limit(Duration::from_millis(500)).is_ok());
    }

    #[test]
    fn test_company_info_deserializes() {
        let json = r#"{"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}"#;
        let info: CompanyInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.cik_str, 320193);
        assert_eq!(format!("{:010}", info.cik_str), "0000320193");
    }

    #[tokio::test]
    async fn test_empty_ticker_is_rejected() {
        let client = EdgarClient::new().unwrap();
        let result = client.get_company_cik("").await;
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }
}
