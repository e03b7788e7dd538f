//! Quote data fetching from Yahoo Finance.

use crate::error::{DataError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;
use tokio::time::sleep;
use yahoo_finance_api as yahoo;

/// A single day's closing price (timezone-naive date).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyQuote {
    /// Trading date.
    pub date: NaiveDate,
    /// Closing price.
    pub close: f64,
}

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a new Yahoo Finance quote provider with default rate limiting (1 req/sec).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a new Yahoo Finance quote provider with custom rate limiting.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;
        Ok(Self {
            provider,
            rate_limit_delay,
        })
    }

    /// Fetch daily closing prices for a single symbol.
    ///
    /// # Arguments
    /// * `symbol` - The ticker symbol (e.g., "AAPL")
    /// * `start` - Start date for the data
    /// * `end` - End date for the data
    ///
    /// # Returns
    /// Closing prices ordered ascending by date, one entry per trading day.
    pub async fn fetch_daily_closes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DailyQuote>> {
        // Validate date range
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        // Validate symbol
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        // Convert chrono DateTime to time::OffsetDateTime
        let start_time = time::OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        // Fetch data from Yahoo Finance
        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let mut closes = Vec::with_capacity(quotes.len());
        for quote in &quotes {
            let secs = i64::try_from(quote.timestamp)
                .map_err(|e| DataError::TimeConversion(e.to_string()))?;
            let date = DateTime::<Utc>::from_timestamp(secs, 0)
                .ok_or_else(|| {
                    DataError::TimeConversion(format!("Invalid quote timestamp: {}", secs))
                })?
                .date_naive();
            closes.push(DailyQuote {
                date,
                close: quote.close,
            });
        }
        closes.sort_by_key(|q| q.date);

        // Apply rate limiting
        sleep(self.rate_limit_delay).await;

        Ok(closes)
    }
}
