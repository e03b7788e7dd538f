//! SQLite caching layer for provider data.

use crate::error::{DataError, Result};
use crate::yahoo::earnings::ReportedEarnings;
use crate::yahoo::quotes::DailyQuote;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

/// SQLite cache for provider responses.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        // Company CIK mappings
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS company_ciks (
                symbol TEXT PRIMARY KEY,
                cik TEXT NOT NULL,
                company_name TEXT,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Raw company-facts payloads, cached verbatim
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS company_facts (
                symbol TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                cached_at TEXT NOT NULL
            )",
            [],
        )?;

        // Daily closing prices
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS quotes (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_quotes_symbol_date ON quotes(symbol, date)",
            [],
        )?;

        // Reported earnings (fallback source)
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS reported_earnings (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                reported_eps REAL NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        Ok(())
    }

    /// Get CIK for a symbol.
    pub fn get_cik(&self, symbol: &str) -> Result<Option<String>> {
        let result = self
            .conn
            .query_row(
                "SELECT cik FROM company_ciks WHERE symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )
            .optional()?;

        Ok(result)
    }

    /// Store CIK mapping for a symbol.
    pub fn put_cik(&self, symbol: &str, cik: &str, company_name: Option<&str>) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT OR REPLACE INTO company_ciks (symbol, cik, company_name, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![symbol, cik, company_name, updated_at],
        )?;

        Ok(())
    }

    /// Get a cached company-facts payload no older than `max_age_days`.
    pub fn get_company_facts(&self, symbol: &str, max_age_days: i64) -> Result<Option<String>> {
        let cutoff = (Utc::now() - chrono::Duration::days(max_age_days)).to_rfc3339();

        let result = self
            .conn
            .query_row(
                "SELECT payload FROM company_facts
                 WHERE symbol = ?1 AND cached_at >= ?2",
                params![symbol, cutoff],
                |row| row.get(0),
            )
            .optional()?;

        Ok(result)
    }

    /// Store a raw company-facts payload.
    pub fn put_company_facts(&self, symbol: &str, payload: &str) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT OR REPLACE INTO company_facts (symbol, payload, cached_at)
             VALUES (?1, ?2, ?3)",
            params![symbol, payload, cached_at],
        )?;

        Ok(())
    }

    /// Check if quotes are cached for a symbol and date range.
    pub fn has_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3",
            params![symbol, start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;

        // Check if we have data for most of the expected trading days
        // Roughly 252 trading days per year, so ~21 per month
        let days = (end - start).num_days();
        let expected_count = (days as f64 * 0.7) as i64; // 70% of calendar days

        Ok(count >= expected_count)
    }

    /// Get cached quotes for a symbol and date range.
    pub fn get_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyQuote>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, close FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;

        let rows = stmt.query_map(
            params![symbol, start.to_string(), end.to_string()],
            |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            },
        )?;

        let mut quotes = Vec::new();
        for row in rows {
            let (date, close) = row?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| DataError::Parse(format!("Invalid cached date: {}", e)))?;
            quotes.push(DailyQuote { date, close });
        }

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No cached data found".to_string(),
            });
        }

        Ok(quotes)
    }

    /// Store quotes in the cache.
    pub fn put_quotes(&self, symbol: &str, quotes: &[DailyQuote]) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        for quote in quotes {
            tx.execute(
                "INSERT OR REPLACE INTO quotes (symbol, date, close, cached_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![symbol, quote.date.to_string(), quote.close, cached_at],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    /// Get cached reported earnings no older than `max_age_days`.
    pub fn get_reported_earnings(
        &self,
        symbol: &str,
        max_age_days: i64,
    ) -> Result<Option<Vec<ReportedEarnings>>> {
        let cutoff = (Utc::now() - chrono::Duration::days(max_age_days)).to_rfc3339();

        let mut stmt = self.conn.prepare(
            "SELECT date, reported_eps FROM reported_earnings
             WHERE symbol = ?1 AND cached_at >= ?2
             ORDER BY date ASC",
        )?;

        let rows = stmt.query_map(params![symbol, cutoff], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut earnings = Vec::new();
        for row in rows {
            let (date, reported_eps) = row?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| DataError::Parse(format!("Invalid cached date: {}", e)))?;
            earnings.push(ReportedEarnings { date, reported_eps });
        }

        Ok(if earnings.is_empty() {
            None
        } else {
            Some(earnings)
        })
    }

    /// Store reported earnings in the cache.
    pub fn put_reported_earnings(
        &self,
        symbol: &str,
        earnings: &[ReportedEarnings],
    ) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        for entry in earnings {
            tx.execute(
                "INSERT OR REPLACE INTO reported_earnings
                 (symbol, date, reported_eps, cached_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    symbol,
                    entry.date.to_string(),
                    entry.reported_eps,
                    cached_at
                ],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let quote_rows: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;
        let facts_entries: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM company_facts", [], |row| row.get(0))?;
        let earnings_rows: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reported_earnings",
            [],
            |row| row.get(0),
        )?;
        let cik_mappings: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM company_ciks", [], |row| row.get(0))?;

        Ok(CacheStats {
            quote_rows,
            facts_entries,
            earnings_rows,
            cik_mappings,
        })
    }

    /// Clear all cached data.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM quotes", [])?;
        self.conn.execute("DELETE FROM company_facts", [])?;
        self.conn.execute("DELETE FROM reported_earnings", [])?;
        self.conn.execute("DELETE FROM company_ciks", [])?;
        Ok(())
    }

    /// Clear cached data for a specific symbol.
    pub fn clear_symbol(&self, symbol: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM quotes WHERE symbol = ?1", params![symbol])?;
        self.conn.execute(
            "DELETE FROM company_facts WHERE symbol = ?1",
            params![symbol],
        )?;
        self.conn.execute(
            "DELETE FROM reported_earnings WHERE symbol = ?1",
            params![symbol],
        )?;
        self.conn.execute(
            "DELETE FROM company_ciks WHERE symbol = ?1",
            params![symbol],
        )?;
        Ok(())
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached quote rows.
    pub quote_rows: i64,
    /// Number of cached company-facts payloads.
    pub facts_entries: i64,
    /// Number of cached reported-earnings rows.
    pub earnings_rows: i64,
    /// Number of cached CIK mappings.
    pub cik_mappings: i64,
}
