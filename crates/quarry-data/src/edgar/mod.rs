//! SEC EDGAR integration.
//!
//! Two pieces: a rate-limited API client ([`EdgarClient`]) for the ticker
//! lookup and company-facts endpoints, and a typed model of the
//! company-facts payload ([`CompanyFactsResponse`]) restricted to the
//! handful of XBRL tags Quarry consumes.
//!
//! # Example
//! ```no_run
//! use quarry_data::edgar::{self, EdgarClient};
//!
//! # async fn example() -> quarry_data::Result<()> {
//! let client = EdgarClient::new()?;
//! let cik = client.get_company_cik("AAPL").await?;
//! let payload = client.get_company_facts_json(&cik).await?;
//! let facts = edgar::CompanyFactsResponse::from_json(&payload)?;
//! let eps = facts.reported_values(edgar::TAXONOMY_US_GAAP, edgar::TAG_DILUTED_EPS);
//! println!("{} diluted EPS facts", eps.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod facts;

pub use client::EdgarClient;
pub use facts::{
    CompanyFactsResponse, ReportedValue, TAG_DILUTED_EPS, TAG_NET_INCOME, TAG_SHARES_COMMON,
    TAG_SHARES_ENTITY, TAXONOMY_DEI, TAXONOMY_US_GAAP,
};
