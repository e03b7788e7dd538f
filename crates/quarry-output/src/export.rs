//! Export functionality for aligned chart data.
//!
//! This module serializes the aligned price/EPS/P-E series and its display
//! bounds for the external rendering layer, in CSV and JSON formats.

use chrono::NaiveDate;
use quarry_series::align::{AlignedPoint, DisplayBounds};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// One aligned chart observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartRow {
    /// Trading date.
    pub date: NaiveDate,

    /// Closing price.
    pub close: f64,

    /// TTM EPS in force on that date.
    pub ttm_eps: f64,

    /// Price/earnings ratio.
    pub pe_ratio: f64,
}

impl From<&AlignedPoint> for ChartRow {
    fn from(point: &AlignedPoint) -> Self {
        Self {
            date: point.date,
            close: point.close,
            ttm_eps: point.ttm_eps,
            pe_ratio: point.pe,
        }
    }
}

/// The full chart payload: aligned rows plus the chosen display bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartExport {
    /// Ticker symbol.
    pub symbol: String,

    /// Filer display name, when known.
    pub company_name: Option<String>,

    /// Lower P/E axis bound.
    pub lower_bound: Option<f64>,

    /// Upper P/E axis bound.
    pub upper_bound: Option<f64>,

    /// Aligned observations, ascending by date.
    pub rows: Vec<ChartRow>,
}

impl ChartExport {
    /// Assemble a chart payload from an aligned series and its bounds.
    pub fn new(
        symbol: String,
        company_name: Option<String>,
        aligned: &[AlignedPoint],
        bounds: Option<DisplayBounds>,
    ) -> Self {
        Self {
            symbol,
            company_name,
            lower_bound: bounds.map(|b| b.lower),
            upper_bound: bounds.map(|b| b.upper),
            rows: aligned.iter().map(ChartRow::from).collect(),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for ChartExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();

                // Write header information as comments
                output.push_str(&format!("# Symbol: {}\n", self.symbol));
                if let Some(name) = &self.company_name {
                    output.push_str(&format!("# Company: {}\n", name));
                }
                if let (Some(lower), Some(upper)) = (self.lower_bound, self.upper_bound) {
                    output.push_str(&format!("# PE Axis: {} to {}\n", lower, upper));
                }

                let mut wtr = csv::Writer::from_writer(vec![]);
                for row in &self.rows {
                    wtr.serialize(row)?;
                }
                let data = String::from_utf8(wtr.into_inner().map_err(|e| e.into_error())?)
                    .map_err(|e| ExportError::InvalidFormat(e.to_string()))?;
                output.push_str(&data);
                Ok(output)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChartExport {
        let aligned = vec![
            AlignedPoint {
                date: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
                close: 150.0,
                ttm_eps: 6.0,
                pe: 25.0,
            },
            AlignedPoint {
                date: NaiveDate::from_ymd_opt(2023, 2, 2).unwrap(),
                close: 153.0,
                ttm_eps: 6.0,
                pe: 25.5,
            },
        ];
        ChartExport::new(
            "AAPL".to_string(),
            Some("Apple Inc.".to_string()),
            &aligned,
            Some(DisplayBounds {
                lower: 0.0,
                upper: 40.0,
            }),
        )
    }

    #[test]
    fn test_chart_export_csv() {
        let csv = sample().export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.contains("# Symbol: AAPL"));
        assert!(csv.contains("# Company: Apple Inc."));
        assert!(csv.contains("# PE Axis: 0 to 40"));
        assert!(csv.contains("2023-02-01"));
        assert!(csv.contains("25.5"));
    }

    #[test]
    fn test_chart_export_json_round_trip() {
        let json = sample().export_to_string(ExportFormat::Json).unwrap();
        let parsed: ChartExport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_pretty_json_is_multiline() {
        let pretty = sample().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(pretty.lines().count() > 1);
    }

    #[test]
    fn test_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }

    #[test]
    fn test_empty_series_exports_headers_only() {
        let export = ChartExport::new("MSFT".to_string(), None, &[], None);
        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.contains("# Symbol: MSFT"));
        assert!(!csv.contains("pe_ratio"));
    }
}
