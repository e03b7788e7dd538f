//! Quarry CLI binary.
//!
//! Command-line front end for the Quarry reconciliation service: the
//! stand-in for the dashboard layer that consumes the aligned series.

mod cache_path;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use quarry::service::{EpsService, ServiceConfig};
use quarry_output::{ChartExport, ExportFormat, Exporter};
use std::path::PathBuf;
use std::process;
use std::time::Duration as StdDuration;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Quarry: split-adjusted quarterly EPS and P/E history from SEC filings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile EPS and compute the P/E history for a ticker
    Analyze {
        /// Stock symbol
        symbol: String,

        /// Years of price history
        #[arg(long, default_value = "10")]
        years: u32,

        /// Disable caching (always fetch fresh data)
        #[arg(long)]
        no_cache: bool,

        /// Force refresh cached data
        #[arg(long)]
        refresh: bool,

        /// Write the aligned series to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format (csv, json, or pretty-json)
        #[arg(long, default_value = "csv")]
        format: String,
    },

    /// Inspect or clear the data cache
    Cache {
        /// Clear all cached data
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbol,
            years,
            no_cache,
            refresh,
            output,
            format,
        } => {
            analyze_symbol(&symbol, years, no_cache, refresh, output, &format).await?;
        }
        Commands::Cache { clear } => {
            cache_command(clear)?;
        }
    }

    Ok(())
}

async fn analyze_symbol(
    symbol: &str,
    years: u32,
    no_cache: bool,
    refresh: bool,
    output: Option<PathBuf>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let symbol = symbol.to_uppercase();
    let format = parse_format(format)?;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", format!("EPS / P-E RECONCILIATION: {}", symbol));
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("History: {} year(s)", years);

    let config = ServiceConfig {
        years_of_history: years,
        force_refresh: refresh,
        ..ServiceConfig::default()
    };

    let service = if no_cache {
        println!("Cache: Disabled");
        EpsService::new(config)?
    } else {
        println!("Cache: {}", cache_path::default_cache_path().display());
        if refresh {
            println!("  Mode: Force refresh (re-fetching all data)");
        }
        match cache_path::open_cache() {
            Ok(cache) => EpsService::with_cache(config, cache)?,
            Err(e) => {
                eprintln!("Warning: cache unavailable ({}), continuing without", e);
                EpsService::new(config)?
            }
        }
    };
    println!();

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(StdDuration::from_millis(100));
    pb.set_message(format!("Fetching and reconciling {}...", symbol));

    let analysis = match service.analyze(&symbol).await {
        Ok(a) => {
            pb.finish_with_message(format!(
                "Reconciled {} quarter(s) from {}",
                a.quarterly_eps.len(),
                a.source
            ));
            a
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    print_summary(&analysis);

    if let Some(path) = output {
        let export = ChartExport::new(
            analysis.symbol.clone(),
            analysis.company_name.clone(),
            &analysis.aligned,
            analysis.bounds,
        );
        export.export_to_file(&path, format)?;
        println!("\nWrote {} aligned row(s) to {}", export.rows.len(), path.display());
    }

    Ok(())
}

fn print_summary(analysis: &quarry::Analysis) {
    if let Some(name) = &analysis.company_name {
        println!("\nCompany: {}", name);
    }
    println!("EPS source: {}", analysis.source);

    if let (Some(first), Some(last)) =
        (analysis.quarterly_eps.first(), analysis.quarterly_eps.last())
    {
        println!(
            "Quarterly EPS: {} record(s), {} to {}",
            analysis.quarterly_eps.len(),
            first.date,
            last.date
        );
    }

    if let Some(ttm) = analysis.ttm.last() {
        println!("Latest TTM EPS: {:.2} (as of {})", ttm.value, ttm.date);
    }

    if let Some(point) = analysis.aligned.last() {
        println!(
            "Latest close: {:.2} on {} -> P/E {:.1}",
            point.close, point.date, point.pe
        );
    }
    println!("Aligned observations: {}", analysis.aligned.len());

    if let Some(bounds) = &analysis.bounds {
        println!("P/E display axis: {:.1} to {:.1}", bounds.lower, bounds.upper);
    }

    for warning in &analysis.warnings {
        println!("Warning: {}", warning);
    }
}

fn parse_format(format: &str) -> Result<ExportFormat, String> {
    match format {
        "csv" => Ok(ExportFormat::Csv),
        "json" => Ok(ExportFormat::Json),
        "pretty-json" => Ok(ExportFormat::PrettyJson),
        other => Err(format!(
            "Unknown format '{}' (expected csv, json, or pretty-json)",
            other
        )),
    }
}

fn cache_command(clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cache = cache_path::open_cache()?;

    if clear {
        cache.clear_all()?;
        println!("Cache cleared: {}", cache_path::default_cache_path().display());
        return Ok(());
    }

    let stats = cache.get_stats()?;
    println!("Cache: {}", cache_path::default_cache_path().display());
    println!("  Quote rows:        {}", stats.quote_rows);
    println!("  Facts payloads:    {}", stats.facts_entries);
    println!("  Earnings rows:     {}", stats.earnings_rows);
    println!("  CIK mappings:      {}", stats.cik_mappings);

    Ok(())
}
