use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vehicle_scout::{Aggregator, ScoutConfig, SearchParams, ValuationService};

/// Value a vehicle from live UK marketplace listings
#[derive(Debug, Parser)]
#[command(name = "vehicle-scout", version)]
struct Cli {
    #[arg(long)]
    make: String,

    #[arg(long)]
    model: String,

    #[arg(long)]
    year: u16,

    /// Current mileage of the vehicle
    #[arg(long, default_value_t = 0)]
    mileage: u32,

    /// TOML config file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the JSON report
    #[arg(long, default_value = "valuation.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = ScoutConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load config")?;
    let aggregator = Aggregator::from_config(&config).context("Failed to build scrapers")?;
    info!("Registered sources: {:?}", aggregator.sources());

    let service = ValuationService::new(aggregator);
    let params = SearchParams::new(cli.make, cli.model, cli.year, cli.mileage);
    let report = service.report(&params).await;

    println!(
        "\n{} {} {}: low £{}, average £{}, high £{} ({} listings)\n",
        report.year,
        report.make,
        report.model,
        report.summary.low,
        report.summary.average,
        report.summary.high,
        report.listings.len()
    );

    for (i, listing) in report.listings.iter().enumerate() {
        println!("{}. {} (£{})", i + 1, listing.title, listing.price);
        match listing.known_mileage() {
            Some(miles) => println!("   {} miles, {}", miles, listing.location),
            None => println!("   mileage unknown, {}", listing.location),
        }
        println!("   {} via {}", listing.seller, listing.source);
        println!("   URL: {}", listing.link);
        println!();
    }

    let json = serde_json::to_string_pretty(&report)?;
    tokio::fs::write(&cli.output, json)
        .await
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    info!("Saved valuation report to {}", cli.output.display());

    Ok(())
}
