mod config;
mod error;
mod metric;
mod providers;

use anyhow::Context;
use clap::Parser;
use config::FitbitConfig;
use log::info;
use providers::{fitbit::FitbitCollector, Collector};

/// Print daily Fitbit activity metrics for the days before today.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Metric to collect.
    #[arg(long, default_value = "steps")]
    metric: String,

    /// Days to look back from yesterday.
    #[arg(long, default_value_t = 7)]
    days_back: u32,

    /// Print metrics as a JSON array instead of one per line.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    fitbit: FitbitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();

    let fitbit = FitbitCollector::new(&cli.fitbit)
        .await
        .context("Failed to initialize FitbitCollector")?;
    let metrics = fitbit
        .collect(&cli.metric, cli.days_back)
        .await
        .with_context(|| format!("Failed to collect {}", cli.metric))?;
    info!("{} metrics collected", metrics.len());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        for metric in &metrics {
            println!("{}", metric);
        }
    }
    Ok(())
}
