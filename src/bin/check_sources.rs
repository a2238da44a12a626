use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::Parser;
use tracing::{info, Level};

use fx_monthly::api::{ExchangeRateHostClient, FrankfurterClient};
use fx_monthly::merger::observed_currencies;
use fx_monthly::models::{Config, MonthKey};

/// Probe both rate providers for one month without touching the database.
#[derive(Parser, Debug)]
struct Args {
    /// Year to probe (defaults to last month)
    #[arg(long)]
    year: Option<i32>,

    /// Month to probe, 1-12 (defaults to last month)
    #[arg(long)]
    month: Option<u32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    info!("🧪 Testing FX provider connectivity");

    let args = Args::parse();
    let config = Config::from_env()?;

    let today = Utc::now().date_naive();
    let (default_year, default_month) = if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    };
    let month = MonthKey::new(args.year.unwrap_or(default_year), args.month.unwrap_or(default_month))?;

    let requested = config.requested_currencies();
    let names: Vec<&str> = requested.iter().map(|c| c.as_str()).collect();
    info!("🔍 Probing {} for {:?}", month, names);

    let primary = FrankfurterClient::new(&config.primary)?;
    match primary.try_supported_currencies().await {
        Ok(codes) => {
            let unsupported: Vec<&str> = requested
                .iter()
                .filter(|c| !codes.contains(*c))
                .map(|c| c.as_str())
                .collect();
            info!("✅ {} supports {} currencies; not supported: {:?}", config.primary.base_url, codes.len(), unsupported);
        }
        Err(e) => info!("❌ Supported-currency query failed: {}", e),
    }

    match primary.try_fetch_month(month).await {
        Ok(table) => {
            let observed = observed_currencies(&table);
            info!("✅ Primary: {} days, {} currencies", table.len(), observed.len());
        }
        Err(e) => info!("❌ Primary fetch failed: {}", e),
    }

    let secondary = ExchangeRateHostClient::new(&config.secondary, config.base_currency.clone())?;
    match secondary.try_fetch_month(month, &requested).await {
        Ok(table) => {
            let observed = observed_currencies(&table);
            let names: Vec<&str> = observed.iter().map(|c| c.as_str()).collect();
            info!("✅ Secondary: {} days, currencies {:?}", table.len(), names);
        }
        Err(e) => info!("❌ Secondary fetch failed: {}", e),
    }

    info!("🎉 Connectivity check completed");
    Ok(())
}
