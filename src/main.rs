use anyhow::Result;
use clap::Parser;
use std::fmt::Display;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fx_monthly::api::{ExchangeRateHostClient, FrankfurterClient};
use fx_monthly::database::{DryRunStore, MonthlyRateStore, PgRateStore, SqliteRateStore};
use fx_monthly::loader::MonthlyFxLoader;
use fx_monthly::models::Config;

/// Load monthly average FX rates (currency -> EUR) into the warehouse.
#[derive(Parser, Debug)]
#[command(name = "fx-monthly-load")]
struct Args {
    /// First year to load (overrides FX_START_YEAR)
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year to load, inclusive (overrides FX_END_YEAR)
    #[arg(long)]
    end_year: Option<i32>,

    /// Comma-separated country codes (overrides FX_COUNTRIES)
    #[arg(long)]
    countries: Option<String>,

    /// Fetch and aggregate, but only log the rows instead of writing them
    #[arg(long)]
    dry_run: bool,

    /// Create the target schema and table before loading (Postgres only)
    #[arg(long)]
    create_table: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fx_monthly=info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let args = Args::parse();

    let config = match Config::from_env()
        .and_then(|c| c.with_overrides(args.start_year, args.end_year, args.countries.as_deref()))
    {
        Ok(config) => config,
        Err(e) => {
            return Ok(startup_failure("Configuration", &e));
        }
    };

    let (primary, secondary) = match build_clients(&config) {
        Ok(clients) => clients,
        Err(e) => {
            return Ok(startup_failure("HTTP Client", &e));
        }
    };

    let store: Box<dyn MonthlyRateStore> = match open_store(&config, &args).await {
        Ok(store) => store,
        Err(e) => {
            return Ok(startup_failure("Database", &e));
        }
    };

    let loader = MonthlyFxLoader::new(
        Box::new(primary),
        Box::new(secondary),
        store,
        config.base_currency.clone(),
        config.requested_currencies(),
    );

    let result = loader.run(config.start_year, config.end_year).await;
    loader.close().await;

    println!();
    println!("{}", result);

    if result.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Exit status for anything that fails before the first month is processed.
const STARTUP_FAILURE: u8 = 2;

fn startup_failure(stage: &str, e: &dyn Display) -> ExitCode {
    error!("{} failed during startup: {}", stage, e);
    eprintln!("❌ {} Error: {}", stage, e);
    ExitCode::from(STARTUP_FAILURE)
}

fn build_clients(config: &Config) -> Result<(FrankfurterClient, ExchangeRateHostClient)> {
    let primary = FrankfurterClient::new(&config.primary)?;
    let secondary = ExchangeRateHostClient::new(&config.secondary, config.base_currency.clone())?;
    Ok((primary, secondary))
}

async fn open_store(config: &Config, args: &Args) -> Result<Box<dyn MonthlyRateStore>> {
    if args.dry_run {
        info!("🧪 Dry run: rows will be logged, not written");
        return Ok(Box::new(DryRunStore));
    }

    if config.database.is_sqlite() {
        let url = config.database.url.as_deref().unwrap_or("sqlite::memory:");
        return Ok(Box::new(SqliteRateStore::connect(url).await?));
    }

    let store = PgRateStore::connect(&config.database, &config.table_name).await?;
    if args.create_table {
        store.ensure_table().await?;
    }
    Ok(Box::new(store))
}
