use anyhow::{Context, Result};
use ashvattha::account::AccountClient;
use ashvattha::api::{ExchangeAdapter, HyperliquidClient};
use ashvattha::config::AppConfig;
use ashvattha::llm::DeepSeekClient;
use ashvattha::market::{fetch_all_market_data, MarketDataClient};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_QUERY: &str =
    "What is your analysis and recommendations for my portfolio - provide recommendations for all 6 assets?";

/// Snapshot a Hyperliquid account and markets, then ask DeepSeek for advice
#[derive(Parser, Debug)]
#[command(name = "ashvattha", version, about)]
struct Args {
    /// TOML settings file (defaults to ./ashvattha.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated unified symbols, e.g. BTC/USDC:USDC,ETH/USDC:USDC
    #[arg(short, long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    /// Question sent along with the reports
    #[arg(short, long, default_value = DEFAULT_QUERY)]
    query: String,

    /// Print the account and market reports without calling the LLM
    #[arg(long)]
    dry_run: bool,

    /// Maximum market snapshots built at once
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    let symbols = args.symbols.clone().unwrap_or_else(|| config.symbols.clone());
    let concurrency = args.concurrency.unwrap_or(config.max_concurrent_fetches);
    tracing::info!(symbols = ?symbols, concurrency, "ashvattha starting");

    let exchange: Arc<dyn ExchangeAdapter> = Arc::new(
        HyperliquidClient::with_base_url(&config.hyperliquid_url, &config.wallet_address)
            .context("failed to create Hyperliquid client")?,
    );

    let account = AccountClient::new(exchange.clone())
        .with_quote_currency(&config.quote_currency)
        .get_account_info()
        .await
        .context("failed to build account snapshot")?;

    let markets = fetch_all_market_data(&MarketDataClient::new(exchange), &symbols, concurrency)
        .await
        .context("failed to build market snapshots")?;

    let account_report = account.format();

    if args.dry_run {
        print!("{}", account_report);
        for market in &markets {
            print!("{}", market.format());
        }
        return Ok(());
    }

    let advisor = DeepSeekClient::new(config.deepseek_api_key()?)
        .with_base_url(&config.deepseek_url)
        .with_model(&config.deepseek_model)
        .with_timeout(Duration::from_secs(config.llm_timeout_secs));

    let advice = advisor
        .advise(&args.query, &account_report, &markets)
        .await
        .context("failed to get recommendations from DeepSeek")?;

    println!("\n=== DeepSeek Analysis ===");
    println!(
        "{}",
        serde_json::to_string_pretty(&advice).context("failed to render recommendations")?
    );
    println!("\nTokens used: {}", advice.tokens_used);

    Ok(())
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ashvattha=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
