pub mod cache;
pub mod cli;
pub mod config;
pub mod http;
pub mod lookup;
pub mod quote;
pub mod report;
pub mod trace;

use anyhow::{Result, anyhow};
use cache::QuoteCache;
use cli::{CliArgs, run_commands, run_repl};
use config::AppConfig;
use http::client::HttpClient;
use http::debug::HttpDebugConfig;
use lookup::LookupService;
use quote::coinmarketcap::CoinMarketCapFetcher;
use std::time::{SystemTime, UNIX_EPOCH};
use trace::SessionTrace;

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let session_id = generate_session_id();
    let trace = SessionTrace::create(&session_id)?;
    trace.log_config(&config.config_path);
    let http = HttpClient::new(
        reqwest::Client::new(),
        HttpDebugConfig::from_verbose(args.verbose),
    )
    .with_trace(trace.clone());
    let fetcher = CoinMarketCapFetcher::new(
        http,
        config.cmc_api_key.clone(),
        config.cmc_base_url.clone(),
    )
    .map_err(|err| anyhow!("Failed to start quote lookups: {err}"))?;

    let cache = QuoteCache::new(config.cache_ttl);
    let sweeper = cache.spawn_sweeper(config.cache_sweep_interval);
    let service = LookupService::new(fetcher, cache, config.report_markup).with_trace(trace);

    let result = if args.commands.is_empty() {
        run_repl(&service).await
    } else {
        run_commands(&service, &args.commands).await
    };

    sweeper.abort();
    result
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
