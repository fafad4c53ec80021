use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::cache::{CacheKey, QuoteCache};
use crate::quote::decoder::{self, DecodeError, MissingData};
use crate::quote::provider::{FetchError, QuoteFetcher};
use crate::report::{self, ReportMarkup};
use crate::trace::SessionTrace;

pub const WRONG_COMMAND_MESSAGE: &str =
    "You have entered wrong command. Please enter command like BTC-USD.";

const COMMAND_SEPARATOR: char = '-';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub symbol: String,
    pub convert: String,
}

impl Command {
    /// Parses `SYMBOL-CONVERT`, case-insensitively. Exactly one separator and
    /// two non-empty tokens are required.
    pub fn parse(raw: &str) -> LookupResult<Self> {
        let upper = raw.trim().to_uppercase();
        let mut tokens = upper.split(COMMAND_SEPARATOR);

        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(symbol), Some(convert), None) if !symbol.is_empty() && !convert.is_empty() => {
                Ok(Self {
                    symbol: symbol.to_string(),
                    convert: convert.to_string(),
                })
            }
            _ => Err(LookupError::InvalidCommand {
                input: raw.to_string(),
            }),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.symbol, &self.convert)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    InvalidCommand { input: String },
    UpstreamUnavailable(FetchError),
    MalformedResponse(DecodeError),
}

impl LookupError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCommand { .. } => "invalid_command",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCommand { input } => write!(f, "invalid command '{input}'"),
            Self::UpstreamUnavailable(err) => write!(f, "upstream unavailable: {err}"),
            Self::MalformedResponse(err) => write!(f, "malformed response: {err}"),
        }
    }
}

impl Error for LookupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidCommand { .. } => None,
            Self::UpstreamUnavailable(err) => Some(err),
            Self::MalformedResponse(err) => Some(err),
        }
    }
}

pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Turns commands into quote reports: parse, cache check, fetch, decode, store, render.
pub struct LookupService<F> {
    fetcher: F,
    cache: QuoteCache,
    markup: ReportMarkup,
    trace: Option<SessionTrace>,
}

impl<F: QuoteFetcher> LookupService<F> {
    pub fn new(fetcher: F, cache: QuoteCache, markup: ReportMarkup) -> Self {
        Self {
            fetcher,
            cache,
            markup,
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: SessionTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    pub async fn lookup(&self, raw: &str) -> LookupResult<String> {
        let command = Command::parse(raw)?;
        let key = command.cache_key();

        let quote = match self.cache.get(&key) {
            Some(quote) => {
                self.trace(|t| t.log_cache_hit(key.as_str()));
                quote
            }
            None => {
                self.trace(|t| t.log_cache_miss(key.as_str()));
                let payload = self
                    .fetcher
                    .fetch(&command.symbol, &command.convert)
                    .await
                    .map_err(LookupError::UpstreamUnavailable)?;
                let decoded = decoder::decode(&payload, &command.symbol, &command.convert)
                    .map_err(LookupError::MalformedResponse)?;

                if let Some(missing) = decoded.missing {
                    let detail = match missing {
                        MissingData::Asset => format!("{} not in payload", command.symbol),
                        MissingData::Currency => {
                            format!("{} has no {} quote", command.symbol, command.convert)
                        }
                    };
                    self.trace(|t| t.log_decode_gap(&detail));
                }

                self.cache.put(key, decoded.quote.clone());
                decoded.quote
            }
        };

        Ok(report::render(&quote, &command.convert, self.markup))
    }

    /// Like [`Self::lookup`], but every failure becomes [`WRONG_COMMAND_MESSAGE`].
    pub async fn reply(&self, raw: &str) -> String {
        self.trace(|t| t.log_command(raw));
        let reply = match self.lookup(raw).await {
            Ok(report) => report,
            Err(err) => {
                self.trace(|t| t.log_lookup_error(err.kind(), &err.to_string()));
                WRONG_COMMAND_MESSAGE.to_string()
            }
        };
        self.trace(|t| t.log_reply(&reply));
        reply
    }

    fn trace(&self, f: impl FnOnce(&SessionTrace)) {
        if let Some(trace) = &self.trace {
            f(trace);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, LookupError, LookupService, WRONG_COMMAND_MESSAGE};
    use crate::cache::{CacheKey, QuoteCache};
    use crate::quote::provider::{FetchError, FetchResult, QuoteFetcher};
    use crate::report::ReportMarkup;
    use crate::trace::SessionTrace;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::tempdir;

    const BTC_USD: &str = r#"{
        "status": {"error_code": 0, "error_message": null},
        "data": {"BTC": {
            "name": "Bitcoin",
            "symbol": "BTC",
            "max_supply": 21000000,
            "circulating_supply": 19654321,
            "total_supply": 19654321,
            "quote": {"USD": {
                "price": 65000.12345678,
                "volume_24h": 1000.5,
                "percent_change_1h": 0.1,
                "percent_change_24h": -1.2,
                "market_cap": 5000.25,
                "last_updated": "2024-03-01T14:05:09Z"
            }}
        }}
    }"#;

    #[derive(Clone)]
    struct FakeFetcher {
        response: FetchResult<String>,
        calls: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl FakeFetcher {
        fn returning(response: FetchResult<String>) -> Self {
            Self {
                response,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    impl QuoteFetcher for FakeFetcher {
        async fn fetch(&self, symbol: &str, convert: &str) -> FetchResult<String> {
            self.calls
                .lock()
                .expect("calls lock")
                .push((symbol.to_string(), convert.to_string()));
            self.response.clone()
        }
    }

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl QuoteFetcher for CountingFetcher {
        async fn fetch(&self, _symbol: &str, _convert: &str) -> FetchResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(BTC_USD.to_string())
        }
    }

    fn service(fetcher: &FakeFetcher) -> LookupService<FakeFetcher> {
        LookupService::new(fetcher.clone(), QuoteCache::default(), ReportMarkup::Plain)
    }

    #[test]
    fn parse_uppercases_both_tokens() {
        assert_eq!(
            Command::parse("btc-usd").expect("parse"),
            Command {
                symbol: "BTC".to_string(),
                convert: "USD".to_string()
            }
        );
        assert_eq!(
            Command::parse("Eth-Usd").expect("parse"),
            Command::parse("ETH-USD").expect("parse")
        );
        assert_eq!(
            Command::parse("  doge-eur\n").expect("trimmed").symbol,
            "DOGE"
        );
    }

    #[test]
    fn parse_rejects_wrong_token_counts_and_empty_tokens() {
        for input in ["BTCUSD", "ethusd", "BTC-USD-EUR", "-USD", "BTC-", "-", "", "   "] {
            let err = Command::parse(input).expect_err(input);
            assert_eq!(
                err,
                LookupError::InvalidCommand {
                    input: input.to_string()
                }
            );
            assert_eq!(err.kind(), "invalid_command");
        }
    }

    #[test]
    fn cache_key_is_derived_from_command() {
        let command = Command::parse("btc-usd").expect("parse");
        assert_eq!(command.cache_key(), CacheKey::new("BTC", "USD"));
    }

    #[tokio::test]
    async fn lookup_fetches_decodes_and_renders_on_miss() {
        let fetcher = FakeFetcher::returning(Ok(BTC_USD.to_string()));
        let service = service(&fetcher);

        let report = service.lookup("BTC-USD").await.expect("report");

        assert!(report.starts_with("BTC - USD\n"));
        assert!(report.contains("Price: 65000.12345678 USD\n"));
        assert!(report.contains("Daily Change Percent: -1.20%\n"));
        assert_eq!(fetcher.calls(), vec![("BTC".to_string(), "USD".to_string())]);
        assert!(service.cache().get(&CacheKey::new("BTC", "USD")).is_some());
    }

    #[tokio::test]
    async fn lookup_treats_mixed_case_like_uppercase() {
        let fetcher = FakeFetcher::returning(Ok(BTC_USD.to_string()));
        let service = service(&fetcher);

        let lower = service.lookup("btc-usd").await.expect("report");
        let upper = service.lookup("BTC-USD").await.expect("report");

        assert_eq!(lower, upper);
        assert_eq!(fetcher.calls().len(), 1, "second call served from cache");
    }

    #[tokio::test]
    async fn lookup_rejects_command_without_network_call() {
        let fetcher = FakeFetcher::returning(Ok(BTC_USD.to_string()));
        let service = service(&fetcher);

        let err = service.lookup("BTCUSD").await.expect_err("invalid");

        assert!(matches!(err, LookupError::InvalidCommand { .. }));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn lookup_serves_repeat_command_from_cache() {
        let fetcher = FakeFetcher::returning(Ok(BTC_USD.to_string()));
        let service = service(&fetcher);

        let first = service.lookup("BTC-USD").await.expect("first");
        let second = service.lookup("BTC-USD").await.expect("second");

        assert_eq!(first, second);
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_refetches_after_ttl() {
        let fetcher = FakeFetcher::returning(Ok(BTC_USD.to_string()));
        let service = service(&fetcher);

        service.lookup("BTC-USD").await.expect("first");
        tokio::time::advance(Duration::from_secs(31)).await;
        service.lookup("BTC-USD").await.expect("second");

        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn lookup_maps_fetch_failure_and_caches_nothing() {
        let fetcher =
            FakeFetcher::returning(Err(FetchError::Transport("connection refused".to_string())));
        let service = service(&fetcher);

        let err = service.lookup("BTC-USD").await.expect_err("upstream down");

        assert_eq!(
            err,
            LookupError::UpstreamUnavailable(FetchError::Transport(
                "connection refused".to_string()
            ))
        );
        assert_eq!(err.kind(), "upstream_unavailable");
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn lookup_maps_decode_failure_and_caches_nothing() {
        let fetcher = FakeFetcher::returning(Ok("not json".to_string()));
        let service = service(&fetcher);

        let err = service.lookup("BTC-USD").await.expect_err("malformed");

        assert!(matches!(err, LookupError::MalformedResponse(_)));
        assert_eq!(err.kind(), "malformed_response");
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn lookup_renders_zero_report_for_missing_currency() {
        let fetcher = FakeFetcher::returning(Ok(BTC_USD.to_string()));
        let service = service(&fetcher);

        let report = service.lookup("BTC-EUR").await.expect("zeroed report");

        assert!(report.contains("Max Supply: 21000000 BTC"));
        assert!(report.contains("Price: 0.00000000 EUR"));
        assert!(report.contains("Data Last Updated: 00:00:00"));
    }

    #[tokio::test]
    async fn reply_collapses_every_error_to_one_message() {
        let invalid = service(&FakeFetcher::returning(Ok(BTC_USD.to_string())));
        let down = service(&FakeFetcher::returning(Err(FetchError::HttpStatus {
            status: 500,
            body: "down".to_string(),
        })));
        let garbage = service(&FakeFetcher::returning(Ok("{\"data\": 7}".to_string())));

        assert_eq!(invalid.reply("BTC").await, WRONG_COMMAND_MESSAGE);
        assert_eq!(down.reply("BTC-USD").await, WRONG_COMMAND_MESSAGE);
        assert_eq!(garbage.reply("BTC-USD").await, WRONG_COMMAND_MESSAGE);
    }

    #[tokio::test]
    async fn reply_renders_html_by_default_markup() {
        let fetcher = FakeFetcher::returning(Ok(BTC_USD.to_string()));
        let service =
            LookupService::new(fetcher.clone(), QuoteCache::default(), ReportMarkup::Html);

        let reply = service.reply("btc-usd").await;
        assert!(reply.starts_with("<b>BTC - USD</b>\n"));
        assert!(reply.contains("<b>Price: </b><i>65000.12345678</i> USD"));
    }

    #[tokio::test]
    async fn reply_records_each_step_in_trace() {
        let dir = tempdir().expect("tempdir");
        let trace = SessionTrace::create_in_temp_dir("lookup", dir.path()).expect("trace");
        let fetcher = FakeFetcher::returning(Ok(BTC_USD.to_string()));
        let service = service(&fetcher).with_trace(trace.clone());

        service.reply("BTC-USD").await;
        service.reply("BTC-USD").await;
        service.reply("BTC-EUR").await;
        service.reply("nonsense").await;

        let content = fs::read_to_string(trace.file_path()).expect("read trace");
        assert!(content.contains("[cmd.in     ] BTC-USD"));
        assert!(content.contains("[cache.miss ] BTC|USD"));
        assert!(content.contains("[cache.hit  ] BTC|USD"));
        assert!(content.contains("[decode.gap ] BTC has no EUR quote"));
        assert!(content.contains("[lookup.err ] invalid_command: invalid command 'nonsense'"));
        assert!(content.contains(&format!("[cmd.out    ] {WRONG_COMMAND_MESSAGE}")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_lookups_share_one_cache() {
        let service = Arc::new(LookupService::new(
            CountingFetcher {
                calls: AtomicUsize::new(0),
            },
            QuoteCache::default(),
            ReportMarkup::Plain,
        ));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.lookup("BTC-USD").await })
            })
            .collect();

        for handle in handles {
            let report = handle.await.expect("join").expect("report");
            assert!(report.contains("Price: 65000.12345678 USD"));
        }

        let calls = service.fetcher.calls.load(Ordering::SeqCst);
        assert!((1..=16).contains(&calls), "calls = {calls}");
        assert!(service.lookup("BTC-USD").await.is_ok());
        assert_eq!(service.fetcher.calls.load(Ordering::SeqCst), calls);
    }
}
