use reqwest::header::HeaderName;

use super::provider::{FetchError, FetchResult, QuoteFetcher};
use crate::http::client::HttpClient;

const QUOTES_LATEST_PATH: &str = "/v1/cryptocurrency/quotes/latest";
const ACCEPTS_HEADER: HeaderName = HeaderName::from_static("accepts");
const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-cmc_pro_api_key");
const MAX_ERROR_BODY_CHARS: usize = 400;

#[derive(Debug, Clone)]
pub struct CoinMarketCapFetcher {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl CoinMarketCapFetcher {
    pub fn new(http: HttpClient, api_key: Option<String>, base_url: String) -> FetchResult<Self> {
        let api_key = api_key
            .filter(|v| !v.trim().is_empty())
            .ok_or(FetchError::MissingApiKey)?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{QUOTES_LATEST_PATH}", self.base_url)
    }
}

impl QuoteFetcher for CoinMarketCapFetcher {
    async fn fetch(&self, symbol: &str, convert: &str) -> FetchResult<String> {
        let resp = self
            .http
            .get(
                &self.endpoint(),
                &[("symbol", symbol), ("convert", convert)],
                &[
                    (ACCEPTS_HEADER, "application/json"),
                    (API_KEY_HEADER, self.api_key.as_str()),
                ],
            )
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        if !resp.is_success() {
            let body = resp.body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>();
            return Err(FetchError::HttpStatus {
                status: resp.status,
                body,
            });
        }

        Ok(resp.body)
    }
}
