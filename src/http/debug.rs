//! Redaction for HTTP debug output and the session trace.
//!
//! The CoinMarketCap credential travels either as the `X-CMC_PRO_API_KEY`
//! header or as the `CMC_PRO_API_KEY` query parameter. Quote payloads carry
//! no secrets, so bodies are only truncated.

use reqwest::Url;
use reqwest::header::HeaderValue;

const REDACTION: &str = "***REDACTED***";
const CREDENTIAL_HEADERS: [&str; 2] = ["x-cmc_pro_api_key", "authorization"];
const CREDENTIAL_QUERY_KEY: &str = "cmc_pro_api_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDebugConfig {
    pub enabled: bool,
    pub redact_secrets: bool,
    pub max_body_chars: usize,
}

impl HttpDebugConfig {
    pub fn from_verbose(verbose: bool) -> Self {
        Self {
            enabled: verbose,
            redact_secrets: true,
            max_body_chars: 4_000,
        }
    }

    pub fn disabled() -> Self {
        Self::from_verbose(false)
    }
}

pub fn is_credential_header(name: &str) -> bool {
    CREDENTIAL_HEADERS
        .iter()
        .any(|header| name.eq_ignore_ascii_case(header))
}

/// Returns the URL with the credential query value masked. URLs without a
/// credential are returned as they are.
pub fn redact_url(url: &Url, enable_redaction: bool) -> String {
    let has_credential = url
        .query_pairs()
        .any(|(key, _)| key.eq_ignore_ascii_case(CREDENTIAL_QUERY_KEY));
    if !enable_redaction || !has_credential {
        return url.as_str().to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key.eq_ignore_ascii_case(CREDENTIAL_QUERY_KEY) {
                REDACTION.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.as_str().to_string()
}

pub fn redact_header_value(name: &str, value: &HeaderValue, enable_redaction: bool) -> String {
    if enable_redaction && is_credential_header(name) {
        return REDACTION.to_string();
    }

    value
        .to_str()
        .map(ToString::to_string)
        .unwrap_or_else(|_| "<non-utf8>".to_string())
}

pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        None => input.to_string(),
        Some((cut, _)) => {
            let dropped = input[cut..].chars().count();
            format!("{}... <truncated {dropped} chars>", &input[..cut])
        }
    }
}
