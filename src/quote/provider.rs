use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    MissingApiKey,
    HttpStatus { status: u16, body: String },
    Transport(String),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "missing CMC_PRO_API_KEY"),
            Self::HttpStatus { status, body } => {
                write!(f, "quote request failed with status {status}: {body}")
            }
            Self::Transport(msg) => write!(f, "quote transport error: {msg}"),
        }
    }
}

impl Error for FetchError {}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Source of raw quote payloads for a `(symbol, convert)` pair.
pub trait QuoteFetcher {
    fn fetch(
        &self,
        symbol: &str,
        convert: &str,
    ) -> impl std::future::Future<Output = FetchResult<String>> + Send;
}
