//! Decoding of `quotes/latest` payloads into [`Quote`] values.
//!
//! The provider omits or nulls fields it has no value for (`max_supply` is
//! `null` for uncapped assets), so every numeric field falls back to zero.
//! A payload that lacks the requested asset or currency still decodes; the
//! gap is reported through [`DecodedQuote::missing`].

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::model::{PriceSnapshot, Quote};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError(String);

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "quote payload decode error: {}", self.0)
    }
}

impl Error for DecodeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingData {
    Asset,
    Currency,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedQuote {
    pub quote: Quote,
    pub missing: Option<MissingData>,
}

pub fn decode(payload: &str, symbol: &str, convert: &str) -> Result<DecodedQuote, DecodeError> {
    let mut response = serde_json::from_str::<RawQuotesResponse>(payload)
        .map_err(|err| DecodeError(err.to_string()))?;

    let Some(mut asset) = response.data.remove(symbol) else {
        return Ok(DecodedQuote {
            quote: Quote::placeholder(symbol),
            missing: Some(MissingData::Asset),
        });
    };

    let (snapshot, missing) = match asset.quote.remove(convert) {
        Some(raw) => (raw.into_snapshot()?, None),
        None => (PriceSnapshot::default(), Some(MissingData::Currency)),
    };

    Ok(DecodedQuote {
        quote: Quote {
            name: asset.name.unwrap_or_default(),
            symbol: asset.symbol.unwrap_or_else(|| symbol.to_string()),
            max_supply: asset.max_supply,
            circulating_supply: asset.circulating_supply,
            total_supply: asset.total_supply,
            snapshot,
        },
        missing,
    })
}

#[derive(Debug, Deserialize)]
struct RawQuotesResponse {
    #[serde(default)]
    data: HashMap<String, RawAsset>,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default, deserialize_with = "zero_if_null")]
    max_supply: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    circulating_supply: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    total_supply: f64,
    #[serde(default)]
    quote: HashMap<String, RawSnapshot>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default, deserialize_with = "zero_if_null")]
    price: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    volume_24h: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    percent_change_1h: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    percent_change_24h: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    market_cap: f64,
    #[serde(default)]
    last_updated: Option<String>,
}

impl RawSnapshot {
    fn into_snapshot(self) -> Result<PriceSnapshot, DecodeError> {
        let last_updated = match self.last_updated.as_deref() {
            Some(text) => OffsetDateTime::parse(text, &Rfc3339)
                .map_err(|err| DecodeError(format!("invalid last_updated '{text}': {err}")))?,
            None => OffsetDateTime::UNIX_EPOCH,
        };

        Ok(PriceSnapshot {
            price: self.price,
            volume_24h: self.volume_24h,
            percent_change_1h: self.percent_change_1h,
            percent_change_24h: self.percent_change_24h,
            market_cap: self.market_cap,
            last_updated,
        })
    }
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Option::unwrap_or_default)
}
