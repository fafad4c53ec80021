use time::OffsetDateTime;

/// One asset's metadata plus the price snapshot for a single convert currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub name: String,
    pub symbol: String,
    pub max_supply: f64,
    pub circulating_supply: f64,
    pub total_supply: f64,
    pub snapshot: PriceSnapshot,
}

impl Quote {
    /// Quote for an asset the provider did not return: requested symbol, zeroes everywhere else.
    pub fn placeholder(symbol: &str) -> Self {
        Self {
            name: String::new(),
            symbol: symbol.to_string(),
            max_supply: 0.0,
            circulating_supply: 0.0,
            total_supply: 0.0,
            snapshot: PriceSnapshot::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub price: f64,
    pub volume_24h: f64,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub market_cap: f64,
    pub last_updated: OffsetDateTime,
}

impl Default for PriceSnapshot {
    fn default() -> Self {
        Self {
            price: 0.0,
            volume_24h: 0.0,
            percent_change_1h: 0.0,
            percent_change_24h: 0.0,
            market_cap: 0.0,
            last_updated: OffsetDateTime::UNIX_EPOCH,
        }
    }
}
