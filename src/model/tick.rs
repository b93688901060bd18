use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp_ms: u64,
    pub sequence: u64,
}

impl Tick {
    /// Create a synthetic tick where high/low/close collapse onto `price`.
    pub fn from_price(symbol: &str, price: f64, volume: f64, sequence: u64) -> Self {
        Self {
            symbol: symbol.to_string(),
            price,
            high: price,
            low: price,
            close: price,
            volume,
            timestamp_ms: 0,
            sequence,
        }
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}
