use serde::Serialize;

/// Indicator values as of the most recent tick for one symbol.
///
/// Fields that need a filled window (or a seeded smoother) are `None` until
/// enough history exists; they never fall back to a silent zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub price: f64,
    pub volume: f64,
    /// `price - previous price`; zero on the first tick of a symbol.
    pub price_change: f64,
    pub moving_average: f64,
    pub ema: f64,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub rsi: Option<f64>,
    pub rate_of_change: Option<f64>,
    pub macd: f64,
    pub macd_signal: f64,
    pub atr: Option<f64>,
    pub obv: f64,
    pub vwap: Option<f64>,
    pub stochastic_k: Option<f64>,
    pub stochastic_d: Option<f64>,
    pub rolling_volatility: Option<f64>,
    pub pivot_point: Option<f64>,
    pub support_level: Option<f64>,
    pub resistance_level: Option<f64>,
    pub upper_price_level: Option<f64>,
    pub lower_price_level: Option<f64>,
    pub liquidity: f64,
    pub trend_strength: Option<f64>,
}

impl IndicatorSnapshot {
    /// `true` once every window-dependent indicator reports a value.
    pub fn is_steady(&self) -> bool {
        self.bollinger_upper.is_some()
            && self.rolling_volatility.is_some()
            && self.stochastic_k.is_some()
    }

    pub fn macd_histogram(&self) -> f64 {
        self.macd - self.macd_signal
    }

    /// Tick return `price_change / previous price`, `None` when the previous price was zero.
    pub fn tick_return(&self) -> Option<f64> {
        let prev = self.price - self.price_change;
        if prev.abs() <= f64::EPSILON {
            None
        } else {
            Some(self.price_change / prev)
        }
    }
}
