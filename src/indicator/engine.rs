use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::atr::Atr;
use super::ema::Ema;
use super::extremes::RollingExtremes;
use super::rsi::Rsi;
use super::trend::TrendStrength;
use super::window::RollingWindow;
use crate::config::IndicatorConfig;
use crate::error::EngineError;
use crate::model::snapshot::IndicatorSnapshot;
use crate::model::tick::Tick;

/// Number of recent volumes averaged into the liquidity estimate.
pub const LIQUIDITY_WINDOW: usize = 5;
const STOCHASTIC_D_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupState {
    AwaitingWindowFill,
    Steady,
}

/// Incremental indicator state for a single symbol.
#[derive(Debug, Clone)]
pub struct SymbolIndicators {
    state: WarmupState,
    bollinger_multiplier: f64,
    prices: RollingWindow,
    price_diffs: RollingWindow,
    levels: RollingExtremes,
    stochastic_range: RollingExtremes,
    stochastic_k: RollingWindow,
    liquidity: RollingWindow,
    ema: Ema,
    macd_short: Ema,
    macd_long: Ema,
    macd_signal: Ema,
    rsi: Rsi,
    atr: Atr,
    trend: TrendStrength,
    prev_price: Option<f64>,
    last_k: Option<f64>,
    obv: f64,
    cum_price_volume: f64,
    cum_volume: f64,
    vwap: Option<f64>,
    ticks: u64,
}

impl SymbolIndicators {
    pub fn try_new(cfg: &IndicatorConfig) -> Result<Self, EngineError> {
        Ok(Self {
            state: WarmupState::AwaitingWindowFill,
            bollinger_multiplier: cfg.bollinger_multiplier,
            prices: RollingWindow::try_new(cfg.window_size)?,
            price_diffs: RollingWindow::try_new(cfg.rolling_volatility_window)?,
            levels: RollingExtremes::new(cfg.window_size),
            stochastic_range: RollingExtremes::new(cfg.stochastic_period),
            stochastic_k: RollingWindow::try_new(STOCHASTIC_D_SAMPLES)?,
            liquidity: RollingWindow::try_new(LIQUIDITY_WINDOW)?,
            ema: Ema::with_alpha(cfg.ema_alpha),
            macd_short: Ema::with_period(cfg.macd_short_period),
            macd_long: Ema::with_period(cfg.macd_long_period),
            macd_signal: Ema::with_period(cfg.macd_signal_period),
            rsi: Rsi::new(cfg.rsi_period),
            atr: Atr::new(cfg.atr_period),
            trend: TrendStrength::new(cfg.trend_period),
            prev_price: None,
            last_k: None,
            obv: 0.0,
            cum_price_volume: 0.0,
            cum_volume: 0.0,
            vwap: None,
            ticks: 0,
        })
    }

    pub fn state(&self) -> WarmupState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fold one tick into every indicator and return the resulting snapshot.
    pub fn update(&mut self, tick: Tick) -> IndicatorSnapshot {
        self.ticks += 1;
        let price = tick.price;
        let prev_price = self.prev_price.replace(price);
        let price_change = prev_price.map(|p| price - p).unwrap_or(0.0);

        // Moving average, Bollinger, rate of change.
        let evicted = self.prices.push(price);
        let moving_average = self.prices.mean();
        let window_full = self.prices.is_full();
        if window_full && self.state == WarmupState::AwaitingWindowFill {
            self.state = WarmupState::Steady;
            tracing::debug!(symbol = %tick.symbol, ticks = self.ticks, "indicator window filled");
        }
        let (bollinger_upper, bollinger_lower) = if window_full {
            let band = self.bollinger_multiplier * self.prices.std_dev();
            (Some(moving_average + band), Some(moving_average - band))
        } else {
            (None, None)
        };
        let rate_of_change = evicted.and_then(|base| {
            (base.abs() > f64::EPSILON).then(|| (price - base) / base * 100.0)
        });

        let ema = self.ema.push(price);
        let short = self.macd_short.push(price);
        let long = self.macd_long.push(price);
        let macd = short - long;
        let macd_signal = self.macd_signal.push(macd);

        let rsi = self.rsi.push(price);
        let atr = self.atr.push(tick.high, tick.low, tick.close);

        // OBV is seeded with the first volume; afterwards signed by direction.
        match prev_price {
            None => self.obv = tick.volume,
            Some(prev) if price > prev => self.obv += tick.volume,
            Some(prev) if price < prev => self.obv -= tick.volume,
            Some(_) => {}
        }

        // Zero-volume ticks leave VWAP unchanged.
        if tick.volume > 0.0 {
            self.cum_price_volume += price * tick.volume;
            self.cum_volume += tick.volume;
            self.vwap = Some(self.cum_price_volume / self.cum_volume);
        }

        self.stochastic_range.push(tick.high, tick.low);
        let stochastic_k = self.next_stochastic_k(price);
        let stochastic_d = match stochastic_k {
            Some(k) => {
                self.stochastic_k.push(k);
                self.stochastic_k.is_full().then(|| self.stochastic_k.mean())
            }
            None => None,
        };

        let rolling_volatility = if prev_price.is_some() {
            self.price_diffs.push(price_change);
            self.price_diffs.is_full().then(|| self.price_diffs.std_dev())
        } else {
            None
        };

        self.levels.push(tick.high, tick.low);
        let (pivot_point, support_level, resistance_level, upper_price_level, lower_price_level) =
            match (self.levels.is_full(), self.levels.high(), self.levels.low()) {
                (true, Some(high), Some(low)) => {
                    let pivot = (high + low + tick.close) / 3.0;
                    (
                        Some(pivot),
                        Some(2.0 * pivot - high),
                        Some(2.0 * pivot - low),
                        Some(high),
                        Some(low),
                    )
                }
                _ => (None, None, None, None, None),
            };

        self.liquidity.push(tick.volume);
        let liquidity = self.liquidity.mean();
        let trend_strength = self.trend.push(price);

        IndicatorSnapshot {
            symbol: tick.symbol,
            sequence: tick.sequence,
            timestamp_ms: tick.timestamp_ms,
            price,
            volume: tick.volume,
            price_change,
            moving_average,
            ema,
            bollinger_upper,
            bollinger_lower,
            rsi,
            rate_of_change,
            macd,
            macd_signal,
            atr,
            obv: self.obv,
            vwap: self.vwap,
            stochastic_k,
            stochastic_d,
            rolling_volatility,
            pivot_point,
            support_level,
            resistance_level,
            upper_price_level,
            lower_price_level,
            liquidity,
            trend_strength,
        }
    }

    /// `%K` over the stochastic window; a zero range holds the previous value.
    fn next_stochastic_k(&mut self, price: f64) -> Option<f64> {
        if !self.stochastic_range.is_full() {
            return None;
        }
        let (Some(high), Some(low)) = (self.stochastic_range.high(), self.stochastic_range.low())
        else {
            return None;
        };
        let range = high - low;
        if range <= f64::EPSILON {
            return self.last_k;
        }
        let k = (100.0 * (price - low) / range).clamp(0.0, 100.0);
        self.last_k = Some(k);
        Some(k)
    }
}

/// Per-symbol indicator state owned by the processing unit.
#[derive(Debug)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
    symbols: HashMap<String, SymbolIndicators>,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            symbols: HashMap::new(),
        })
    }

    /// Consume a tick and produce the symbol's updated snapshot.
    ///
    /// Ticks with non-finite prices or negative volume are rejected without
    /// touching any state.
    pub fn on_tick(&mut self, tick: Tick) -> Result<IndicatorSnapshot, EngineError> {
        validate_tick(&tick)?;
        let state = match self.symbols.entry(tick.symbol.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(v) => {
                tracing::info!(symbol = %tick.symbol, "tracking new symbol");
                v.insert(SymbolIndicators::try_new(&self.config)?)
            }
        };
        Ok(state.update(tick))
    }

    pub fn state(&self, symbol: &str) -> Option<WarmupState> {
        self.symbols.get(symbol).map(SymbolIndicators::state)
    }

    pub fn tracked_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }
}

fn validate_tick(tick: &Tick) -> Result<(), EngineError> {
    let prices = [tick.price, tick.high, tick.low, tick.close];
    if prices.iter().any(|p| !p.is_finite()) {
        return Err(EngineError::invalid(
            "tick",
            format!("non-finite price in tick #{} for {}", tick.sequence, tick.symbol),
        ));
    }
    if !tick.volume.is_finite() || tick.volume < 0.0 {
        return Err(EngineError::invalid(
            "tick",
            format!("invalid volume {} in tick #{}", tick.volume, tick.sequence),
        ));
    }
    Ok(())
}
