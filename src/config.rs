use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::EngineError;
use crate::queue::OverflowPolicy;
use crate::strategy::StrategyKind;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub indicators: IndicatorConfig,
    pub risk: RiskParameters,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    pub window_size: usize,
    pub ema_alpha: f64,
    pub bollinger_multiplier: f64,
    pub rsi_period: usize,
    pub macd_short_period: usize,
    pub macd_long_period: usize,
    pub macd_signal_period: usize,
    pub atr_period: usize,
    pub stochastic_period: usize,
    pub rolling_volatility_window: usize,
    #[serde(default = "default_trend_period")]
    pub trend_period: usize,
}

/// Risk inputs shared by strategy sizing and the risk adjuster.
/// Read-only once the pipeline starts.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskParameters {
    pub risk_multiplier: f64,
    pub max_position_size: f64,
    pub minimum_liquidity: f64,
    pub slippage_factor: f64,
    pub transaction_cost: f64,
    pub latency: f64,
    /// Stop distance in percent while ATR is still warming up.
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,
    #[serde(default = "default_atr_stop_multiplier")]
    pub atr_stop_multiplier: f64,
    /// Tick return (fraction) below which a flash crash is reported.
    #[serde(default = "default_flash_crash_threshold")]
    pub flash_crash_threshold: f64,
    /// Rolling volatility above which a high-volatility alert is reported.
    #[serde(default)]
    pub volatility_alert: Option<f64>,
    /// Fractional drop of tick volume against the liquidity estimate.
    #[serde(default = "default_liquidity_drop_threshold")]
    pub liquidity_drop_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    #[serde(default = "default_base_threshold")]
    pub base_threshold: f64,
    #[serde(default = "default_roc_threshold")]
    pub roc_threshold: f64,
    #[serde(default = "default_oversold")]
    pub rsi_oversold: f64,
    #[serde(default = "default_overbought")]
    pub rsi_overbought: f64,
    #[serde(default)]
    pub pair_symbols: Option<[String; 2]>,
    #[serde(default = "default_spread_window")]
    pub spread_window: usize,
    #[serde(default = "default_spread_factor")]
    pub spread_factor: f64,
    #[serde(default = "default_ma_short")]
    pub ma_short_period: usize,
    #[serde(default = "default_ma_long")]
    pub ma_long_period: usize,
    #[serde(default = "default_composite_threshold")]
    pub composite_threshold: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// Stop after this many trade signals; unlimited when absent.
    #[serde(default)]
    pub max_records: Option<u64>,
    /// Bound for both pipeline queues; unbounded when absent.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Csv {
        path: PathBuf,
    },
    RandomWalk {
        #[serde(default = "default_symbol")]
        symbol: String,
        #[serde(default = "default_start_price")]
        start_price: f64,
        #[serde(default = "default_walk_ticks")]
        ticks: u64,
        #[serde(default)]
        seed: u64,
        #[serde(default)]
        interval_ms: u64,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::RandomWalk {
            symbol: default_symbol(),
            start_price: default_start_price(),
            ticks: default_walk_ticks(),
            seed: 0,
            interval_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn default_trend_period() -> usize {
    20
}
fn default_stop_loss_pct() -> f64 {
    2.0
}
fn default_atr_stop_multiplier() -> f64 {
    2.0
}
fn default_flash_crash_threshold() -> f64 {
    0.05
}
fn default_liquidity_drop_threshold() -> f64 {
    0.5
}
fn default_base_threshold() -> f64 {
    0.01
}
fn default_roc_threshold() -> f64 {
    1.0
}
fn default_oversold() -> f64 {
    30.0
}
fn default_overbought() -> f64 {
    70.0
}
fn default_spread_window() -> usize {
    30
}
fn default_spread_factor() -> f64 {
    2.0
}
fn default_ma_short() -> usize {
    5
}
fn default_ma_long() -> usize {
    20
}
fn default_composite_threshold() -> f64 {
    0.5
}
fn default_symbol() -> String {
    "BTCUSDT".to_string()
}
fn default_start_price() -> f64 {
    100.0
}
fn default_walk_ticks() -> u64 {
    1_000
}

fn positive_period(field: &'static str, value: usize) -> Result<(), EngineError> {
    if value == 0 {
        return Err(EngineError::invalid(field, "must be > 0"));
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::invalid(
            field,
            format!("must be a finite value >= 0 (got {})", value),
        ));
    }
    Ok(())
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        positive_period("indicators.window_size", self.window_size)?;
        positive_period("indicators.rsi_period", self.rsi_period)?;
        positive_period("indicators.macd_short_period", self.macd_short_period)?;
        positive_period("indicators.macd_long_period", self.macd_long_period)?;
        positive_period("indicators.macd_signal_period", self.macd_signal_period)?;
        positive_period("indicators.atr_period", self.atr_period)?;
        positive_period("indicators.stochastic_period", self.stochastic_period)?;
        positive_period(
            "indicators.rolling_volatility_window",
            self.rolling_volatility_window,
        )?;
        if self.trend_period < 2 {
            return Err(EngineError::invalid("indicators.trend_period", "must be >= 2"));
        }
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(EngineError::invalid(
                "indicators.ema_alpha",
                format!("must be in (0, 1] (got {})", self.ema_alpha),
            ));
        }
        if self.macd_short_period >= self.macd_long_period {
            return Err(EngineError::invalid(
                "indicators.macd_short_period",
                "must be less than macd_long_period",
            ));
        }
        non_negative("indicators.bollinger_multiplier", self.bollinger_multiplier)
    }
}

impl RiskParameters {
    pub fn validate(&self) -> Result<(), EngineError> {
        non_negative("risk.risk_multiplier", self.risk_multiplier)?;
        non_negative("risk.max_position_size", self.max_position_size)?;
        non_negative("risk.minimum_liquidity", self.minimum_liquidity)?;
        non_negative("risk.slippage_factor", self.slippage_factor)?;
        non_negative("risk.transaction_cost", self.transaction_cost)?;
        non_negative("risk.latency", self.latency)?;
        non_negative("risk.stop_loss_pct", self.stop_loss_pct)?;
        non_negative("risk.atr_stop_multiplier", self.atr_stop_multiplier)?;
        non_negative("risk.flash_crash_threshold", self.flash_crash_threshold)?;
        non_negative("risk.liquidity_drop_threshold", self.liquidity_drop_threshold)
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        non_negative("strategy.base_threshold", self.base_threshold)?;
        non_negative("strategy.roc_threshold", self.roc_threshold)?;
        non_negative("strategy.spread_factor", self.spread_factor)?;
        positive_period("strategy.spread_window", self.spread_window)?;
        if self.ma_short_period == 0 || self.ma_short_period >= self.ma_long_period {
            return Err(EngineError::invalid(
                "strategy.ma_short_period",
                "must be > 0 and less than ma_long_period",
            ));
        }
        if self.kind == StrategyKind::Pairs {
            let Some([a, b]) = self.pair_symbols.as_ref() else {
                return Err(EngineError::MissingField("strategy.pair_symbols"));
            };
            if a.trim().eq_ignore_ascii_case(b.trim()) {
                return Err(EngineError::invalid(
                    "strategy.pair_symbols",
                    "legs must be different symbols",
                ));
            }
        }
        Ok(())
    }

    /// Normalised pair legs, if configured.
    pub fn pair_legs(&self) -> Option<(String, String)> {
        self.pair_symbols.as_ref().map(|[a, b]| {
            (
                a.trim().to_ascii_uppercase(),
                b.trim().to_ascii_uppercase(),
            )
        })
    }
}

impl Config {
    /// Load from `TICK_ENGINE_CONFIG` (after reading `.env`) or `config/default.toml`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var("TICK_ENGINE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).context("failed to parse config")?;
        config.validate().context("config is invalid")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.indicators.validate()?;
        self.risk.validate()?;
        self.strategy.validate()?;
        if self.pipeline.queue_capacity == Some(0) {
            return Err(EngineError::invalid("pipeline.queue_capacity", "must be > 0"));
        }
        Ok(())
    }
}
