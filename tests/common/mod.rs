#![allow(dead_code)]

use tick_engine::config::{IndicatorConfig, RiskParameters, StrategyConfig};
use tick_engine::model::snapshot::IndicatorSnapshot;
use tick_engine::strategy::StrategyKind;

/// Short periods so warmup completes within a handful of ticks.
pub fn indicator_config(window: usize) -> IndicatorConfig {
    IndicatorConfig {
        window_size: window,
        ema_alpha: 0.1,
        bollinger_multiplier: 2.0,
        rsi_period: 3,
        macd_short_period: 2,
        macd_long_period: 4,
        macd_signal_period: 2,
        atr_period: 3,
        stochastic_period: 3,
        rolling_volatility_window: 3,
        trend_period: 3,
    }
}

pub fn risk_params() -> RiskParameters {
    RiskParameters {
        risk_multiplier: 2.0,
        max_position_size: 100.0,
        minimum_liquidity: 100.0,
        slippage_factor: 0.5,
        transaction_cost: 1.0,
        latency: 0.0,
        stop_loss_pct: 2.0,
        atr_stop_multiplier: 2.0,
        flash_crash_threshold: 0.05,
        volatility_alert: None,
        liquidity_drop_threshold: 0.5,
    }
}

pub fn strategy_config(kind: StrategyKind) -> StrategyConfig {
    StrategyConfig {
        kind,
        base_threshold: 0.01,
        roc_threshold: 1.0,
        rsi_oversold: 30.0,
        rsi_overbought: 70.0,
        pair_symbols: None,
        spread_window: 3,
        spread_factor: 1.0,
        ma_short_period: 2,
        ma_long_period: 4,
        composite_threshold: 0.5,
    }
}

/// Snapshot with every optional indicator unavailable.
pub fn snapshot(symbol: &str, price: f64) -> IndicatorSnapshot {
    IndicatorSnapshot {
        symbol: symbol.to_string(),
        sequence: 1,
        timestamp_ms: 0,
        price,
        volume: 200.0,
        price_change: 0.0,
        moving_average: price,
        ema: price,
        bollinger_upper: None,
        bollinger_lower: None,
        rsi: None,
        rate_of_change: None,
        macd: 0.0,
        macd_signal: 0.0,
        atr: None,
        obv: 0.0,
        vwap: None,
        stochastic_k: None,
        stochastic_d: None,
        rolling_volatility: None,
        pivot_point: None,
        support_level: None,
        resistance_level: None,
        upper_price_level: None,
        lower_price_level: None,
        liquidity: 200.0,
        trend_strength: None,
    }
}
