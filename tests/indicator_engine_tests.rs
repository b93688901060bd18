use tick_engine::config::IndicatorConfig;
use tick_engine::error::EngineError;
use tick_engine::indicator::{IndicatorEngine, WarmupState};
use tick_engine::model::snapshot::IndicatorSnapshot;
use tick_engine::model::tick::Tick;

fn config(window: usize) -> IndicatorConfig {
    IndicatorConfig {
        window_size: window,
        ema_alpha: 0.1,
        bollinger_multiplier: 2.0,
        rsi_period: 3,
        macd_short_period: 3,
        macd_long_period: 6,
        macd_signal_period: 3,
        atr_period: 3,
        stochastic_period: 3,
        rolling_volatility_window: 3,
        trend_period: 5,
    }
}

fn tick(price: f64, volume: f64, sequence: u64) -> Tick {
    Tick::from_price("BTCUSDT", price, volume, sequence)
}

fn feed(engine: &mut IndicatorEngine, prices: &[f64]) -> Vec<IndicatorSnapshot> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| engine.on_tick(tick(p, 1.0, i as u64 + 1)).unwrap())
        .collect()
}

#[test]
/// Verifies a full window of evenly spaced prices:
/// moving average is 5.5 and the volatility of constant differences is 0.
fn ramp_average_and_zero_difference_volatility() {
    let mut cfg = config(10);
    cfg.rolling_volatility_window = 9;
    let mut engine = IndicatorEngine::new(cfg).unwrap();
    let prices: Vec<f64> = (1..=10).map(|p| p as f64).collect();
    let snaps = feed(&mut engine, &prices);

    let last = snaps.last().unwrap();
    assert!((last.moving_average - 5.5).abs() < f64::EPSILON);
    assert_eq!(last.rolling_volatility, Some(0.0));
    assert_eq!(engine.state("BTCUSDT"), Some(WarmupState::Steady));
}

#[test]
fn ema_seeds_then_smooths() {
    let mut engine = IndicatorEngine::new(config(5)).unwrap();
    let snaps = feed(&mut engine, &[10.0, 12.0]);
    assert!((snaps[0].ema - 10.0).abs() < f64::EPSILON);
    assert!((snaps[1].ema - 10.2).abs() < 1e-12);
}

#[test]
/// Verifies that window-dependent indicators are unavailable until the window
/// fills, and that the warmup state flips exactly then.
fn window_indicators_unavailable_until_full() {
    let mut engine = IndicatorEngine::new(config(4)).unwrap();
    let snaps = feed(&mut engine, &[10.0, 11.0, 12.0]);
    for snap in &snaps {
        assert_eq!(snap.bollinger_upper, None);
        assert_eq!(snap.bollinger_lower, None);
        assert_eq!(snap.rate_of_change, None);
        assert_eq!(snap.pivot_point, None);
        assert!(!snap.is_steady());
    }
    assert_eq!(
        engine.state("BTCUSDT"),
        Some(WarmupState::AwaitingWindowFill)
    );

    let snap = engine.on_tick(tick(13.0, 1.0, 4)).unwrap();
    assert!(snap.bollinger_upper.is_some());
    assert_eq!(engine.state("BTCUSDT"), Some(WarmupState::Steady));
}

#[test]
fn constant_prices_collapse_bollinger_bands() {
    let mut engine = IndicatorEngine::new(config(5)).unwrap();
    let snaps = feed(&mut engine, &[100.0; 8]);
    let last = snaps.last().unwrap();
    assert_eq!(last.bollinger_upper, Some(100.0));
    assert_eq!(last.bollinger_lower, Some(100.0));
    assert_eq!(last.rolling_volatility, Some(0.0));
    // Flat prices never lose: RSI short-circuits to 100.
    assert_eq!(last.rsi, Some(100.0));
}

#[test]
fn rate_of_change_uses_price_one_window_back() {
    let mut engine = IndicatorEngine::new(config(3)).unwrap();
    let snaps = feed(&mut engine, &[10.0, 11.0, 12.0, 15.0]);
    assert_eq!(snaps[2].rate_of_change, None);
    assert!((snaps[3].rate_of_change.unwrap() - 50.0).abs() < 1e-9);
}

#[test]
fn obv_and_vwap_follow_volume() {
    let mut engine = IndicatorEngine::new(config(3)).unwrap();
    let a = engine.on_tick(tick(10.0, 5.0, 1)).unwrap();
    let b = engine.on_tick(tick(11.0, 3.0, 2)).unwrap();
    let c = engine.on_tick(tick(10.5, 2.0, 3)).unwrap();
    let d = engine.on_tick(tick(10.5, 4.0, 4)).unwrap();

    assert!((a.obv - 5.0).abs() < f64::EPSILON);
    assert!((b.obv - 8.0).abs() < f64::EPSILON);
    assert!((c.obv - 6.0).abs() < f64::EPSILON);
    assert!((d.obv - 6.0).abs() < f64::EPSILON);

    assert!((a.vwap.unwrap() - 10.0).abs() < 1e-12);
    assert!((b.vwap.unwrap() - 83.0 / 8.0).abs() < 1e-12);
}

#[test]
fn pivot_levels_from_window_extremes() {
    let mut engine = IndicatorEngine::new(config(3)).unwrap();
    let snaps = feed(&mut engine, &[10.0, 12.0, 11.0]);
    let last = snaps.last().unwrap();
    assert_eq!(last.upper_price_level, Some(12.0));
    assert_eq!(last.lower_price_level, Some(10.0));
    assert!((last.pivot_point.unwrap() - 11.0).abs() < 1e-12);
    assert!((last.support_level.unwrap() - 10.0).abs() < 1e-12);
    assert!((last.resistance_level.unwrap() - 12.0).abs() < 1e-12);
}

#[test]
fn atr_uses_true_range_of_ticks() {
    let mut engine = IndicatorEngine::new(config(3)).unwrap();
    let bars = [(10.0, 12.0, 9.0), (11.0, 13.0, 10.0), (12.0, 14.0, 11.0)];
    let mut last = None;
    for (i, (price, high, low)) in bars.into_iter().enumerate() {
        let t = Tick {
            symbol: "BTCUSDT".to_string(),
            price,
            high,
            low,
            close: price,
            volume: 1.0,
            timestamp_ms: 0,
            sequence: i as u64 + 1,
        };
        last = Some(engine.on_tick(t).unwrap());
    }
    // True ranges: 3, max(3, 3, 0) = 3, max(3, 3, 0) = 3.
    assert!((last.unwrap().atr.unwrap() - 3.0).abs() < 1e-12);
}

#[test]
fn liquidity_averages_last_five_volumes() {
    let mut engine = IndicatorEngine::new(config(3)).unwrap();
    let mut last = None;
    for v in 1..=7 {
        last = Some(engine.on_tick(tick(10.0, v as f64, v)).unwrap());
    }
    assert!((last.unwrap().liquidity - 5.0).abs() < f64::EPSILON);
}

#[test]
fn trend_strength_is_signed_and_bounded() {
    let mut engine = IndicatorEngine::new(config(3)).unwrap();
    let up = feed(&mut engine, &[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(up[3].trend_strength, None);
    assert!((up[4].trend_strength.unwrap() - 1.0).abs() < 1e-9);

    let mut engine = IndicatorEngine::new(config(3)).unwrap();
    let down = feed(&mut engine, &[5.0, 4.0, 3.0, 2.0, 1.0]);
    assert!((down[4].trend_strength.unwrap() + 1.0).abs() < 1e-9);
}

#[test]
fn symbols_are_tracked_independently() {
    let mut engine = IndicatorEngine::new(config(2)).unwrap();
    engine.on_tick(Tick::from_price("AAA", 10.0, 1.0, 1)).unwrap();
    engine.on_tick(Tick::from_price("BBB", 50.0, 1.0, 2)).unwrap();
    let a = engine.on_tick(Tick::from_price("AAA", 12.0, 1.0, 3)).unwrap();
    assert!((a.moving_average - 11.0).abs() < f64::EPSILON);
    assert!((a.price_change - 2.0).abs() < f64::EPSILON);
    assert_eq!(engine.tracked_symbols(), 2);
    assert_eq!(engine.state("BBB"), Some(WarmupState::AwaitingWindowFill));
}

#[test]
fn invalid_tick_is_rejected_without_side_effects() {
    let mut engine = IndicatorEngine::new(config(2)).unwrap();
    engine.on_tick(tick(10.0, 1.0, 1)).unwrap();
    let err = engine.on_tick(tick(11.0, -1.0, 2)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameter { .. }));
    assert!(!err.is_fatal());

    let snap = engine.on_tick(tick(12.0, 1.0, 3)).unwrap();
    assert!((snap.price_change - 2.0).abs() < f64::EPSILON);
}

#[test]
fn invalid_config_fails_fast() {
    let mut cfg = config(3);
    cfg.window_size = 0;
    assert!(IndicatorEngine::new(cfg).is_err());

    let mut cfg = config(3);
    cfg.ema_alpha = 0.0;
    assert!(IndicatorEngine::new(cfg).is_err());
}
