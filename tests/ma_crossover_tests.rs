mod common;

use common::snapshot;
use tick_engine::model::signal::{RawSignal, TradeAction};
use tick_engine::strategy::ma_crossover::MaCrossover;

fn on_price(strat: &mut MaCrossover, price: f64) -> RawSignal {
    strat.on_snapshot(&snapshot("BTCUSDT", price))
}

#[test]
fn insufficient_data_returns_hold() {
    let mut strat = MaCrossover::new(2, 3);
    for _ in 0..4 {
        assert!(on_price(&mut strat, 100.0).is_hold());
    }
}

#[test]
fn buy_signal_on_bullish_crossover() {
    let mut strat = MaCrossover::new(2, 4);
    for &p in &[100.0, 90.0, 80.0, 70.0] {
        assert!(on_price(&mut strat, p).is_hold());
    }
    // fast: 75 -> 95, slow: 85 -> 90
    let sig = on_price(&mut strat, 120.0);
    assert_eq!(sig.action, TradeAction::Buy, "Expected Buy signal, got {:?}", sig);
    assert!((strat.fast_sma_value().unwrap() - 95.0).abs() < f64::EPSILON);
    assert!((strat.slow_sma_value().unwrap() - 90.0).abs() < f64::EPSILON);
}

#[test]
fn sell_signal_on_bearish_crossover() {
    let mut strat = MaCrossover::new(2, 4);
    for &p in &[100.0, 90.0, 80.0, 70.0, 120.0, 150.0] {
        on_price(&mut strat, p);
    }

    for &p in &[60.0, 40.0, 30.0, 20.0] {
        if on_price(&mut strat, p).action == TradeAction::Sell {
            return;
        }
    }
    panic!("Expected Sell signal during price drop");
}

#[test]
fn no_repeat_buy_while_fast_stays_above() {
    let mut strat = MaCrossover::new(2, 4);
    for &p in &[100.0, 90.0, 80.0, 70.0, 120.0, 150.0] {
        on_price(&mut strat, p);
    }
    for &p in &[160.0, 170.0, 180.0, 190.0] {
        assert!(
            on_price(&mut strat, p).is_hold(),
            "Should not signal again without a new crossing"
        );
    }
}

#[test]
fn deterministic_output() {
    let prices: Vec<f64> = (0..200)
        .map(|i| 100.0 + 20.0 * (i as f64 * 0.1).sin())
        .collect();

    let run = |prices: &[f64]| -> Vec<TradeAction> {
        let mut strat = MaCrossover::new(5, 15);
        prices.iter().map(|&p| on_price(&mut strat, p).action).collect()
    };

    assert_eq!(run(&prices), run(&prices), "Strategy must be deterministic");
}

#[test]
#[should_panic(expected = "fast_period must be less than slow_period")]
fn fast_not_below_slow_panics() {
    MaCrossover::new(4, 4);
}
