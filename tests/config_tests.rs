use std::io::Write;
use std::path::Path;

use tick_engine::config::{Config, SourceConfig};
use tick_engine::error::EngineError;
use tick_engine::queue::OverflowPolicy;
use tick_engine::strategy::StrategyKind;

const FULL: &str = r#"
[indicators]
window_size = 20
ema_alpha = 0.2
bollinger_multiplier = 2.0
rsi_period = 14
macd_short_period = 12
macd_long_period = 26
macd_signal_period = 9
atr_period = 14
stochastic_period = 14
rolling_volatility_window = 30

[risk]
risk_multiplier = 1.5
max_position_size = 25.0
minimum_liquidity = 100.0
slippage_factor = 0.01
transaction_cost = 0.5
latency = 2.0

[strategy]
kind = "pairs"
pair_symbols = ["btcusdt", "ETHUSDT"]

[pipeline]
max_records = 1000
queue_capacity = 512
overflow = "drop_oldest"

[source]
kind = "csv"
path = "data/ticks.csv"

[logging]
level = "debug"
json = true
"#;

#[test]
fn parse_full_toml() {
    let config = Config::from_toml_str(FULL).unwrap();
    assert_eq!(config.indicators.window_size, 20);
    assert!((config.indicators.ema_alpha - 0.2).abs() < f64::EPSILON);
    assert_eq!(config.indicators.trend_period, 20);
    assert!((config.risk.risk_multiplier - 1.5).abs() < f64::EPSILON);
    assert!((config.risk.stop_loss_pct - 2.0).abs() < f64::EPSILON);
    assert_eq!(config.risk.volatility_alert, None);
    assert_eq!(config.strategy.kind, StrategyKind::Pairs);
    assert_eq!(
        config.strategy.pair_legs(),
        Some(("BTCUSDT".to_string(), "ETHUSDT".to_string()))
    );
    assert_eq!(config.strategy.spread_window, 30);
    assert!((config.strategy.base_threshold - 0.01).abs() < f64::EPSILON);
    assert_eq!(config.pipeline.max_records, Some(1000));
    assert_eq!(config.pipeline.queue_capacity, Some(512));
    assert_eq!(config.pipeline.overflow, OverflowPolicy::DropOldest);
    match &config.source {
        SourceConfig::Csv { path } => assert_eq!(path, Path::new("data/ticks.csv")),
        other => panic!("unexpected source {:?}", other),
    }
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
}

#[test]
fn optional_sections_default() {
    let minimal = FULL
        .split("[pipeline]")
        .next()
        .unwrap()
        .replace("kind = \"pairs\"", "kind = \"momentum\"");
    let config = Config::from_toml_str(&minimal).unwrap();
    assert_eq!(config.pipeline.max_records, None);
    assert_eq!(config.pipeline.queue_capacity, None);
    assert_eq!(config.pipeline.overflow, OverflowPolicy::DropNewest);
    assert!(matches!(config.source, SourceConfig::RandomWalk { .. }));
    assert_eq!(config.logging.level, "info");
}

#[test]
/// Verifies fail-fast loading: a missing required field names the field.
fn missing_field_is_reported() {
    let broken = FULL.replace("window_size = 20\n", "");
    let err = Config::from_toml_str(&broken).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("window_size"), "unexpected error: {}", msg);
}

#[test]
fn pairs_without_symbols_is_rejected() {
    let broken = FULL.replace("pair_symbols = [\"btcusdt\", \"ETHUSDT\"]\n", "");
    let err = Config::from_toml_str(&broken).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EngineError>(),
        Some(EngineError::MissingField("strategy.pair_symbols"))
    ));
}

#[test]
fn invalid_values_name_the_field() {
    let cases = [
        ("ema_alpha = 0.2", "ema_alpha = 1.5", "indicators.ema_alpha"),
        ("rsi_period = 14", "rsi_period = 0", "indicators.rsi_period"),
        ("macd_short_period = 12", "macd_short_period = 30", "indicators.macd_short_period"),
        ("max_position_size = 25.0", "max_position_size = -1.0", "risk.max_position_size"),
        ("queue_capacity = 512", "queue_capacity = 0", "pipeline.queue_capacity"),
    ];
    for (from, to, field) in cases {
        let broken = FULL.replace(from, to);
        let err = Config::from_toml_str(&broken).unwrap_err();
        match err.downcast_ref::<EngineError>() {
            Some(EngineError::InvalidParameter { field: f, .. }) => assert_eq!(*f, field),
            other => panic!("expected invalid {} but got {:?}", field, other),
        }
    }
}

#[test]
fn unknown_strategy_kind_fails_to_parse() {
    let broken = FULL.replace("kind = \"pairs\"", "kind = \"martingale\"");
    assert!(Config::from_toml_str(&broken).is_err());
}

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FULL.as_bytes()).unwrap();
    let config = Config::load_from(file.path()).unwrap();
    assert_eq!(config.indicators.window_size, 20);

    let err = Config::load_from(Path::new("does/not/exist.toml")).unwrap_err();
    assert!(format!("{:#}", err).contains("failed to read"));
}

#[test]
fn shipped_default_config_is_valid() {
    let config = Config::load_from(Path::new("config/default.toml")).unwrap();
    assert_eq!(config.strategy.kind, StrategyKind::MeanReversion);
    assert!(config.pipeline.max_records.is_some());
}
