use std::collections::HashMap;

use super::arbitrage::ArbitrageStrategy;
use super::composite::{CompositeStrategy, ExternalSignal, NeutralSignal};
use super::ma_crossover::MaCrossover;
use super::mean_reversion::MeanReversionStrategy;
use super::momentum::MomentumStrategy;
use super::pairs::PairsStrategy;
use super::StrategyKind;
use crate::config::{RiskParameters, StrategyConfig};
use crate::error::EngineError;
use crate::model::signal::{RawSignal, TradeAction, TradeSignal};
use crate::model::snapshot::IndicatorSnapshot;

/// `|strength| × risk_multiplier`, clamped to `[0, max_position_size]`.
pub fn position_size(strength: f64, risk: &RiskParameters) -> f64 {
    let size = strength.abs() * risk.risk_multiplier;
    if !size.is_finite() {
        return 0.0;
    }
    size.min(risk.max_position_size)
}

#[derive(Debug)]
enum ActiveStrategy {
    Arbitrage(ArbitrageStrategy),
    MeanReversion(MeanReversionStrategy),
    Momentum(MomentumStrategy),
    Pairs {
        strategy: PairsStrategy,
        leg_a: String,
        leg_b: String,
        latest: HashMap<String, IndicatorSnapshot>,
    },
    MaCrossover(MaCrossover),
    Composite(CompositeStrategy),
}

/// Maps snapshots to sized trade signals using the configured strategy.
#[derive(Debug)]
pub struct StrategyEngine {
    kind: StrategyKind,
    risk: RiskParameters,
    active: ActiveStrategy,
}

impl StrategyEngine {
    pub fn new(config: &StrategyConfig, risk: &RiskParameters) -> Result<Self, EngineError> {
        Self::with_external_signal(config, risk, Box::new(NeutralSignal))
    }

    /// Like [`StrategyEngine::new`], with the score source used by the composite strategy.
    pub fn with_external_signal(
        config: &StrategyConfig,
        risk: &RiskParameters,
        external: Box<dyn ExternalSignal>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        risk.validate()?;
        let active = match config.kind {
            StrategyKind::Arbitrage => {
                ActiveStrategy::Arbitrage(ArbitrageStrategy::new(config.base_threshold, risk.clone()))
            }
            StrategyKind::MeanReversion => ActiveStrategy::MeanReversion(
                MeanReversionStrategy::new(config.rsi_oversold, config.rsi_overbought),
            ),
            StrategyKind::Momentum => ActiveStrategy::Momentum(MomentumStrategy::new(
                config.roc_threshold,
                config.rsi_oversold,
                config.rsi_overbought,
            )),
            StrategyKind::Pairs => {
                let (leg_a, leg_b) = config
                    .pair_legs()
                    .ok_or(EngineError::MissingField("strategy.pair_symbols"))?;
                ActiveStrategy::Pairs {
                    strategy: PairsStrategy::new(config.spread_window, config.spread_factor),
                    leg_a,
                    leg_b,
                    latest: HashMap::new(),
                }
            }
            StrategyKind::MaCrossover => ActiveStrategy::MaCrossover(MaCrossover::new(
                config.ma_short_period,
                config.ma_long_period,
            )),
            StrategyKind::Composite => ActiveStrategy::Composite(CompositeStrategy::new(
                config.composite_threshold,
                external,
            )),
        };
        tracing::info!(strategy = config.kind.as_label(), "strategy engine ready");
        Ok(Self {
            kind: config.kind,
            risk: risk.clone(),
            active,
        })
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    /// Evaluate one snapshot. Always returns a signal; Hold carries size 0.
    pub fn on_snapshot(&mut self, snapshot: &IndicatorSnapshot) -> TradeSignal {
        let (raw, symbol, entry_price) = match &mut self.active {
            ActiveStrategy::Arbitrage(s) => (s.on_snapshot(snapshot), None, snapshot.price),
            ActiveStrategy::MeanReversion(s) => (s.on_snapshot(snapshot), None, snapshot.price),
            ActiveStrategy::Momentum(s) => (s.on_snapshot(snapshot), None, snapshot.price),
            ActiveStrategy::MaCrossover(s) => (s.on_snapshot(snapshot), None, snapshot.price),
            ActiveStrategy::Composite(s) => (s.on_snapshot(snapshot), None, snapshot.price),
            ActiveStrategy::Pairs {
                strategy,
                leg_a,
                leg_b,
                latest,
            } => {
                let key = snapshot.symbol.trim().to_ascii_uppercase();
                if key != *leg_a && key != *leg_b {
                    return TradeSignal::hold(&snapshot.symbol, snapshot.sequence);
                }
                latest.insert(key, snapshot.clone());
                match (latest.get(leg_a.as_str()), latest.get(leg_b.as_str())) {
                    (Some(a), Some(b)) => {
                        let raw = strategy.on_pair(a, b);
                        (raw, Some(a.symbol.clone()), a.price)
                    }
                    (a, _) => (
                        RawSignal::hold(),
                        Some(leg_a.clone()),
                        a.map(|a| a.price).unwrap_or(0.0),
                    ),
                }
            }
        };
        let symbol = symbol.unwrap_or_else(|| snapshot.symbol.clone());
        self.finalize(raw, symbol, snapshot.sequence, entry_price)
    }

    fn finalize(&self, raw: RawSignal, symbol: String, sequence: u64, entry_price: f64) -> TradeSignal {
        if raw.action == TradeAction::Hold {
            return TradeSignal {
                symbol,
                sequence,
                action: TradeAction::Hold,
                position_size: 0.0,
                entry_price,
            };
        }
        tracing::debug!(
            symbol = %symbol,
            sequence,
            action = raw.action.as_str(),
            strength = raw.strength,
            "raw signal"
        );
        TradeSignal {
            symbol,
            sequence,
            action: raw.action,
            position_size: position_size(raw.strength, &self.risk),
            entry_price,
        }
    }
}
