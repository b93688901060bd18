pub mod arbitrage;
pub mod composite;
pub mod engine;
pub mod ma_crossover;
pub mod mean_reversion;
pub mod momentum;
pub mod pairs;

use serde::Deserialize;

pub use engine::{position_size, StrategyEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Arbitrage,
    MeanReversion,
    Momentum,
    Pairs,
    MaCrossover,
    Composite,
}

impl StrategyKind {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Arbitrage => "arbitrage",
            Self::MeanReversion => "mean_reversion",
            Self::Momentum => "momentum",
            Self::Pairs => "pairs",
            Self::MaCrossover => "ma_crossover",
            Self::Composite => "composite",
        }
    }
}
