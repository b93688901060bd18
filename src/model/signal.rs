use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Hold => "hold",
        }
    }
}

/// Strategy output before sizing: direction plus an unscaled strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSignal {
    pub action: TradeAction,
    pub strength: f64,
}

impl RawSignal {
    pub fn hold() -> Self {
        Self {
            action: TradeAction::Hold,
            strength: 0.0,
        }
    }

    pub fn buy(strength: f64) -> Self {
        Self {
            action: TradeAction::Buy,
            strength,
        }
    }

    pub fn sell(strength: f64) -> Self {
        Self {
            action: TradeAction::Sell,
            strength,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action == TradeAction::Hold
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub sequence: u64,
    pub action: TradeAction,
    pub position_size: f64,
    pub entry_price: f64,
}

impl TradeSignal {
    pub fn hold(symbol: &str, sequence: u64) -> Self {
        Self {
            symbol: symbol.to_string(),
            sequence,
            action: TradeAction::Hold,
            position_size: 0.0,
            entry_price: 0.0,
        }
    }
}
