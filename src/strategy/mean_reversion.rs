use crate::model::signal::RawSignal;
use crate::model::snapshot::IndicatorSnapshot;

/// Bollinger band breach confirmed by RSI.
#[derive(Debug, Clone)]
pub struct MeanReversionStrategy {
    rsi_oversold: f64,
    rsi_overbought: f64,
}

impl MeanReversionStrategy {
    pub fn new(rsi_oversold: f64, rsi_overbought: f64) -> Self {
        Self {
            rsi_oversold,
            rsi_overbought,
        }
    }

    pub fn on_snapshot(&mut self, snapshot: &IndicatorSnapshot) -> RawSignal {
        let (Some(upper), Some(lower), Some(rsi)) = (
            snapshot.bollinger_upper,
            snapshot.bollinger_lower,
            snapshot.rsi,
        ) else {
            return RawSignal::hold();
        };

        if snapshot.price < lower && rsi < self.rsi_oversold {
            RawSignal::buy(1.0)
        } else if snapshot.price > upper && rsi > self.rsi_overbought {
            RawSignal::sell(1.0)
        } else {
            RawSignal::hold()
        }
    }
}
