use crate::model::signal::RawSignal;
use crate::model::snapshot::IndicatorSnapshot;

const PREDICTION_WEIGHT: f64 = 0.5;
const SENTIMENT_WEIGHT: f64 = 0.3;
const VOLATILITY_WEIGHT: f64 = 0.2;

/// Pluggable score source (model prediction, sentiment feed).
/// Scores are expected in [-1, 1] and are clamped to it.
pub trait ExternalSignal: Send + Sync {
    fn prediction(&self, snapshot: &IndicatorSnapshot) -> f64;
    fn sentiment(&self, snapshot: &IndicatorSnapshot) -> f64;
}

/// Scores nothing: both inputs are 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralSignal;

impl ExternalSignal for NeutralSignal {
    fn prediction(&self, _snapshot: &IndicatorSnapshot) -> f64 {
        0.0
    }

    fn sentiment(&self, _snapshot: &IndicatorSnapshot) -> f64 {
        0.0
    }
}

/// Weighted blend of external scores and inverse volatility.
pub struct CompositeStrategy {
    threshold: f64,
    external: Box<dyn ExternalSignal>,
}

impl std::fmt::Debug for CompositeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeStrategy")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl CompositeStrategy {
    pub fn new(threshold: f64, external: Box<dyn ExternalSignal>) -> Self {
        Self {
            threshold,
            external,
        }
    }

    /// `None` while rolling volatility is unavailable or zero.
    /// The inverse-volatility term is capped at 1.
    pub fn score(&self, snapshot: &IndicatorSnapshot) -> Option<f64> {
        let vol = snapshot.rolling_volatility.filter(|v| *v > f64::EPSILON)?;
        let prediction = clamp_score(self.external.prediction(snapshot));
        let sentiment = clamp_score(self.external.sentiment(snapshot));
        let inverse_vol = (1.0 / vol).min(1.0);
        Some(
            PREDICTION_WEIGHT * prediction
                + SENTIMENT_WEIGHT * sentiment
                + VOLATILITY_WEIGHT * inverse_vol,
        )
    }

    pub fn on_snapshot(&mut self, snapshot: &IndicatorSnapshot) -> RawSignal {
        let Some(score) = self.score(snapshot) else {
            return RawSignal::hold();
        };
        if score > self.threshold {
            RawSignal::buy(score)
        } else if score < -self.threshold {
            RawSignal::sell(score.abs())
        } else {
            RawSignal::hold()
        }
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
