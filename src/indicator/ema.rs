/// Exponential Moving Average: `ema = α·x + (1-α)·ema_prev`.
///
/// The first observation seeds the average, so a value is available from the
/// first push onwards.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    ema: Option<f64>,
}

impl Ema {
    pub fn with_alpha(alpha: f64) -> Self {
        assert!(
            alpha > 0.0 && alpha <= 1.0,
            "EMA alpha must be in (0, 1]"
        );
        Self { alpha, ema: None }
    }

    /// Conventional period form, `α = 2 / (period + 1)`.
    pub fn with_period(period: usize) -> Self {
        assert!(period > 0, "EMA period must be > 0");
        Self::with_alpha(2.0 / (period as f64 + 1.0))
    }

    pub fn push(&mut self, value: f64) -> f64 {
        let next = match self.ema {
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
            None => value,
        };
        self.ema = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.ema
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}
