use super::window::RollingWindow;

/// Least-squares slope of price over the last `period` samples, normalised by
/// the mean absolute tick move over the same span.
///
/// A straight rising line scores +1, a straight falling line −1, and noise
/// without drift lands near 0. `Σx·y` is maintained incrementally so each
/// push is O(1).
#[derive(Debug, Clone)]
pub struct TrendStrength {
    prices: RollingWindow,
    abs_moves: RollingWindow,
    sum_xy: f64,
    prev_price: Option<f64>,
}

impl TrendStrength {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "trend period must be >= 2");
        Self {
            prices: RollingWindow::new(period),
            abs_moves: RollingWindow::new(period - 1),
            sum_xy: 0.0,
            prev_price: None,
        }
    }

    pub fn push(&mut self, price: f64) -> Option<f64> {
        if let Some(prev) = self.prev_price.replace(price) {
            self.abs_moves.push((price - prev).abs());
        }

        let count_before = self.prices.len();
        let sum_before = self.prices.sum();
        match self.prices.push(price) {
            Some(evicted) => {
                let n = self.prices.capacity() as f64;
                self.sum_xy = self.sum_xy - (sum_before - evicted) + (n - 1.0) * price;
            }
            None => {
                self.sum_xy += count_before as f64 * price;
            }
        }
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        if !self.prices.is_full() || !self.abs_moves.is_full() {
            return None;
        }
        let slope = self.slope();
        let mean_move = self.abs_moves.mean();
        if mean_move <= f64::EPSILON {
            return Some(0.0);
        }
        Some((slope / mean_move).clamp(-1.0, 1.0))
    }

    fn slope(&self) -> f64 {
        let n = self.prices.len() as f64;
        let sum_x = n * (n - 1.0) / 2.0;
        let sum_xx = (n - 1.0) * n * (2.0 * n - 1.0) / 6.0;
        let denom = n * sum_xx - sum_x * sum_x;
        if denom.abs() <= f64::EPSILON {
            return 0.0;
        }
        (n * self.sum_xy - sum_x * self.prices.sum()) / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_lines_saturate() {
        let mut up = TrendStrength::new(5);
        let mut down = TrendStrength::new(5);
        let mut last_up = None;
        let mut last_down = None;
        for i in 0..20 {
            last_up = up.push(100.0 + i as f64 * 0.5);
            last_down = down.push(100.0 - i as f64 * 0.5);
        }
        assert!((last_up.unwrap() - 1.0).abs() < 1e-9);
        assert!((last_down.unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn unavailable_until_period_filled() {
        let mut t = TrendStrength::new(4);
        assert_eq!(t.push(1.0), None);
        assert_eq!(t.push(2.0), None);
        assert_eq!(t.push(3.0), None);
        assert!(t.push(4.0).is_some());
    }

    #[test]
    fn flat_prices_have_no_trend() {
        let mut t = TrendStrength::new(3);
        for _ in 0..6 {
            t.push(50.0);
        }
        assert_eq!(t.value(), Some(0.0));
    }
}
