use std::collections::VecDeque;

/// Rolling maximum and minimum over the last `capacity` samples.
///
/// Monotonic deques keep each sample at most once per side, so a push is O(1)
/// amortized regardless of window length.
#[derive(Debug, Clone)]
pub struct RollingExtremes {
    capacity: usize,
    next_index: u64,
    maxima: VecDeque<(u64, f64)>,
    minima: VecDeque<(u64, f64)>,
}

impl RollingExtremes {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "extremes capacity must be > 0");
        Self {
            capacity,
            next_index: 0,
            maxima: VecDeque::with_capacity(capacity),
            minima: VecDeque::with_capacity(capacity),
        }
    }

    /// Push a bar's high and low.
    pub fn push(&mut self, high: f64, low: f64) {
        let idx = self.next_index;
        self.next_index += 1;

        while self.maxima.back().is_some_and(|&(_, v)| v <= high) {
            self.maxima.pop_back();
        }
        self.maxima.push_back((idx, high));
        while self.minima.back().is_some_and(|&(_, v)| v >= low) {
            self.minima.pop_back();
        }
        self.minima.push_back((idx, low));

        let cutoff = self.next_index.saturating_sub(self.capacity as u64);
        while self.maxima.front().is_some_and(|&(i, _)| i < cutoff) {
            self.maxima.pop_front();
        }
        while self.minima.front().is_some_and(|&(i, _)| i < cutoff) {
            self.minima.pop_front();
        }
    }

    pub fn high(&self) -> Option<f64> {
        self.maxima.front().map(|&(_, v)| v)
    }

    pub fn low(&self) -> Option<f64> {
        self.minima.front().map(|&(_, v)| v)
    }

    pub fn is_full(&self) -> bool {
        self.next_index >= self.capacity as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_window_extremes_as_samples_expire() {
        let mut ext = RollingExtremes::new(3);
        ext.push(5.0, 5.0);
        ext.push(9.0, 1.0);
        ext.push(7.0, 3.0);
        assert_eq!(ext.high(), Some(9.0));
        assert_eq!(ext.low(), Some(1.0));
        assert!(ext.is_full());

        ext.push(6.0, 4.0); // drops (5,5)
        assert_eq!(ext.high(), Some(9.0));
        ext.push(2.0, 2.0); // drops (9,1)
        assert_eq!(ext.high(), Some(7.0));
        assert_eq!(ext.low(), Some(2.0));
    }

    #[test]
    fn matches_naive_scan() {
        let mut ext = RollingExtremes::new(5);
        let samples: Vec<f64> = (0..200).map(|i| ((i * 37) % 23) as f64).collect();
        for (i, &v) in samples.iter().enumerate() {
            ext.push(v, v);
            let start = i.saturating_sub(4);
            let window = &samples[start..=i];
            let hi = window.iter().cloned().fold(f64::MIN, f64::max);
            let lo = window.iter().cloned().fold(f64::MAX, f64::min);
            assert_eq!(ext.high(), Some(hi));
            assert_eq!(ext.low(), Some(lo));
        }
    }
}
