//! Average True Range (ATR).
//!
//! TR[t] = max(high-low, |high-prev_close|, |low-prev_close|), undefined at t = 0.
//! ATR is the Wilder-smoothed TR, seeded with the mean of TR[1..=period].
//! Lookback: period.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range per bar; the first bar has no previous close and is NaN.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    if bars.is_empty() {
        return tr;
    }
    tr.push(f64::NAN);
    tr.extend(bars.windows(2).map(|w| {
        let (prev_close, bar) = (w[0].close, &w[1]);
        (bar.high - bar.low)
            .max((bar.high - prev_close).abs())
            .max((bar.low - prev_close).abs())
    }));
    tr
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let tr = true_range(bars);
        let n = tr.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.period {
            return result;
        }

        let seed = &tr[1..=self.period];
        if seed.iter().any(|v| v.is_nan()) {
            return result;
        }
        let period = self.period as f64;
        let mut prev = seed.iter().sum::<f64>() / period;
        result[self.period] = prev;

        for i in (self.period + 1)..n {
            if tr[i].is_nan() {
                break;
            }
            prev = (prev * (period - 1.0) + tr[i]) / period;
            result[i] = prev;
        }
        result
    }
}
