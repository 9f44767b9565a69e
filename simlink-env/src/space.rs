//! Continuous box action spaces.

use rand::Rng;

/// Per-component `[low, high]` bounds for a fixed-length action vector.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpace {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl BoxSpace {
    /// Bounds are paired by index; the shorter side decides the dimension.
    pub fn new(low: impl Into<Vec<f64>>, high: impl Into<Vec<f64>>) -> Self {
        let mut low = low.into();
        let mut high = high.into();
        let dim = low.len().min(high.len());
        low.truncate(dim);
        high.truncate(dim);
        Self { low, high }
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    /// Clamp each component into its bounds. NaN maps to the lower bound.
    pub fn clip(&self, action: &[f64]) -> Vec<f64> {
        action
            .iter()
            .zip(self.low.iter().zip(&self.high))
            .map(|(&v, (&lo, &hi))| if v.is_nan() { lo } else { v.clamp(lo, hi) })
            .collect()
    }

    pub fn contains(&self, action: &[f64]) -> bool {
        action.len() == self.dim()
            && action
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(&v, (&lo, &hi))| (lo..=hi).contains(&v))
    }

    /// Uniform sample inside the bounds.
    pub fn sample(&self, rng: &mut impl Rng) -> Vec<f64> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&lo, &hi)| if hi > lo { rng.gen_range(lo..=hi) } else { lo })
            .collect()
    }
}
