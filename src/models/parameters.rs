use serde::{Deserialize, Serialize};

/// Logistic model parameters: growth rate γ and carrying capacity K.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Intrinsic growth rate γ
    pub gamma: f64,
    /// Carrying capacity K
    pub k: f64,
}

impl ModelParameters {
    pub fn new(gamma: f64, k: f64) -> Self {
        Self { gamma, k }
    }
}

impl std::fmt::Display for ModelParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "γ={:.4}, K={}", self.gamma, self.k)
    }
}

/// Upper bound on candidates per search axis.
pub const MAX_AXIS_VALUES: usize = 1_000_000;

/// One axis of the search grid.
///
/// Generates `min + i * step` for `i = 0, 1, …` while the value stays below `max`.
/// A non-positive step, `max <= min` or non-finite bounds give an empty axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParameterRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    fn is_degenerate(&self) -> bool {
        !(self.min.is_finite() && self.max.is_finite() && self.step.is_finite())
            || self.step <= 0.0
            || self.max <= self.min
    }

    /// Candidate values in ascending order, truncated to [`MAX_AXIS_VALUES`].
    ///
    /// # Examples
    ///
    /// ```
    /// use logistic_forecaster::ParameterRange;
    ///
    /// let r = ParameterRange::new(1.0, 2.0, 0.25);
    /// assert_eq!(r.values(), vec![1.0, 1.25, 1.5, 1.75]);
    /// assert!(ParameterRange::new(1.0, 1.0, 0.25).values().is_empty());
    /// ```
    pub fn values(&self) -> Vec<f64> {
        let n = self.count().min(MAX_AXIS_VALUES);
        // min + i * step, never a running sum
        (0..n).map(|i| self.value_at(i)).collect()
    }

    /// Number of candidates on this axis, computed without materialising them.
    pub fn count(&self) -> usize {
        if self.is_degenerate() {
            return 0;
        }
        let upper = ((self.max - self.min) / self.step).ceil() as usize;
        let mut n = upper.saturating_add(1);
        while n > 0 && self.value_at(n - 1) >= self.max {
            n -= 1;
        }
        n
    }

    /// True when the axis holds more than [`MAX_AXIS_VALUES`] candidates.
    pub fn is_oversized(&self) -> bool {
        self.count() > MAX_AXIS_VALUES
    }

    fn value_at(&self, i: usize) -> f64 {
        self.min + i as f64 * self.step
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Outcome of a grid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Best-scoring parameters (first seen wins on ties)
    pub params: ModelParameters,
    /// Sum of squared errors of the best candidate
    pub sse: f64,
    /// Total grid cells evaluated
    pub evaluated: usize,
    /// Grid cells discarded because their simulation diverged
    pub diverged: usize,
}

impl FitResult {
    /// Root-mean-square error over `n` observations.
    pub fn rmse(&self, n: usize) -> f64 {
        if n == 0 {
            return 0.0;
        }
        (self.sse / n as f64).sqrt()
    }
}
