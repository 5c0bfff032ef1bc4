use serde::{Deserialize, Serialize};

/// Value used for every sample after a simulation overflowed.
pub const DIVERGENCE_SENTINEL: f64 = f64::INFINITY;

/// An integrated (time, value) curve with evenly spaced time samples.
///
/// A diverged simulation keeps its full length; the samples from the first non-finite step
/// onward hold [`DIVERGENCE_SENTINEL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    times: Vec<f64>,
    values: Vec<f64>,
    diverged_at: Option<usize>,
}

impl Trajectory {
    pub(crate) fn from_parts(times: Vec<f64>, values: Vec<f64>, diverged_at: Option<usize>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self {
            times,
            values,
            diverged_at,
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Index of the first sentinel sample, if the simulation diverged.
    pub fn diverged_at(&self) -> Option<usize> {
        self.diverged_at
    }

    pub fn is_divergent(&self) -> bool {
        self.diverged_at.is_some()
    }

    /// Iterate over `(time, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.times.last()?, *self.values.last()?))
    }
}
