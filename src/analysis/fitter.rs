use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::analysis::integrator::{covering_step, integrate};
use crate::analysis::objective::sse;
use crate::error::FitError;
use crate::models::{FitResult, ModelParameters, ParameterRange, TimeSeries, MAX_AXIS_VALUES};

/// Integration step used while scoring candidates.
pub const DEFAULT_SEARCH_STEP: f64 = 1.0;

/// Upper bound on grid cells in one search.
pub const MAX_GRID_CELLS: usize = 10_000_000;

/// Progress notification sent after each grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridProgress {
    /// Cells finished so far, including this one
    pub completed: usize,
    pub total: usize,
    pub params: ModelParameters,
    /// `None` when the candidate diverged
    pub sse: Option<f64>,
}

impl GridProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// Receives a notification after every evaluated grid cell.
///
/// In parallel mode notifications arrive from worker threads and `completed` counts cells in
/// completion order.
pub trait FitObserver: Sync {
    fn cell_evaluated(&self, progress: &GridProgress);
}

impl<F> FitObserver for F
where
    F: Fn(&GridProgress) + Sync,
{
    fn cell_evaluated(&self, progress: &GridProgress) {
        self(progress)
    }
}

/// Candidate counts of a search grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInfo {
    pub k_count: usize,
    pub gamma_count: usize,
    pub total_combinations: usize,
}

impl SearchInfo {
    pub fn new(k_range: &ParameterRange, gamma_range: &ParameterRange) -> Self {
        let k_count = k_range.count();
        let gamma_count = gamma_range.count();
        Self {
            k_count,
            gamma_count,
            total_combinations: k_count.saturating_mul(gamma_count),
        }
    }
}

/// Exhaustive grid search over (K, γ).
///
/// Candidates are enumerated K-outer, γ-inner. The best candidate is the first one with the
/// strictly smallest SSE in that order, in sequential and in parallel mode alike: parallel
/// evaluation collects scores in enumeration order before reducing.
pub struct GridSearchFitter<'a> {
    observed: &'a TimeSeries,
    k_range: ParameterRange,
    gamma_range: ParameterRange,
    step: f64,
    parallel: bool,
    observer: Option<&'a dyn FitObserver>,
}

impl<'a> GridSearchFitter<'a> {
    /// Create a fitter for `observed` over `k_range × gamma_range`.
    pub fn new(
        observed: &'a TimeSeries,
        k_range: ParameterRange,
        gamma_range: ParameterRange,
    ) -> Self {
        Self {
            observed,
            k_range,
            gamma_range,
            step: DEFAULT_SEARCH_STEP,
            parallel: false,
            observer: None,
        }
    }

    /// Integration step for candidate simulations.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Evaluate grid cells on the rayon thread pool.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn FitObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn search_info(&self) -> SearchInfo {
        SearchInfo::new(&self.k_range, &self.gamma_range)
    }

    /// All grid cells in enumeration order (K outer, γ inner).
    pub fn candidates(&self) -> Result<Vec<ModelParameters>, FitError> {
        check_axis("K", &self.k_range)?;
        check_axis("gamma", &self.gamma_range)?;
        let total = self.search_info().total_combinations;
        if total > MAX_GRID_CELLS {
            return Err(FitError::InvalidInput(format!(
                "search grid has {total} cells, more than the limit of {MAX_GRID_CELLS}"
            )));
        }
        let ks = self.k_range.values();
        let gammas = self.gamma_range.values();

        let mut out = Vec::with_capacity(ks.len() * gammas.len());
        for &k in &ks {
            for &gamma in &gammas {
                out.push(ModelParameters::new(gamma, k));
            }
        }
        Ok(out)
    }

    /// Simulate one candidate over the observed span and score it.
    ///
    /// `Ok(None)` means the simulation diverged.
    pub fn evaluate(&self, params: &ModelParameters) -> Result<Option<f64>, FitError> {
        let (t_start, v0) = self.observed.first();
        let (t_end, _) = self.observed.last();
        let trajectory = integrate(v0, t_start, t_end, self.search_step(), params.gamma, params.k)?;
        if trajectory.is_divergent() {
            return Ok(None);
        }
        Ok(sse(self.observed, &trajectory))
    }

    /// Integration step actually used, shrunk to the observed span when the span is shorter
    /// so the simulation always reaches the last observation.
    pub fn search_step(&self) -> f64 {
        let (t_start, _) = self.observed.first();
        let (t_end, _) = self.observed.last();
        covering_step(t_start, t_end, self.step)
    }

    /// Run the search.
    pub fn fit(&self) -> Result<FitResult, FitError> {
        let candidates = self.candidates()?;
        let total = candidates.len();
        let info = self.search_info();
        info!(
            k_candidates = info.k_count,
            gamma_candidates = info.gamma_count,
            total,
            step = self.search_step(),
            parallel = self.parallel,
            "starting grid search"
        );

        let scores = if self.parallel {
            self.score_parallel(&candidates)?
        } else {
            self.score_sequential(&candidates)?
        };

        let mut best: Option<(ModelParameters, f64)> = None;
        let mut diverged = 0;
        for (params, score) in candidates.iter().zip(scores) {
            match score {
                None => diverged += 1,
                Some(s) => {
                    if best.map_or(true, |(_, best_sse)| s < best_sse) {
                        best = Some((*params, s));
                    }
                }
            }
        }

        debug!(diverged, total, "grid search scored all candidates");

        let (params, best_sse) = best.ok_or(FitError::NoFeasibleFit { candidates: total })?;
        info!(
            gamma = params.gamma,
            k = params.k,
            sse = best_sse,
            "grid search finished"
        );

        Ok(FitResult {
            params,
            sse: best_sse,
            evaluated: total,
            diverged,
        })
    }

    fn score_sequential(
        &self,
        candidates: &[ModelParameters],
    ) -> Result<Vec<Option<f64>>, FitError> {
        let total = candidates.len();
        let mut scores = Vec::with_capacity(total);
        for (i, params) in candidates.iter().enumerate() {
            let score = self.evaluate(params)?;
            trace!(gamma = params.gamma, k = params.k, ?score, "scored candidate");
            self.notify(i + 1, total, params, score);
            scores.push(score);
        }
        Ok(scores)
    }

    fn score_parallel(&self, candidates: &[ModelParameters]) -> Result<Vec<Option<f64>>, FitError> {
        let total = candidates.len();
        let completed = AtomicUsize::new(0);
        candidates
            .par_iter()
            .map(|params| -> Result<Option<f64>, FitError> {
                let score = self.evaluate(params)?;
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                self.notify(done, total, params, score);
                Ok(score)
            })
            .collect()
    }

    fn notify(&self, completed: usize, total: usize, params: &ModelParameters, sse: Option<f64>) {
        if let Some(observer) = self.observer {
            observer.cell_evaluated(&GridProgress {
                completed,
                total,
                params: *params,
                sse,
            });
        }
    }
}

fn check_axis(axis: &'static str, range: &ParameterRange) -> Result<(), FitError> {
    let count = range.count();
    if count == 0 {
        return Err(FitError::DegenerateSearchSpace {
            axis,
            min: range.min,
            max: range.max,
            step: range.step,
        });
    }
    if count > MAX_AXIS_VALUES {
        return Err(FitError::InvalidInput(format!(
            "{axis} range [{}, {}) with step {} has more than {MAX_AXIS_VALUES} candidates",
            range.min, range.max, range.step
        )));
    }
    Ok(())
}

/// Fit with the default search step, sequentially.
///
/// # Examples
///
/// ```
/// use logistic_forecaster::analysis::{fit, integrate};
/// use logistic_forecaster::{ParameterRange, TimeSeries};
///
/// let truth = integrate(100.0, 0.0, 5.0, 1.0, 0.5, 1000.0).unwrap();
/// let observed = TimeSeries::new(truth.times().to_vec(), truth.values().to_vec()).unwrap();
///
/// let result = fit(
///     &observed,
///     ParameterRange::new(500.0, 1500.0, 250.0),
///     ParameterRange::new(0.25, 1.0, 0.25),
/// )
/// .unwrap();
/// assert_eq!(result.params.k, 1000.0);
/// assert_eq!(result.params.gamma, 0.5);
/// assert_eq!(result.sse, 0.0);
/// ```
pub fn fit(
    observed: &TimeSeries,
    k_range: ParameterRange,
    gamma_range: ParameterRange,
) -> Result<FitResult, FitError> {
    GridSearchFitter::new(observed, k_range, gamma_range).fit()
}
