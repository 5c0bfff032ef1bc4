use tracing::trace;

use crate::error::FitError;
use crate::models::{Trajectory, DIVERGENCE_SENTINEL};

/// Carrying capacities closer to zero than this produce a zero derivative.
pub const CAPACITY_EPSILON: f64 = 1e-12;

/// Upper bound on samples per integration run.
pub const MAX_SAMPLES: usize = 10_000_000;

/// Logistic law `dv/dt = γ·v·(1 − v/K)`.
///
/// Returns zero everywhere when `|K| < CAPACITY_EPSILON`.
pub fn logistic_derivative(v: f64, gamma: f64, k: f64) -> f64 {
    if k.abs() < CAPACITY_EPSILON {
        return 0.0;
    }
    gamma * v * (1.0 - v / k)
}

/// Number of samples an integration over `[t_start, t_end]` with step `dt` produces.
///
/// Zero when the arguments describe no integration (non-positive step, reversed or non-finite
/// span).
pub fn sample_count(t_start: f64, t_end: f64, dt: f64) -> usize {
    if !(dt > 0.0 && t_end >= t_start && (t_end - t_start).is_finite()) {
        return 0;
    }
    (((t_end - t_start) / dt).floor() as usize).saturating_add(1)
}

/// Step that still reaches `t_end` in one stride when the span is shorter than `dt`.
pub fn covering_step(t_start: f64, t_end: f64, dt: f64) -> f64 {
    let span = t_end - t_start;
    if span > 0.0 && dt > span {
        span
    } else {
        dt
    }
}

/// Integrate the logistic equation with classical fixed-step RK4.
///
/// Time samples are spaced linearly across `[t_start, t_end]` using
/// `floor((t_end - t_start) / dt) + 1` points, and each RK4 step advances by that realized
/// spacing. The first non-finite step fills the rest of the trajectory with
/// [`DIVERGENCE_SENTINEL`] and stops.
///
/// # Examples
///
/// ```
/// use logistic_forecaster::analysis::integrate;
///
/// let traj = integrate(10.0, 0.0, 4.0, 1.0, 0.5, 100.0).unwrap();
/// assert_eq!(traj.len(), 5);
/// assert_eq!(traj.times()[4], 4.0);
/// assert!(traj.values()[4] > 10.0 && traj.values()[4] < 100.0);
/// ```
pub fn integrate(
    v0: f64,
    t_start: f64,
    t_end: f64,
    dt: f64,
    gamma: f64,
    k: f64,
) -> Result<Trajectory, FitError> {
    validate_span(v0, t_start, t_end, dt)?;

    let n = sample_count(t_start, t_end, dt);
    let times = linspace(t_start, t_end, n);
    let h = if n > 1 {
        (t_end - t_start) / (n - 1) as f64
    } else {
        0.0
    };

    let mut values = Vec::with_capacity(n);
    values.push(v0);
    let mut diverged_at = None;

    for i in 1..n {
        let v = values[i - 1];
        let k1 = h * logistic_derivative(v, gamma, k);
        let k2 = h * logistic_derivative(v + k1 / 2.0, gamma, k);
        let k3 = h * logistic_derivative(v + k2 / 2.0, gamma, k);
        let k4 = h * logistic_derivative(v + k3, gamma, k);
        let next = v + (k1 + 2.0 * k2 + 2.0 * k3 + k4) / 6.0;

        if !next.is_finite() {
            trace!(step = i, gamma, k, "integration diverged");
            diverged_at = Some(i);
            values.resize(n, DIVERGENCE_SENTINEL);
            break;
        }
        values.push(next);
    }

    Ok(Trajectory::from_parts(times, values, diverged_at))
}

fn validate_span(v0: f64, t_start: f64, t_end: f64, dt: f64) -> Result<(), FitError> {
    if !(v0.is_finite() && t_start.is_finite() && t_end.is_finite()) {
        return Err(FitError::InvalidInput(format!(
            "integration bounds must be finite (v0={v0}, t_start={t_start}, t_end={t_end})"
        )));
    }
    if !(dt.is_finite() && dt > 0.0) {
        return Err(FitError::InvalidInput(format!(
            "integration step must be positive, got {dt}"
        )));
    }
    if t_end < t_start {
        return Err(FitError::InvalidInput(format!(
            "integration end {t_end} precedes start {t_start}"
        )));
    }
    let steps = ((t_end - t_start) / dt).floor();
    if steps >= MAX_SAMPLES as f64 {
        return Err(FitError::InvalidInput(format!(
            "step {dt} over [{t_start}, {t_end}] needs more than {MAX_SAMPLES} samples"
        )));
    }
    Ok(())
}

/// `n` evenly spaced points from `start` to `end`, both endpoints exact.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    let mut out: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
    out[n - 1] = end;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use proptest::prelude::*;

    fn analytic(v0: f64, gamma: f64, k: f64, t: f64) -> f64 {
        k / (1.0 + ((k - v0) / v0) * (-gamma * t).exp())
    }

    #[test]
    fn test_derivative_law() {
        assert_approx_eq!(logistic_derivative(50.0, 0.2, 100.0), 5.0);
        assert_eq!(logistic_derivative(100.0, 0.2, 100.0), 0.0);
        assert_eq!(logistic_derivative(0.0, 0.2, 100.0), 0.0);
    }

    #[test]
    fn test_near_zero_capacity_gives_zero_derivative() {
        assert_eq!(logistic_derivative(50.0, 0.2, 0.0), 0.0);
        assert_eq!(logistic_derivative(50.0, 0.2, 1e-15), 0.0);
        assert_eq!(logistic_derivative(50.0, 0.2, -1e-15), 0.0);
    }

    #[test]
    fn test_zero_capacity_trajectory_is_constant() {
        let traj = integrate(7.0, 0.0, 5.0, 1.0, 0.3, 0.0).unwrap();
        assert!(!traj.is_divergent());
        assert!(traj.values().iter().all(|&v| v == 7.0));
    }

    #[test]
    fn test_sample_times_exact_multiple() {
        let traj = integrate(1.0, 0.0, 4.0, 1.0, 0.1, 10.0).unwrap();
        assert_eq!(traj.times(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_sample_times_non_multiple_use_linear_spacing() {
        // floor(1.0 / 0.3) + 1 = 4 samples over [0, 1]
        let traj = integrate(1.0, 0.0, 1.0, 0.3, 0.1, 10.0).unwrap();
        assert_eq!(traj.len(), 4);
        assert_eq!(traj.times()[0], 0.0);
        assert_eq!(traj.times()[3], 1.0);
        assert_approx_eq!(traj.times()[1], 1.0 / 3.0, 1e-15);
    }

    #[test]
    fn test_sample_count_rejects_invalid_arguments() {
        assert_eq!(sample_count(0.0, 1.0, 0.0), 0);
        assert_eq!(sample_count(0.0, 1.0, -1.0), 0);
        assert_eq!(sample_count(0.0, 1.0, f64::NAN), 0);
        assert_eq!(sample_count(1.0, 0.0, 0.5), 0);
        assert_eq!(sample_count(0.0, f64::INFINITY, 0.5), 0);
        assert_eq!(sample_count(0.0, 1.0, 1e-300), usize::MAX);
        assert_eq!(sample_count(2.0, 2.0, 0.5), 1);
    }

    #[test]
    fn test_covering_step() {
        assert_eq!(covering_step(0.0, 0.9, 1.0), 0.9);
        assert_eq!(covering_step(0.0, 5.0, 1.0), 1.0);
        assert_eq!(covering_step(2.0, 2.0, 1.0), 1.0);
        assert_eq!(sample_count(0.0, 0.9, covering_step(0.0, 0.9, 1.0)), 2);
    }

    #[test]
    fn test_degenerate_span_single_sample() {
        let traj = integrate(3.0, 2.0, 2.0, 0.5, 0.1, 10.0).unwrap();
        assert_eq!(traj.len(), 1);
        assert_eq!(traj.values(), &[3.0]);
    }

    #[test]
    fn test_matches_analytic_solution() {
        let (v0, gamma, k) = (10.0, 0.5, 100.0);
        let traj = integrate(v0, 0.0, 10.0, 0.01, gamma, k).unwrap();
        for (t, v) in traj.points() {
            assert!((v - analytic(v0, gamma, k, t)).abs() < 1e-6, "t={t}");
        }
    }

    #[test]
    fn test_equilibria_are_fixed_points() {
        let at_capacity = integrate(100.0, 0.0, 20.0, 0.5, 0.4, 100.0).unwrap();
        assert!(at_capacity.values().iter().all(|&v| v == 100.0));

        let extinct = integrate(0.0, 0.0, 20.0, 0.5, 0.4, 100.0).unwrap();
        assert!(extinct.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_divergence_fills_tail_with_sentinel() {
        let traj = integrate(1e200, 0.0, 5.0, 1.0, 1.0, 1.0).unwrap();
        assert_eq!(traj.len(), 6);
        assert_eq!(traj.diverged_at(), Some(1));
        assert_eq!(traj.values()[0], 1e200);
        assert!(traj.values()[1..].iter().all(|&v| v == DIVERGENCE_SENTINEL));
    }

    #[test]
    fn test_divergence_after_some_finite_steps() {
        // A large step makes the update overshoot far below zero and blow up over a few steps.
        let traj = integrate(0.5, 0.0, 20.0, 1.0, 50.0, 1.0).unwrap();
        assert_eq!(traj.len(), 21);
        let k = traj.diverged_at().expect("should diverge");
        assert!(k > 1);
        assert!(traj.values()[..k].iter().all(|v| v.is_finite()));
        assert!(traj.values()[k..].iter().all(|&v| v == DIVERGENCE_SENTINEL));
    }

    #[test]
    fn test_deterministic() {
        let a = integrate(500_000.0, 0.0, 50.0, 0.1, 0.03, 2_500_000.0).unwrap();
        let b = integrate(500_000.0, 0.0, 50.0, 0.1, 0.03, 2_500_000.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        assert!(integrate(1.0, 0.0, 1.0, 0.0, 0.1, 10.0).is_err());
        assert!(integrate(1.0, 0.0, 1.0, -0.1, 0.1, 10.0).is_err());
        assert!(integrate(1.0, 0.0, 1.0, f64::NAN, 0.1, 10.0).is_err());
        assert!(integrate(1.0, 2.0, 1.0, 0.1, 0.1, 10.0).is_err());
        assert!(integrate(f64::INFINITY, 0.0, 1.0, 0.1, 0.1, 10.0).is_err());
        assert!(integrate(1.0, 0.0, 1.0, 1e-12, 0.1, 10.0).is_err());
    }

    proptest! {
        #[test]
        fn prop_length_and_endpoints(
            t_start in -100.0f64..100.0,
            span in 0.0f64..50.0,
            dt in 0.01f64..5.0,
            v0 in 0.0f64..1000.0,
        ) {
            let t_end = t_start + span;
            let traj = integrate(v0, t_start, t_end, dt, 0.1, 1000.0).unwrap();
            prop_assert_eq!(traj.len(), sample_count(t_start, t_end, dt));
            prop_assert_eq!(traj.times()[0], t_start);
            prop_assert_eq!(traj.values()[0], v0);
            if traj.len() > 1 {
                prop_assert_eq!(*traj.times().last().unwrap(), t_end);
            }
            for w in traj.times().windows(2) {
                prop_assert!(w[0] <= w[1]);
            }
        }
    }
}
