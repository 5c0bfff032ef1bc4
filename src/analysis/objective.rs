use crate::models::{TimeSeries, Trajectory};

/// Piecewise-linear interpolation of `(xs, ys)` at `x`.
///
/// `xs` must be non-decreasing. Outside the sampled range the nearest end value is returned.
/// At a knot the sample value is returned exactly, even when its neighbour is non-finite.
/// Empty or mismatched samples and a non-finite `x` give NaN.
pub fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let n = xs.len();
    if n == 0 || n != ys.len() || !x.is_finite() {
        return f64::NAN;
    }
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }

    // First index with xs[idx] > x; xs[0] < x < xs[n-1] keeps it in 1..n.
    let idx = xs.partition_point(|&t| t <= x);
    let lo = idx - 1;
    if xs[lo] == x {
        return ys[lo];
    }
    let (x0, x1) = (xs[lo], xs[idx]);
    let (y0, y1) = (ys[lo], ys[idx]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Simulated values at each observed time.
pub fn align(observed: &TimeSeries, simulated: &Trajectory) -> Vec<f64> {
    observed
        .time()
        .iter()
        .map(|&t| interpolate(simulated.times(), simulated.values(), t))
        .collect()
}

/// Sum of squared errors between the observed values and the simulated curve.
///
/// Returns `None` when any aligned value (or the sum itself) is non-finite, marking the
/// candidate as invalid.
///
/// # Examples
///
/// ```
/// use logistic_forecaster::analysis::{integrate, sse};
/// use logistic_forecaster::TimeSeries;
///
/// let observed = TimeSeries::new(vec![0.0, 1.0], vec![10.0, 10.0]).unwrap();
/// let flat = integrate(10.0, 0.0, 1.0, 0.5, 0.0, 100.0).unwrap();
/// assert_eq!(sse(&observed, &flat), Some(0.0));
/// ```
pub fn sse(observed: &TimeSeries, simulated: &Trajectory) -> Option<f64> {
    let mut total = 0.0;
    for (&v, model) in observed.value().iter().zip(align(observed, simulated)) {
        if !model.is_finite() {
            return None;
        }
        total += (v - model).powi(2);
    }
    total.is_finite().then_some(total)
}
