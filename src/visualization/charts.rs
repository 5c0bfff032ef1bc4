use colored::Colorize;

use crate::models::{TimeSeries, Trajectory};

/// Layout of the forecast chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub width: usize,
    pub height: usize,
    /// Calendar year of time 0; the axis is labelled in years when set
    pub start_year: Option<i32>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 72,
            height: 20,
            start_year: None,
        }
    }
}

impl ChartOptions {
    pub fn with_start_year(mut self, start_year: Option<i32>) -> Self {
        self.start_year = start_year;
        self
    }
}

/// Format the forecast chart as a string.
///
/// The forecast curve is drawn with `-`, observed points with `o`, and the end of the
/// observations is marked with `|`.
pub fn format_forecast_chart(
    observed: &TimeSeries,
    forecast: &Trajectory,
    options: &ChartOptions,
) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Logistic Forecast".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(options.width.max(10))));

    let (t_min, t_max) = time_range(observed, forecast);
    let Some((y_min, y_max)) = value_range(observed, forecast) else {
        output.push_str("  No finite values to plot.\n");
        return output;
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let (x_label, x_lo, x_hi) = match options.start_year {
        Some(year) => ("year", t_min + f64::from(year), t_max + f64::from(year)),
        None => ("t", t_min, t_max),
    };
    output.push_str(&format!(
        "{x_label}=[{x_lo:.1}, {x_hi:.1}] | value=[{y_min:.2}, {y_max:.2}]\n"
    ));

    let grid = render_grid(observed, forecast, options, (t_min, t_max), (y_min, y_max));
    for row in grid {
        output.push_str(&row);
        output.push('\n');
    }
    output.push_str("  - forecast   o observed   | end of observations\n");
    output
}

/// Print the forecast chart.
pub fn print_forecast_chart(observed: &TimeSeries, forecast: &Trajectory, options: &ChartOptions) {
    print!("{}", format_forecast_chart(observed, forecast, options));
}

fn render_grid(
    observed: &TimeSeries,
    forecast: &Trajectory,
    options: &ChartOptions,
    (t_min, t_max): (f64, f64),
    (y_min, y_max): (f64, f64),
) -> Vec<String> {
    let width = options.width.max(10);
    let height = options.height.max(5);
    let mut grid = vec![vec![' '; width]; height];

    // Curve first so the markers overlay it; a divergent tail breaks the line.
    let mut prev = None;
    for (t, v) in forecast.points() {
        if !v.is_finite() {
            prev = None;
            continue;
        }
        let x = map_x(t, t_min, t_max, width);
        let y = map_y(v, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, y, '-'),
            None => grid[y][x] = '-',
        }
        prev = Some((x, y));
    }

    let (t_last, _) = observed.last();
    let marker = map_x(t_last, t_min, t_max, width);
    for row in grid.iter_mut() {
        if row[marker] == ' ' {
            row[marker] = '|';
        }
    }

    for (t, v) in observed.points() {
        let x = map_x(t, t_min, t_max, width);
        let y = map_y(v, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}

fn time_range(observed: &TimeSeries, forecast: &Trajectory) -> (f64, f64) {
    let (mut lo, _) = observed.first();
    let (mut hi, _) = observed.last();
    if let (Some(&first), Some((last, _))) = (forecast.times().first(), forecast.last()) {
        lo = lo.min(first);
        hi = hi.max(last);
    }
    if hi > lo {
        (lo, hi)
    } else {
        (lo, lo + 1.0)
    }
}

fn value_range(observed: &TimeSeries, forecast: &Trajectory) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &v in observed.value().iter().chain(forecast.values()) {
        if v.is_finite() {
            min_y = min_y.min(v);
            max_y = max_y.max(v);
        }
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        Some((min_y - 1.0, max_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // row 0 is the top
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (mut x0, mut y0) = (x0 as isize, y0 as isize);
    let (x1, y1) = (x1 as isize, y1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        grid[y0 as usize][x0 as usize] = ch;
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::integrate;

    fn observed() -> TimeSeries {
        TimeSeries::new(
            vec![0.0, 10.0, 20.0, 30.0],
            vec![100.0, 250.0, 500.0, 700.0],
        )
        .unwrap()
    }

    fn count(grid: &[String], ch: char) -> usize {
        grid.iter().map(|row| row.chars().filter(|&c| c == ch).count()).sum()
    }

    #[test]
    fn test_grid_dimensions_and_markers() {
        let obs = observed();
        let forecast = integrate(100.0, 0.0, 100.0, 0.5, 0.1, 1000.0).unwrap();
        let options = ChartOptions::default();
        let (t_range, y_range) = (
            time_range(&obs, &forecast),
            pad_range(100.0, 1000.0, 0.05),
        );
        let grid = render_grid(&obs, &forecast, &options, t_range, y_range);

        assert_eq!(grid.len(), 20);
        assert!(grid.iter().all(|row| row.chars().count() == 72));
        assert_eq!(count(&grid, 'o'), 4);
        assert!(count(&grid, '-') > 50);
        assert!(count(&grid, '|') > 0);

        // the end-of-observations marker sits in the column of the last observation
        let col = map_x(30.0, 0.0, 100.0, 72);
        assert!(grid
            .iter()
            .all(|row| matches!(row.chars().nth(col), Some('|') | Some('-') | Some('o'))));
    }

    #[test]
    fn test_curve_reaches_last_column() {
        let obs = observed();
        let forecast = integrate(100.0, 0.0, 100.0, 0.5, 0.1, 1000.0).unwrap();
        let options = ChartOptions::default();
        let grid = render_grid(
            &obs,
            &forecast,
            &options,
            time_range(&obs, &forecast),
            pad_range(100.0, 1000.0, 0.05),
        );
        assert!(grid.iter().any(|row| row.ends_with('-')));
    }

    #[test]
    fn test_format_chart_header_in_years() {
        let obs = observed();
        let forecast = integrate(100.0, 0.0, 50.0, 0.5, 0.1, 1000.0).unwrap();
        let options = ChartOptions::default().with_start_year(Some(1950));
        let output = format_forecast_chart(&obs, &forecast, &options);
        assert!(output.contains("Logistic Forecast"));
        assert!(output.contains("year=[1950.0, 2000.0]"));
        assert!(output.contains("end of observations"));
    }

    #[test]
    fn test_divergent_tail_is_not_drawn() {
        let obs = TimeSeries::new(vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        let forecast = integrate(1e200, 0.0, 3.0, 1.0, 1.0, 1.0).unwrap();
        let output = format_forecast_chart(&obs, &forecast, &ChartOptions::default());
        assert!(output.contains("t=[0.0, 3.0]"));
    }

    #[test]
    fn test_small_options_are_clamped() {
        let obs = observed();
        let forecast = integrate(100.0, 0.0, 40.0, 1.0, 0.1, 1000.0).unwrap();
        let options = ChartOptions {
            width: 1,
            height: 1,
            start_year: None,
        };
        let grid = render_grid(
            &obs,
            &forecast,
            &options,
            time_range(&obs, &forecast),
            pad_range(100.0, 1000.0, 0.05),
        );
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0].chars().count(), 10);
    }
}
