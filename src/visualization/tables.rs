use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, ContentArrangement, Table};

use crate::config::FitConfig;
use crate::models::{FitResult, SeriesSummary, Trajectory};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn title(output: &mut String, text: &str, rule: usize) {
    output.push_str(&format!("\n{}\n", text.bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(rule)));
}

/// Format the search settings (grid axes, forecast horizon) as a string.
pub fn format_search_settings(config: &FitConfig) -> String {
    let mut output = String::new();
    title(&mut output, "Search Settings", 50);

    let info = config.search_info();
    let mut table = new_table(vec!["Setting", "Value"]);
    let k = &config.search.k;
    let gamma = &config.search.gamma;
    table.add_row(vec![
        Cell::new("K range"),
        Cell::new(format!("[{}, {}) step {} ({} values)", k.min, k.max, k.step, info.k_count)),
    ]);
    table.add_row(vec![
        Cell::new("γ range"),
        Cell::new(format!(
            "[{}, {}) step {} ({} values)",
            gamma.min, gamma.max, gamma.step, info.gamma_count
        )),
    ]);
    table.add_row(vec![
        Cell::new("Combinations"),
        Cell::new(format!("{}", info.total_combinations)),
    ]);
    table.add_row(vec![
        Cell::new("Search step"),
        Cell::new(format!("{}", config.search.step)),
    ]);
    table.add_row(vec![
        Cell::new("Forecast end"),
        Cell::new(format!("{}", config.forecast.end_time)),
    ]);
    if let Some(year) = config.forecast.start_year {
        table.add_row(vec![Cell::new("Start year"), Cell::new(format!("{year}"))]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print the search settings table.
pub fn print_search_settings(config: &FitConfig) {
    print!("{}", format_search_settings(config));
}

/// Format a series summary table as a string.
pub fn format_series_summary(summary: &SeriesSummary) -> String {
    let mut output = String::new();
    title(&mut output, "Observed Series", 50);

    let mut table = new_table(vec!["Statistic", "Time", "Value"]);
    table.add_row(vec![
        Cell::new("Points"),
        Cell::new(format!("{}", summary.data_points)),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Min"),
        Cell::new(format!("{:.2}", summary.time_min)),
        Cell::new(format!("{:.2}", summary.value_min)),
    ]);
    table.add_row(vec![
        Cell::new("Max"),
        Cell::new(format!("{:.2}", summary.time_max)),
        Cell::new(format!("{:.2}", summary.value_max)),
    ]);
    table.add_row(vec![
        Cell::new("Mean"),
        Cell::new(format!("{:.2}", summary.time_mean)),
        Cell::new(format!("{:.2}", summary.value_mean)),
    ]);
    table.add_row(vec![
        Cell::new("Std Dev"),
        Cell::new(format!("{:.2}", summary.time_std)),
        Cell::new(format!("{:.2}", summary.value_std)),
    ]);

    output.push_str(&format!("{table}"));
    output
}

/// Print a series summary table.
pub fn print_series_summary(summary: &SeriesSummary) {
    print!("{}", format_series_summary(summary));
}

/// Format the grid-search outcome as a string.
pub fn format_fit_result(fit: &FitResult, observations: usize) -> String {
    let mut output = String::new();
    title(&mut output, "Fitted Parameters", 50);

    let mut table = new_table(vec!["Parameter", "Value"]);
    table.add_row(vec![
        Cell::new("Growth rate (γ)"),
        Cell::new(format!("{:.4}", fit.params.gamma)),
    ]);
    table.add_row(vec![
        Cell::new("Carrying capacity (K)"),
        Cell::new(format!("{}", fit.params.k)),
    ]);
    table.add_row(vec![Cell::new("SSE"), Cell::new(format!("{:.2}", fit.sse))]);
    table.add_row(vec![
        Cell::new("RMSE"),
        Cell::new(format!("{:.4}", fit.rmse(observations))),
    ]);
    table.add_row(vec![
        Cell::new("Candidates evaluated"),
        Cell::new(format!("{}", fit.evaluated)),
    ]);
    table.add_row(vec![
        Cell::new("Candidates diverged"),
        Cell::new(format!("{}", fit.diverged)),
    ]);

    output.push_str(&format!("{table}"));
    output
}

/// Print the grid-search outcome.
pub fn print_fit_result(fit: &FitResult, observations: usize) {
    print!("{}", format_fit_result(fit, observations));
}

/// Evenly spaced row indices, at most `max_rows`, always ending at the last row.
fn sample_indices(len: usize, max_rows: usize) -> Vec<usize> {
    let max_rows = max_rows.max(2);
    if len <= max_rows {
        return (0..len).collect();
    }
    let stride = (len - 1).div_ceil(max_rows - 1);
    let mut indices: Vec<usize> = (0..len - 1).step_by(stride).collect();
    indices.push(len - 1);
    indices
}

/// Format a trajectory as a table of at most `max_rows` sampled rows.
///
/// With a `start_year`, a calendar year column is added.
pub fn format_trajectory_table(
    trajectory: &Trajectory,
    max_rows: usize,
    start_year: Option<i32>,
) -> String {
    let mut output = String::new();
    title(&mut output, "Trajectory", 60);

    let mut header = vec!["Time"];
    if start_year.is_some() {
        header.push("Year");
    }
    header.push("Value");
    let mut table = new_table(header);

    let times = trajectory.times();
    let values = trajectory.values();
    for idx in sample_indices(trajectory.len(), max_rows) {
        let mut row = vec![Cell::new(format!("{:.2}", times[idx]))];
        if let Some(year) = start_year {
            row.push(Cell::new(format!("{:.1}", f64::from(year) + times[idx])));
        }
        let value = values[idx];
        row.push(if value.is_finite() {
            Cell::new(format!("{value:.2}"))
        } else {
            Cell::new("diverged")
        });
        table.add_row(row);
    }

    output.push_str(&format!("{table}"));
    if let Some(at) = trajectory.diverged_at() {
        output.push_str(&format!(
            "\n{}\n",
            format!("Simulation diverged at t = {}", times[at]).red()
        ));
    }
    output
}

/// Print a sampled trajectory table.
pub fn print_trajectory_table(trajectory: &Trajectory, max_rows: usize, start_year: Option<i32>) {
    print!("{}", format_trajectory_table(trajectory, max_rows, start_year));
}
