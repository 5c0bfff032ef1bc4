mod charts;
mod tables;

pub use charts::{format_forecast_chart, print_forecast_chart, ChartOptions};
pub use tables::{
    format_fit_result, print_fit_result,
    format_search_settings, print_search_settings,
    format_series_summary, print_series_summary,
    format_trajectory_table, print_trajectory_table,
};
