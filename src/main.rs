use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use logistic_forecaster::{
    analysis::{Analyzer, GridProgress},
    io::{self, FitReport},
    visualization::{
        print_fit_result, print_forecast_chart, print_search_settings, print_series_summary,
        print_trajectory_table, ChartOptions,
    },
    FitConfig, ParameterRange,
};

#[derive(Parser)]
#[command(
    name = "logistic-fit",
    about = "Logistic growth fitter - RK4 grid search and forecasting",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the `[search]` grid.
#[derive(Args, Default)]
struct GridArgs {
    /// Lower bound of the carrying capacity grid (inclusive)
    #[arg(long)]
    k_min: Option<f64>,

    /// Upper bound of the carrying capacity grid (exclusive)
    #[arg(long)]
    k_max: Option<f64>,

    /// Carrying capacity grid step
    #[arg(long)]
    k_step: Option<f64>,

    /// Lower bound of the growth rate grid (inclusive)
    #[arg(long)]
    gamma_min: Option<f64>,

    /// Upper bound of the growth rate grid (exclusive)
    #[arg(long)]
    gamma_max: Option<f64>,

    /// Growth rate grid step
    #[arg(long)]
    gamma_step: Option<f64>,

    /// Evaluate grid cells in parallel
    #[arg(long)]
    parallel: bool,
}

impl GridArgs {
    fn apply(&self, config: &mut FitConfig) {
        let search = &mut config.search;
        search.k = override_range(search.k, self.k_min, self.k_max, self.k_step);
        search.gamma = override_range(search.gamma, self.gamma_min, self.gamma_max, self.gamma_step);
        if self.parallel {
            search.parallel = true;
        }
    }
}

fn override_range(
    range: ParameterRange,
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
) -> ParameterRange {
    ParameterRange::new(
        min.unwrap_or(range.min),
        max.unwrap_or(range.max),
        step.unwrap_or(range.step),
    )
}

#[derive(Subcommand)]
enum Commands {
    /// Fit growth rate and carrying capacity to an observed series
    Fit {
        /// Path to input file (CSV, JSON, or Excel)
        #[arg(short, long)]
        input: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        grid: GridArgs,

        /// Print the fit report as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Fit, then forecast the trajectory
    Forecast {
        /// Path to input file (CSV, JSON, or Excel)
        #[arg(short, long)]
        input: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        grid: GridArgs,

        /// Last time to forecast
        #[arg(short, long)]
        end_time: Option<f64>,

        /// Forecast integration step
        #[arg(short, long)]
        step: Option<f64>,

        /// Write the forecast trajectory (CSV, JSON, or Excel)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show an ASCII chart of the forecast
        #[arg(long)]
        chart: bool,

        /// Maximum rows in the trajectory table
        #[arg(long, default_value = "20")]
        rows: usize,
    },

    /// Full pipeline: read the workbook in a directory, fit, forecast and write results
    Run {
        /// Directory holding the input workbook
        #[arg(long, default_value = "input")]
        input_dir: PathBuf,

        /// Directory receiving fit_curve.csv, forecast.csv and report.json
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Transcribe the first sheet of a workbook to a markdown table
    Transcript {
        /// Excel workbook
        #[arg(short, long)]
        input: PathBuf,

        /// Markdown output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the default configuration as TOML
    InitConfig {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<FitConfig> {
    match path {
        Some(path) => FitConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(FitConfig::default()),
    }
}

fn load_series(path: &Path, config: &FitConfig) -> Result<logistic_forecaster::TimeSeries> {
    io::read_series(path, &config.input)
        .with_context(|| format!("failed to read {}", path.display()))
}

fn progress_reporter(total: usize) -> impl Fn(&GridProgress) + Sync {
    let every = (total / 10).max(1);
    move |p: &GridProgress| {
        if p.completed % every == 0 || p.completed == p.total {
            eprint!("\r  Searching grid... {:>3.0}%", p.fraction() * 100.0);
            if p.completed == p.total {
                eprintln!();
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fit {
            input,
            config,
            grid,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            grid.apply(&mut config);
            config.validate()?;
            let series = load_series(&input, &config)?;

            let analyzer = Analyzer::new(&series, &config);
            let fit = analyzer.fit()?;

            if json {
                let report = FitReport::new(&series, analyzer.search_info(), &fit);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "\n{}",
                    format!("Logistic Fit: {}", input.display()).bold().cyan()
                );
                print_series_summary(&series.summary());
                print_fit_result(&fit, series.len());
            }
        }

        Commands::Forecast {
            input,
            config,
            grid,
            end_time,
            step,
            output,
            chart,
            rows,
        } => {
            let mut config = load_config(config.as_deref())?;
            grid.apply(&mut config);
            if let Some(end_time) = end_time {
                config.forecast.end_time = end_time;
            }
            if let Some(step) = step {
                config.forecast.step = step;
            }
            config.validate()?;
            let series = load_series(&input, &config)?;

            let analyzer = Analyzer::new(&series, &config);
            let fit = analyzer.fit()?;
            let forecast = analyzer.forecast(&fit)?;

            println!(
                "\n{}",
                format!("Logistic Forecast: {}", input.display()).bold().cyan()
            );
            print_fit_result(&fit, series.len());
            print_trajectory_table(&forecast, rows, config.forecast.start_year);
            if chart {
                let options = ChartOptions::default().with_start_year(config.forecast.start_year);
                print_forecast_chart(&series, &forecast, &options);
            }

            if let Some(output) = output {
                io::writer_for(&output)?.write(&forecast, &output)?;
                println!(
                    "{} Wrote forecast to {}",
                    "Success:".green().bold(),
                    output.display()
                );
            }
        }

        Commands::Run {
            input_dir,
            output_dir,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            print_search_settings(&config);

            let input = io::find_single_input(&input_dir)?;
            let series = io::read_excel(&input, &config.input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            println!(
                "\n{} Loaded {} points from {}",
                "Data:".green().bold(),
                series.len(),
                input.display()
            );
            print_series_summary(&series.summary());

            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("failed to create {}", output_dir.display()))?;

            let analyzer = Analyzer::new(&series, &config);
            let reporter = progress_reporter(analyzer.search_info().total_combinations);
            let run = analyzer.run(Some(&reporter))?;
            println!(
                "\n{} γ={:.4}, K={}, SSE={:.2}",
                "Fit:".green().bold(),
                run.fit.params.gamma,
                run.fit.params.k,
                run.fit.sse
            );
            print_fit_result(&run.fit, series.len());

            let options = ChartOptions::default().with_start_year(config.forecast.start_year);
            print_forecast_chart(&series, &run.forecast, &options);

            let fit_curve_path = output_dir.join("fit_curve.csv");
            let forecast_path = output_dir.join("forecast.csv");
            let report_path = output_dir.join("report.json");
            io::write_trajectory_csv(&run.fitted_curve, &fit_curve_path)?;
            io::write_trajectory_csv(&run.forecast, &forecast_path)?;
            let report = FitReport::new(&series, analyzer.search_info(), &run.fit)
                .with_forecast(&run.forecast, config.forecast.step);
            io::write_report_json(&report, &report_path, true)?;

            println!(
                "\n{} Pipeline complete. Results written to {}",
                "Success:".green().bold(),
                output_dir.display()
            );
        }

        Commands::Transcript { input, output } => {
            let markdown = io::excel_to_markdown(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            match output {
                Some(output) => {
                    std::fs::write(&output, markdown)?;
                    println!(
                        "{} Transcribed {} -> {}",
                        "Success:".green().bold(),
                        input.display(),
                        output.display()
                    );
                }
                None => print!("{markdown}"),
            }
        }

        Commands::InitConfig { output } => {
            if output.exists() {
                anyhow::bail!("{} already exists", output.display());
            }
            FitConfig::default().save(&output)?;
            println!(
                "{} Wrote default configuration to {}",
                "Success:".green().bold(),
                output.display()
            );
        }
    }

    Ok(())
}
