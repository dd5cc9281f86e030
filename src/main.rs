//! CLI entry point for covid_insights.
//!
//! Loads the case and vaccination tables once, then answers a single chart,
//! ranking, or inspection request per invocation.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use covid_insights::chart::{self, ChartData, ChartKind, ChartRequest};
use covid_insights::config::Settings;
use covid_insights::output::{print_pretty, write_json, write_records, write_series_csv, write_table};
use covid_insights::preprocess::CASE_DATE_FORMAT;
use covid_insights::summary::DatasetSummary;
use covid_insights::{CaseFilter, Dataset, RankingCriterion};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "covid_insights")]
#[command(about = "Explore COVID-19 case and vaccination data for Indian states", long_about = None)]
struct Cli {
    /// Case CSV (overrides COVID_CASES_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    cases: Option<PathBuf>,

    /// Vaccination CSV (overrides COVID_VACCINE_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    vaccinations: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one of the six charts, e.g. `deaths-pie` or "Deaths Pie Chart"
    Chart {
        #[arg(value_name = "KIND")]
        kind: String,

        /// State/union territory to restrict to (blank for all)
        #[arg(short, long)]
        region: Option<String>,

        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rank the top 5 states, e.g. `max-deaths` or "Maximum Confirmed"
    Top {
        #[arg(value_name = "CRITERION")]
        criterion: String,

        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// List the distinct regions in each table
    Regions,
    /// Print row counts, date span and data-quality counters as JSON
    Summary,
    /// Write the cleaned tables as CSV
    Export {
        #[arg(short = 'd', long, default_value = "clean")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
    Csv,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::from_env().with_overrides(cli.cases, cli.vaccinations);

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = settings.log_file_path.parent().unwrap_or(Path::new("logs"));
    let log_file_name = settings
        .log_file_path
        .file_name()
        .unwrap_or(OsStr::new("covid_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    // Reject bad arguments before touching the data files.
    let action = Action::from_command(cli.command)?;

    let dataset = Dataset::load(&settings.cases_path, &settings.vaccinations_path)
        .with_context(|| {
            format!(
                "failed to load {} and {}",
                settings.cases_path.display(),
                settings.vaccinations_path.display()
            )
        })?;

    action.run(&dataset)
}

/// A subcommand with its arguments already validated.
enum Action {
    Chart {
        request: ChartRequest,
        format: Format,
        output: Option<PathBuf>,
    },
    Top {
        criterion: RankingCriterion,
        format: Format,
    },
    Regions,
    Summary,
    Export {
        out_dir: PathBuf,
    },
}

impl Action {
    fn from_command(command: Commands) -> Result<Self> {
        let action = match command {
            Commands::Chart {
                kind,
                region,
                start,
                end,
                format,
                output,
            } => {
                let kind: ChartKind = kind.parse()?;
                let filter = CaseFilter {
                    region: non_blank(region),
                    start: parse_bound("--start", start)?,
                    end: parse_bound("--end", end)?,
                };
                Action::Chart {
                    request: ChartRequest::new(kind).with_filter(filter),
                    format,
                    output,
                }
            }
            Commands::Top { criterion, format } => Action::Top {
                criterion: criterion.parse()?,
                format,
            },
            Commands::Regions => Action::Regions,
            Commands::Summary => Action::Summary,
            Commands::Export { out_dir } => Action::Export { out_dir },
        };
        Ok(action)
    }

    fn run(self, dataset: &Dataset) -> Result<()> {
        match self {
            Action::Chart {
                request,
                format,
                output,
            } => {
                let chart = chart::dispatch(dataset, &request);
                if chart.is_empty() {
                    warn!(kind = %request.kind, "No rows matched the selected filters");
                }
                print_pretty(&chart);

                render(&chart, format, output.as_deref())?;
            }
            Action::Top { criterion, format } => {
                render(&chart::top_chart(dataset, criterion), format, None)?;
            }
            Action::Regions => {
                let mut out = io::stdout().lock();
                writeln!(out, "Case regions:")?;
                for region in dataset.case_regions() {
                    writeln!(out, "  {region}")?;
                }
                writeln!(out, "Vaccination regions:")?;
                for region in dataset.vaccination_regions() {
                    writeln!(out, "  {region}")?;
                }
            }
            Action::Summary => {
                write_json(io::stdout().lock(), &DatasetSummary::from_dataset(dataset))?;
            }
            Action::Export { out_dir } => {
                std::fs::create_dir_all(&out_dir)
                    .with_context(|| format!("failed to create {}", out_dir.display()))?;

                write_records(&out_dir.join("cases_clean.csv"), dataset.cases())?;
                write_records(&out_dir.join("vaccinations_clean.csv"), dataset.vaccinations())?;

                info!(out_dir = %out_dir.display(), "Cleaned tables exported");
            }
        }

        Ok(())
    }
}

/// Sends a chart to stdout or `output` in the requested format.
fn render(chart: &ChartData, format: Format, output: Option<&Path>) -> Result<()> {
    let out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        Format::Table => write_table(out, chart),
        Format::Json => write_json(out, chart),
        Format::Csv => write_series_csv(out, chart),
    }
}

/// Treats a missing or whitespace-only argument as "no filter".
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bound(flag: &str, value: Option<String>) -> Result<Option<NaiveDate>> {
    non_blank(value)
        .map(|v| {
            NaiveDate::parse_from_str(&v, CASE_DATE_FORMAT)
                .with_context(|| format!("{flag} expects YYYY-MM-DD, got {v:?}"))
        })
        .transpose()
}
