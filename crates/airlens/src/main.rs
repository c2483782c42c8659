//! CLI entry point for air-quality exploration.

use airlens::overview::{column_distribution, overview, preview};
use airlens::statistics::describe_table;
use airlens::{
    AirQualityReport, ColumnDistribution, CorrelationMatrix, CorrelationMethod, DatasetOverview,
    ExplorerConfig, ImputationStep, Session, TableDescription, correlate,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// CLI-compatible correlation method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCorrelationMethod {
    /// Linear association
    Pearson,
    /// Rank (monotonic) association
    Spearman,
    /// Tie-corrected concordance (tau-b)
    Kendall,
}

impl From<CliCorrelationMethod> for CorrelationMethod {
    fn from(cli: CliCorrelationMethod) -> Self {
        match cli {
            CliCorrelationMethod::Pearson => CorrelationMethod::Pearson,
            CliCorrelationMethod::Spearman => CorrelationMethod::Spearman,
            CliCorrelationMethod::Kendall => CorrelationMethod::Kendall,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Statistical exploration of air-quality data",
    long_about = "Describe, clean and correlate a tabular air-pollution snapshot.\n\n\
                  EXAMPLES:\n  \
                  # Overview, statistics, correlations and report\n  \
                  airlens -i data/pollution.csv\n\n  \
                  # Fill missing values first, Spearman only\n  \
                  airlens -i data/pollution.csv --impute -m spearman\n\n  \
                  # Histogram and box plot of one column\n  \
                  airlens -i data/pollution.csv --column PM10 --bins 30\n\n  \
                  # Machine-readable output\n  \
                  airlens -i data/pollution.csv --json | jq .report"
)]
struct Args {
    /// Path to the CSV file to explore
    ///
    /// Overrides the path from the configuration file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// JSON configuration file (aliases, defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fill missing values (median / mode) before analysing
    #[arg(long)]
    impute: bool,

    /// Correlation method(s) to compute; all three when omitted
    #[arg(short, long, value_enum)]
    method: Vec<CliCorrelationMethod>,

    /// Number of histogram bins
    #[arg(long)]
    bins: Option<usize>,

    /// IQR multiplier for the outlier fences
    #[arg(long)]
    fence: Option<f64>,

    /// Column to summarize with a histogram and a box plot
    #[arg(long)]
    column: Option<String>,

    /// Output JSON to stdout instead of human-readable text
    ///
    /// Disables all logs; only the JSON document is written.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors in the log
    #[arg(short, long)]
    quiet: bool,
}

/// Everything the CLI computes, in output order.
#[derive(Debug, Serialize)]
struct Exploration {
    input: String,
    overview: DatasetOverview,
    imputation: Vec<ImputationStep>,
    statistics: TableDescription,
    column: Option<ColumnDistribution>,
    correlations: Vec<CorrelationMatrix>,
    report: AirQualityReport,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    info!("Loading dataset from: {}", config.data_path.display());
    let mut session = Session::open(config)?;

    let imputation = if args.impute {
        session.impute()?.to_vec()
    } else {
        Vec::new()
    };

    let exploration = explore(&session, &args, imputation)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&exploration)?);
    } else {
        print_human_readable(&session, &exploration);
    }

    Ok(())
}

/// Merge the optional config file with command-line overrides.
fn build_config(args: &Args) -> Result<ExplorerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Reading config file {}", path.display()))?;
            serde_json::from_str::<ExplorerConfig>(&content)
                .with_context(|| format!("Parsing config file {}", path.display()))?
        }
        None => ExplorerConfig::default(),
    };

    if let Some(input) = &args.input {
        config.data_path = input.clone();
    }
    if let Some(bins) = args.bins {
        config.histogram_bins = bins;
    }
    if let Some(fence) = args.fence {
        config.outlier_multiplier = fence;
    }

    config.validate()?;
    Ok(config)
}

fn explore(session: &Session, args: &Args, imputation: Vec<ImputationStep>) -> Result<Exploration> {
    let df = session.working();

    let column = args
        .column
        .as_deref()
        .map(|name| column_distribution(df, name, session.config().histogram_bins))
        .transpose()?;

    let methods: Vec<CorrelationMethod> = if args.method.is_empty() {
        CorrelationMethod::ALL.to_vec()
    } else {
        args.method.iter().map(|m| (*m).into()).collect()
    };
    let correlations = methods
        .into_iter()
        .map(|method| correlate(df, method))
        .collect::<airlens::AnalysisResult<Vec<_>>>()?;

    Ok(Exploration {
        input: session.config().data_path.display().to_string(),
        overview: overview(df),
        imputation,
        statistics: describe_table(df)?,
        column,
        correlations,
        report: session.report()?,
    })
}

/// Print the exploration as plain text.
///
/// Uses `println!` on purpose: this is the tool's output, not a log.
fn print_human_readable(session: &Session, exploration: &Exploration) {
    let overview = &exploration.overview;

    print_header("DATASET OVERVIEW");
    println!("  File: {}", exploration.input);
    println!("  Rows: {}", overview.rows);
    println!("  Columns: {}", overview.columns);
    println!("  Missing cells: {}", overview.total_missing());
    println!();
    println!("  {:<30} {:<12} {:>8}", "Column", "Type", "Missing");
    for info in &overview.column_info {
        println!("  {:<30} {:<12} {:>8}", info.name, info.dtype, info.null_count);
    }
    println!();
    println!("{}", preview(session.working(), session.config().preview_rows));

    if !exploration.imputation.is_empty() {
        print_header("IMPUTATION");
        for step in &exploration.imputation {
            println!("  {}", step);
        }
    }

    print_header("DESCRIPTIVE STATISTICS");
    println!(
        "  {:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Column", "Count", "Mean", "Std", "Min", "Q1", "Median", "Q3", "Max"
    );
    for stats in &exploration.statistics.columns {
        println!(
            "  {:<20} {:>6} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
            truncate(&stats.column, 20),
            stats.count,
            stats.mean,
            stats.std,
            stats.min,
            stats.q1,
            stats.median,
            stats.q3,
            stats.max
        );
    }
    for column in &exploration.statistics.unavailable {
        println!("  {:<20} (no values)", truncate(column, 20));
    }

    if let Some(plots) = &exploration.column {
        print_header(&format!("DISTRIBUTION OF '{}'", plots.column));
        if let Some(omitted) = &plots.omitted {
            println!("  Omitted: {}", omitted.reason);
        }
        let bins = plots.histogram.as_deref().unwrap_or_default();
        let widest = bins.iter().map(|b| b.count).max().unwrap_or(0);
        for bin in bins {
            let bar_len = if widest == 0 { 0 } else { bin.count * 40 / widest };
            println!(
                "  [{:>10.3}, {:>10.3}] {:>6} {}",
                bin.start,
                bin.end,
                bin.count,
                "#".repeat(bar_len)
            );
        }
        if let Some(b) = &plots.box_plot {
            println!();
            println!(
                "  min {:.3} | q1 {:.3} | median {:.3} | q3 {:.3} | max {:.3}",
                b.min, b.q1, b.median, b.q3, b.max
            );
        }
    }

    for matrix in &exploration.correlations {
        print_header(&format!("{} CORRELATION", matrix.method.as_str().to_uppercase()));
        print_matrix(matrix);
    }

    print_report(&exploration.report);
}

fn print_header(title: &str) {
    println!();
    println!("{}", "=".repeat(80));
    println!("{}", title);
    println!("{}", "=".repeat(80));
}

fn print_matrix(matrix: &CorrelationMatrix) {
    if matrix.is_empty() {
        println!("  (no numeric columns)");
        return;
    }

    print!("  {:<12}", "");
    for column in &matrix.columns {
        print!(" {:>10}", truncate(column, 10));
    }
    println!();

    for (column, row) in matrix.columns.iter().zip(&matrix.values) {
        print!("  {:<12}", truncate(column, 12));
        for value in row {
            match value {
                Some(r) => print!(" {:>10.3}", r),
                None => print!(" {:>10}", "n/a"),
            }
        }
        println!();
    }

    if let Some(strongest) = matrix.pairs().first() {
        println!();
        println!(
            "  Strongest: {} / {} ({:.3})",
            strongest.column_x, strongest.column_y, strongest.coefficient
        );
    }
}

fn print_report(report: &AirQualityReport) {
    print_header("AIR QUALITY");

    if let Some(particulates) = &report.particulates {
        println!("Particulates:");
        for summary in [&particulates.pm25, &particulates.pm10] {
            let outliers = &summary.outliers;
            println!(
                "  {:<10} mean {:.2}  median {:.2}  std {:.2}",
                summary.column, summary.mean, summary.median, summary.std
            );
            println!(
                "  {:<10} {} outlier(s) of {} outside [{:.2}, {:.2}]",
                "",
                outliers.outlier_count,
                outliers.present_count,
                outliers.lower_bound,
                outliers.upper_bound
            );
        }
        println!();
    }

    for section in [&report.humidity_target, &report.density_pm25]
        .into_iter()
        .flatten()
    {
        println!(
            "{} correlation {} / {}: {:.3}",
            section.method, section.column_x, section.column_y, section.coefficient
        );
    }

    if let Some(co) = &report.co_quartiles {
        println!(
            "Quartiles of {}: Q1 {:.3}  Q2 {:.3}  Q3 {:.3}",
            co.column, co.quartiles.q1, co.quartiles.q2, co.quartiles.q3
        );
    }

    if !report.omitted.is_empty() {
        println!();
        println!("Omitted:");
        for omitted in &report.omitted {
            println!("  - {}: {}", omitted.section, omitted.reason);
        }
    }
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let kept: String = name.chars().take(width.saturating_sub(1)).collect();
        format!("{}~", kept)
    }
}
