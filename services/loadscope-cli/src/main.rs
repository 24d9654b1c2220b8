use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use loadscope_core::{
    LoadScopeConfig, LoadTestResults, LoggingConfig, PatternKind, RequestResult, RunId,
    ScenarioTemplate, TestConfiguration,
};
use loadscope_engine::{
    analyze, format_report, to_json, write_report, AnalysisOptions, LoadTester, ReportFormat,
    SimulatedTarget,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "loadscope")]
#[command(about = "Adaptive load generation and degradation analysis", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(long, global = true, env = "LOADSCOPE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a load test against the simulated target
    Run(RunArgs),
    /// Re-analyze previously recorded results
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Load pattern
    #[arg(long, value_enum)]
    pattern: Option<PatternArg>,

    /// Virtual users at the start of the run
    #[arg(long)]
    initial_users: Option<usize>,

    /// Maximum virtual users
    #[arg(long)]
    peak_users: Option<usize>,

    /// Run duration in milliseconds
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Pause between requests of one virtual user in milliseconds
    #[arg(long)]
    think_time_ms: Option<u64>,

    /// Aggregation window in milliseconds
    #[arg(long)]
    window_size_ms: Option<u64>,

    #[command(flatten)]
    output: OutputArgs,

    /// Print Prometheus metrics after the report
    #[arg(long)]
    metrics: bool,

    /// Disable the live progress spinner
    #[arg(long)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// JSON file holding saved results or a list of request results
    #[arg(long)]
    input: PathBuf,

    /// Aggregation window in milliseconds
    #[arg(long)]
    window_size_ms: Option<u64>,

    /// Capacity reported when nothing degraded (default: highest observed concurrency)
    #[arg(long)]
    peak_users: Option<usize>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write full results as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Print JSON to stdout instead of the text report
    #[arg(long)]
    print_json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PatternArg {
    RampUp,
    Sustained,
    Spike,
    Wave,
    Stress,
}

impl From<PatternArg> for PatternKind {
    fn from(value: PatternArg) -> Self {
        match value {
            PatternArg::RampUp => PatternKind::RampUp,
            PatternArg::Sustained => PatternKind::Sustained,
            PatternArg::Spike => PatternKind::Spike,
            PatternArg::Wave => PatternKind::Wave,
            PatternArg::Stress => PatternKind::Stress,
        }
    }
}

/// Accepted shapes of the `analyze` input file.
#[derive(Deserialize)]
#[serde(untagged)]
enum Recorded {
    Results(Box<LoadTestResults>),
    Requests(Vec<RequestResult>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LoadScopeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => LoadScopeConfig::load().context("Failed to load configuration")?,
    };

    init_logging(&config.logging)?;

    match cli.command {
        Command::Run(args) => {
            apply_overrides(&mut config, &args)?;
            run(config, args).await
        }
        Command::Analyze(args) => analyze_file(config, args),
    }
}

fn apply_overrides(config: &mut LoadScopeConfig, args: &RunArgs) -> anyhow::Result<()> {
    let pattern = &mut config.load_pattern;
    if let Some(kind) = args.pattern {
        pattern.pattern = kind.into();
    }
    if let Some(users) = args.initial_users {
        pattern.initial_users = users;
    }
    if let Some(users) = args.peak_users {
        pattern.peak_users = users;
    }
    if let Some(duration) = args.duration_ms {
        pattern.duration_ms = duration;
    }
    if let Some(timeout) = args.timeout_ms {
        config.run.timeout_ms = timeout;
    }
    if let Some(think_time) = args.think_time_ms {
        config.run.think_time_ms = think_time;
    }
    if let Some(window) = args.window_size_ms {
        config.run.window_size_ms = window;
    }

    config.validate().context("Invalid configuration")?;
    Ok(())
}

async fn run(config: LoadScopeConfig, args: RunArgs) -> anyhow::Result<()> {
    info!("Starting LoadScope run");
    info!("Pattern: {}", config.load_pattern.description());
    info!("Scenarios: {}", config.scenarios.len());

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Ramping up...");

    let target = Arc::new(SimulatedTarget::new(config.target.clone()));
    let tester = {
        let pb = pb.clone();
        LoadTester::builder()
            .config(&config)
            .target(target)
            .on_progress(move |p| {
                pb.set_message(format!(
                    "users {}/{} | {} requests ({} failed) | {:.1} req/s | {:.0}ms avg",
                    p.active_users,
                    p.target_users,
                    p.completed_requests,
                    p.failed_requests,
                    p.rolling_throughput,
                    p.rolling_avg_latency_ms
                ));
            })
            .build()?
    };

    let token = tester.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; stopping load test");
            token.cancel();
        }
    });

    let results = tester.run().await?;
    pb.finish_and_clear();

    emit(&results, &args.output)?;

    if args.metrics {
        println!("{}", loadscope_core::metrics::export_text());
    }
    Ok(())
}

fn analyze_file(config: LoadScopeConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let raw = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let recorded: Recorded = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not a results file or request list", args.input.display()))?;

    let mut results = match recorded {
        Recorded::Results(results) => *results,
        Recorded::Requests(requests) => from_requests(&config, requests)?,
    };
    info!(
        "Analyzing {} requests from {}",
        results.requests.len(),
        args.input.display()
    );

    if let Some(window) = args.window_size_ms {
        if window == 0 {
            bail!("--window-size-ms must be greater than zero");
        }
        results.configuration.window_size_ms = window;
    }
    let peak_users = args
        .peak_users
        .unwrap_or(results.configuration.load_pattern.peak_users);

    let analysis = analyze(
        &results.requests,
        Some(results.duration_ms().max(0) as f64 / 1000.0),
        &AnalysisOptions {
            window_size_ms: results.configuration.window_size_ms,
            thresholds: config.thresholds,
            safety_margin: config.run.safety_margin,
            peak_users,
        },
    );
    results.overall = analysis.overall;
    results.windows = analysis.windows;
    results.degradation_points = analysis.degradation_points;
    results.capacity = analysis.capacity;

    emit(&results, &args.output)
}

/// Wrap a bare request list so it can be analyzed and reported like a run.
fn from_requests(
    config: &LoadScopeConfig,
    requests: Vec<RequestResult>,
) -> anyhow::Result<LoadTestResults> {
    let (Some(start_time), Some(end_time)) = (
        requests.iter().map(|r| r.started_at).min(),
        requests.iter().map(|r| r.ended_at).max(),
    ) else {
        bail!("request list is empty");
    };

    let scenarios = requests
        .iter()
        .map(|r| r.scenario.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|name| ScenarioTemplate::new(name, serde_json::Value::Null))
        .collect();

    let mut load_pattern = config.load_pattern.clone();
    load_pattern.peak_users = requests
        .iter()
        .map(|r| r.concurrent_users)
        .max()
        .unwrap_or(load_pattern.peak_users);
    load_pattern.duration_ms = (end_time - start_time).num_milliseconds().max(0) as u64;

    Ok(LoadTestResults {
        run_id: RunId::new(),
        configuration: TestConfiguration {
            load_pattern,
            scenarios,
            timeout_ms: config.run.timeout_ms,
            think_time_ms: config.run.think_time_ms,
            window_size_ms: config.run.window_size_ms,
        },
        start_time,
        end_time,
        cancelled: false,
        overall: Default::default(),
        windows: Vec::new(),
        requests,
        degradation_points: Vec::new(),
        capacity: Default::default(),
    })
}

fn emit(results: &LoadTestResults, output: &OutputArgs) -> anyhow::Result<()> {
    if output.print_json {
        println!("{}", to_json(results)?);
    } else {
        print!("{}", format_report(results));
    }

    if let Some(path) = &output.json {
        write_results(results, path)?;
    }
    Ok(())
}

fn write_results(results: &LoadTestResults, path: &Path) -> anyhow::Result<()> {
    write_report(results, path, ReportFormat::Json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Results written to {}", path.display());
    Ok(())
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so the report on stdout stays machine-readable.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Invalid logging.level")?;

    match config.format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        _ => fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}
