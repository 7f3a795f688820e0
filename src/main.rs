use anyhow::{bail, Context, Result};
use aws_names::aws::http::format_aws_error;
use aws_names::aws::pool::ClientPool;
use aws_names::config::Config;
use aws_names::driver::{self, GlobalAttribution, RunOptions, RunSummary};
use aws_names::output::open_output;
use aws_names::progress::DEFAULT_PROGRESS_INTERVAL;
use aws_names::resource::{get_registry, AwsApi};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Enumerate AWS resource names into a CSV file
#[derive(Parser, Debug)]
#[command(name = "aws-names", version = aws_names::VERSION, about, long_about = None)]
struct Args {
    /// AWS profiles to list resources for
    #[arg(long, num_args = 1..)]
    profiles: Option<Vec<String>>,

    /// Regions to list resources in; global types are listed in the first one
    #[arg(long, num_args = 1..)]
    regions: Option<Vec<String>>,

    /// Only list these resource types (see --list-types)
    #[arg(long, num_args = 1..)]
    types: Option<Vec<String>>,

    /// CSV destination, `-` for stdout
    #[arg(short, long, required_unless_present = "list_types")]
    output_file: Option<String>,

    /// Number of listings to run at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Keep listing when a (profile, region, type) listing fails
    #[arg(long)]
    keep_going: bool,

    /// Abort a single listing after this many seconds
    #[arg(long, value_name = "SECS")]
    walk_timeout: Option<u64>,

    /// Log a progress line every N names (0 disables)
    #[arg(long, value_name = "N")]
    progress_interval: Option<u64>,

    /// Where global resources (S3 buckets, IAM roles) are attributed
    #[arg(long, value_enum, default_value = "first-region")]
    global_attribution: GlobalAttribution,

    /// Add an AWS console link column
    #[arg(long)]
    console_urls: bool,

    /// Send every request to this endpoint (e.g. LocalStack)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the known resource types and exit
    #[arg(long)]
    list_types: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&PathBuf>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let (non_blocking, guard) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("mkdir -p {}", parent.display()))?;
                }
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        },
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(log_file.is_none())
        .with_target(true)
        .with_thread_ids(false)
        .with_file(log_file.is_some())
        .with_line_number(log_file.is_some())
        .init();

    tracing::debug!("aws-names {} started with log level: {:?}", aws_names::VERSION, level);

    Ok(Some(guard))
}

fn print_types() {
    for descriptor in get_registry().all() {
        let scope = if descriptor.is_global { "global" } else { "regional" };
        println!(
            "{:<16} {:<8} {}:{}  {}",
            descriptor.type_id,
            scope,
            descriptor.service,
            descriptor.operation,
            descriptor.display_name
        );
    }
}

/// Reject type ids the registry does not know
fn validate_types(types: &[String]) -> Result<()> {
    let known = get_registry().type_ids();
    let unknown: Vec<&str> = types
        .iter()
        .map(String::as_str)
        .filter(|t| !known.contains(t))
        .collect();

    if !unknown.is_empty() {
        bail!(
            "Unknown resource type(s): {}. Known types: {}",
            unknown.join(", "),
            known.join(", ")
        );
    }
    Ok(())
}

/// Merge CLI flags over the config file
fn run_options(args: &Args, config: &Config) -> Result<RunOptions> {
    let types = config.effective_types(args.types.clone());
    if let Some(types) = &types {
        validate_types(types)?;
    }

    Ok(RunOptions {
        profiles: config.effective_profiles(args.profiles.clone()),
        regions: config.effective_regions(args.regions.clone()),
        types,
        concurrency: args.concurrency.or(config.concurrency).unwrap_or(1).max(1),
        keep_going: args.keep_going,
        walk_timeout: args
            .walk_timeout
            .or(config.walk_timeout_secs)
            .map(Duration::from_secs),
        global_attribution: args.global_attribution,
        progress_interval: args
            .progress_interval
            .or(config.progress_interval)
            .unwrap_or(DEFAULT_PROGRESS_INTERVAL),
    })
}

async fn run(args: &Args, output_file: &str) -> Result<RunSummary> {
    let config = Config::load();
    let opts = run_options(args, &config)?;

    tracing::info!(
        "Using profiles {:?}, regions {:?}, output {}",
        opts.profiles,
        opts.regions,
        output_file
    );

    let endpoint_url = args.endpoint_url.as_deref().or(config.endpoint_url.as_deref());
    let api = AwsApi::new(ClientPool::new(endpoint_url)?);

    let mut sink = open_output(output_file, args.console_urls)?;
    driver::run(&api, get_registry(), &opts, &mut sink).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.list_types {
        print_types();
        return ExitCode::SUCCESS;
    }

    let _log_guard = match setup_logging(args.log_level, args.log_file.as_ref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        },
    };

    let Some(output_file) = args.output_file.as_deref() else {
        eprintln!("Error: --output-file is required");
        return ExitCode::FAILURE;
    };

    match run(&args, output_file).await {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(summary) => {
            eprintln!(
                "{} of {} listings failed:",
                summary.failures.len(),
                summary.lanes_planned
            );
            for failure in &summary.failures {
                eprintln!("  {}", failure);
            }
            ExitCode::FAILURE
        },
        Err(err) => {
            tracing::error!("Run failed: {:#}", err);
            eprintln!("Error: {}", format_aws_error(&err));
            ExitCode::FAILURE
        },
    }
}
