use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::Result;
use prepbench::config::{BenchConfig, ProfileConfig};
use prepbench::measure::TracingAllocator;
use prepbench::observability::BenchReport;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: TracingAllocator<Jemalloc> = TracingAllocator::new(Jemalloc);

#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: TracingAllocator<std::alloc::System> = TracingAllocator::new(std::alloc::System);

#[derive(Clone, ValueEnum, Debug)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "prepbench")]
#[command(version = "0.1.0")]
#[command(about = "Benchmark a cleaning session against a hand-written polars pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Increase logging verbosity (Info -> Debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Silence all logs
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format (text or json)
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Args, Debug, Default, Clone)]
struct RunArgs {
    /// YAML file with sizes, repeats, seed and missing_rate
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dataset sizes in rows (comma separated)
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<usize>>,

    /// Trials per size
    #[arg(long)]
    repeats: Option<usize>,

    /// Seed for the synthetic datasets
    #[arg(long)]
    seed: Option<u64>,

    /// Probability that a row has age and dept blanked
    #[arg(long)]
    missing_rate: Option<f64>,

    /// Also write a JSON report to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark (default)
    Run(RunArgs),
    /// Profile one session pipeline run on a generated dataset
    Profile {
        /// Rows in the generated dataset
        #[arg(long, default_value_t = ProfileConfig::default().rows)]
        rows: usize,

        /// Seed for the generated dataset
        #[arg(long, default_value_t = ProfileConfig::default().seed)]
        seed: u64,

        /// Number of functions to print
        #[arg(long, default_value_t = ProfileConfig::default().top)]
        top: usize,
    },
}

fn resolve_config(args: &RunArgs) -> Result<BenchConfig> {
    let mut config = match &args.config {
        Some(path) => BenchConfig::from_path(path)?,
        None => BenchConfig::default(),
    };
    if let Some(sizes) = &args.sizes {
        config.sizes = sizes.clone();
    }
    if let Some(repeats) = args.repeats {
        config.repeats = repeats;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(missing_rate) = args.missing_rate {
        config.missing_rate = missing_rate;
    }
    config.validate()?;
    Ok(config)
}

fn run_benchmark(args: &RunArgs, run_id: Uuid) -> Result<()> {
    let config = resolve_config(args)?;
    let results = prepbench::bench::run(&config)?;

    if let Some(path) = &args.report {
        BenchReport::new(run_id, config, results).save(path)?;
        info!("Report written to {:?}", path);
    }
    Ok(())
}

fn run_profile(profile: ProfileConfig) -> Result<()> {
    let mut df = prepbench::generate::generate(profile.rows, profile.seed)?;
    let dataset = prepbench::io::PersistedCsv::new(&mut df)?;
    drop(df);
    prepbench::profile::profile(dataset.path(), profile.top)?;
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI args first
    let cli = Cli::parse();

    // Determine default log level
    let default_level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // Initialize logging with EnvFilter (PREPBENCH_LOG > CLI args)
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("PREPBENCH_LOG")
        .from_env_lossy();

    let run_id = Uuid::new_v4();

    // Logs go to stderr; stdout carries the benchmark lines.
    match cli.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .with_span_list(false)
                .with_current_span(false)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    // Root span with run_id
    let _span = tracing::info_span!("root", run_id = %run_id).entered();

    match cli.command {
        None => run_benchmark(&cli.run, run_id)?,
        Some(Commands::Run(args)) => run_benchmark(&args, run_id)?,
        Some(Commands::Profile { rows, seed, top }) => {
            run_profile(ProfileConfig { rows, seed, top })?
        }
    }

    Ok(())
}
