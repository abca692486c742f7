use crate::config::BenchConfig;
use crate::errors::{BenchError, BenchResult};
use crate::generate;
use crate::io::PersistedCsv;
use crate::measure::{measure, Trial};
use crate::observability::compute_file_hash;
use crate::pipelines::Runner;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Running totals for one pipeline across the trials of one size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    secs: Vec<f64>,
    peak_mb: f64,
}

impl PipelineStats {
    pub fn record(&mut self, trial: &Trial) {
        self.secs.push(trial.elapsed_secs());
        self.peak_mb = self.peak_mb.max(trial.peak_mb());
    }

    pub fn trials(&self) -> usize {
        self.secs.len()
    }

    /// Mean wall-clock seconds over the recorded trials; 0 before any trial.
    pub fn average_secs(&self) -> f64 {
        mean(&self.secs)
    }

    pub fn peak_mb(&self) -> f64 {
        self.peak_mb
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            avg_secs: self.average_secs(),
            peak_mb: self.peak_mb,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub avg_secs: f64,
    pub peak_mb: f64,
}

/// Aggregated result of one dataset size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeReport {
    pub rows: usize,
    pub repeats: usize,
    pub session: PipelineSummary,
    pub baseline: PipelineSummary,
    /// Positive when the session pipeline is faster than the baseline.
    pub speed_delta_pct: f64,
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>6} rows | {}: {:.3}s {:.1}MB | {}: {:.3}s {:.1}MB | Δspeed: {:+.1}% (avg of {})",
            self.rows,
            Runner::Session.name(),
            self.session.avg_secs,
            self.session.peak_mb,
            Runner::Baseline.name(),
            self.baseline.avg_secs,
            self.baseline.peak_mb,
            self.speed_delta_pct,
            self.repeats
        )
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `(avg_baseline - avg_test) / avg_baseline * 100`.
pub fn speed_delta_pct(avg_baseline: f64, avg_test: f64) -> f64 {
    (avg_baseline - avg_test) / avg_baseline * 100.0
}

/// Measure both runners `repeats` times against an already persisted file.
pub fn bench_path(
    path: &Path,
    rows: usize,
    repeats: usize,
    pb: &ProgressBar,
) -> BenchResult<SizeReport> {
    let mut session = PipelineStats::default();
    let mut baseline = PipelineStats::default();

    for i in 0..repeats {
        let trial = measure(|| Runner::Session.run(path))?;
        session.record(&trial);
        debug!(
            "Trial {}: session {:.4}s {:.2}MB",
            i + 1,
            trial.elapsed_secs(),
            trial.peak_mb()
        );

        let trial = measure(|| Runner::Baseline.run(path))?;
        baseline.record(&trial);
        debug!(
            "Trial {}: baseline {:.4}s {:.2}MB",
            i + 1,
            trial.elapsed_secs(),
            trial.peak_mb()
        );
        pb.inc(1);
    }

    let session = session.summary();
    let baseline = baseline.summary();
    Ok(SizeReport {
        rows,
        repeats,
        session,
        baseline,
        speed_delta_pct: speed_delta_pct(baseline.avg_secs, session.avg_secs),
    })
}

/// Generate, persist and measure one dataset size. The temporary file is
/// removed when this returns, error or not.
pub fn bench_size(rows: usize, config: &BenchConfig, pb: &ProgressBar) -> BenchResult<SizeReport> {
    let mut df = generate::generate_with_missing_rate(rows, config.seed, config.missing_rate)?;
    let dataset = PersistedCsv::new(&mut df)?;
    drop(df);

    if tracing::enabled!(tracing::Level::DEBUG) {
        let hash = compute_file_hash(dataset.path())?;
        debug!("Dataset {:?} sha256={}", dataset.path(), hash);
    }

    bench_path(dataset.path(), rows, config.repeats, pb)
}

/// Run the whole benchmark, printing one line per size to stdout.
pub fn run(config: &BenchConfig) -> BenchResult<Vec<SizeReport>> {
    config.validate()?;
    info!(
        "Benchmarking sizes {:?} with {} repeats (seed {})",
        config.sizes, config.repeats, config.seed
    );

    let total = (config.sizes.len() * config.repeats) as u64;
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
            .map_err(|e| BenchError::Unknown(e.into()))? // Template error is rare/internal
            .progress_chars("#>-"),
    );

    let mut reports = Vec::with_capacity(config.sizes.len());
    for &rows in &config.sizes {
        pb.set_message(format!("{} rows", rows));
        let report = bench_size(rows, config, &pb)?;
        pb.suspend(|| println!("{}", report));
        reports.push(report);
    }

    pb.finish_and_clear();
    info!("Benchmark completed.");
    Ok(reports)
}
