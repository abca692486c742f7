use crate::bench::SizeReport;
use crate::config::BenchConfig;
use crate::errors::BenchResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

/// Per-stage wall-clock timings of one cleaning session.
#[derive(Debug, Default, Serialize)]
pub struct Metrics {
    pub rows_read: usize,
    pub step_durations_us: BTreeMap<String, u64>,
}

impl Metrics {
    pub fn record_step(&mut self, step_name: &str, duration: Duration) {
        *self
            .step_durations_us
            .entry(step_name.to_string())
            .or_insert(0) += duration.as_micros() as u64;
    }
}

/// Machine-readable record of a whole benchmark run.
#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub config: BenchConfig,
    pub results: Vec<SizeReport>,
}

impl BenchReport {
    pub fn new(run_id: Uuid, config: BenchConfig, results: Vec<SizeReport>) -> Self {
        Self {
            run_id: run_id.to_string(),
            timestamp: Utc::now(),
            config,
            results,
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> BenchResult<()> {
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

pub fn compute_file_hash<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192]; // 8KB buffer

    loop {
        let count = file.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
