//! Sampling profile of one session pipeline run, for manual diagnosis.

use crate::errors::{BenchError, BenchResult};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

pub const SAMPLE_FREQUENCY: i32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileEntry {
    pub function: String,
    pub self_samples: usize,
    pub cumulative_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileReport {
    pub total_samples: usize,
    pub entries: Vec<ProfileEntry>,
}

impl fmt::Display for ProfileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== profile (session pipeline) top {} by cumulative samples, {} total ===",
            self.entries.len(),
            self.total_samples
        )?;
        writeln!(f, "{:>10} {:>10} {:>7}  function", "cumulative", "self", "cum%")?;
        for entry in &self.entries {
            let pct = if self.total_samples == 0 {
                0.0
            } else {
                entry.cumulative_samples as f64 / self.total_samples as f64 * 100.0
            };
            writeln!(
                f,
                "{:>10} {:>10} {:>6.1}%  {}",
                entry.cumulative_samples, entry.self_samples, pct, entry.function
            )?;
        }
        Ok(())
    }
}

/// Rank sampled stacks by cumulative count.
///
/// Each stack lists function names leaf first. A function counts once per
/// sample towards its cumulative total however often it recurses; the leaf
/// gets the self count.
pub fn rank_samples<I>(samples: I, top_n: usize) -> ProfileReport
where
    I: IntoIterator<Item = (Vec<String>, usize)>,
{
    let mut cumulative: HashMap<String, usize> = HashMap::new();
    let mut own: HashMap<String, usize> = HashMap::new();
    let mut total_samples = 0;

    for (stack, count) in samples {
        total_samples += count;
        if let Some(leaf) = stack.first() {
            *own.entry(leaf.clone()).or_insert(0) += count;
        }
        let mut seen = HashSet::new();
        for function in stack {
            if seen.insert(function.clone()) {
                *cumulative.entry(function).or_insert(0) += count;
            }
        }
    }

    let mut entries: Vec<ProfileEntry> = cumulative
        .into_iter()
        .map(|(function, cumulative_samples)| ProfileEntry {
            self_samples: own.get(&function).copied().unwrap_or(0),
            function,
            cumulative_samples,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.cumulative_samples
            .cmp(&a.cumulative_samples)
            .then_with(|| a.function.cmp(&b.function))
    });
    entries.truncate(top_n);

    ProfileReport {
        total_samples,
        entries,
    }
}

/// Run the session pipeline once on `path` under the sampling profiler and
/// print the `top_n` functions by cumulative time.
#[cfg(unix)]
pub fn profile(path: &Path, top_n: usize) -> BenchResult<ProfileReport> {
    use crate::pipelines::Runner;
    use tracing::info;

    let guard = pprof::ProfilerGuardBuilder::default()
        .frequency(SAMPLE_FREQUENCY)
        .blocklist(&["libc", "libgcc", "pthread", "vdso"])
        .build()
        .map_err(|e| BenchError::ProfileError(e.to_string()))?;

    let _ = Runner::Session.run(path)?;

    let report = guard
        .report()
        .build()
        .map_err(|e| BenchError::ProfileError(e.to_string()))?;
    drop(guard);

    let samples = report.data.iter().map(|(frames, count)| {
        let stack: Vec<String> = frames
            .frames
            .iter()
            .filter_map(|frame| frame.first().map(|symbol| symbol.name()))
            .collect();
        (stack, (*count).max(0) as usize)
    });

    let ranked = rank_samples(samples, top_n);
    info!("Profiled {} samples", ranked.total_samples);
    println!("\n{}", ranked);
    Ok(ranked)
}

#[cfg(not(unix))]
pub fn profile(_path: &Path, _top_n: usize) -> BenchResult<ProfileReport> {
    Err(BenchError::ProfileError(
        "sampling profiler is not supported on this platform".to_string(),
    ))
}
