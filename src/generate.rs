//! Synthetic employee-like dataset used as benchmark input.
//!
//! Columns are drawn independently: `age` ~ Normal(35, 10), `salary` ~
//! LogNormal(11, 0.5), `dept` uniform over four departments and `remote`
//! uniform over yes/no. A per-row mask then blanks `age` and `dept` together.

use crate::config::DEFAULT_MISSING_RATE;
use crate::errors::{BenchError, BenchResult};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Normal};

pub const AGE: &str = "age";
pub const SALARY: &str = "salary";
pub const DEPT: &str = "dept";
pub const REMOTE: &str = "remote";

pub const DEPARTMENTS: [&str; 4] = ["HR", "Mkt", "Fin", "Eng"];
pub const REMOTE_VALUES: [&str; 2] = ["yes", "no"];

const AGE_MEAN: f64 = 35.0;
const AGE_SD: f64 = 10.0;
const SALARY_LOG_MEAN: f64 = 11.0;
const SALARY_LOG_SD: f64 = 0.5;

/// Generate `rows` records with the default 10% missingness.
pub fn generate(rows: usize, seed: u64) -> BenchResult<DataFrame> {
    generate_with_missing_rate(rows, seed, DEFAULT_MISSING_RATE)
}

/// Generate `rows` records; each row independently has `age` and `dept`
/// blanked with probability `missing_rate`.
///
/// The same `(rows, seed, missing_rate)` always yields an identical frame.
pub fn generate_with_missing_rate(
    rows: usize,
    seed: u64,
    missing_rate: f64,
) -> BenchResult<DataFrame> {
    if rows == 0 {
        return Err(BenchError::GenerationError(
            "row count must be positive".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&missing_rate) {
        return Err(BenchError::GenerationError(format!(
            "missing rate {} must be within [0, 1)",
            missing_rate
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let age_dist = Normal::new(AGE_MEAN, AGE_SD)
        .map_err(|e| BenchError::GenerationError(format!("age distribution: {}", e)))?;
    let salary_dist = LogNormal::new(SALARY_LOG_MEAN, SALARY_LOG_SD)
        .map_err(|e| BenchError::GenerationError(format!("salary distribution: {}", e)))?;

    let mut ages: Vec<Option<f64>> = (0..rows).map(|_| Some(age_dist.sample(&mut rng))).collect();
    let salaries: Vec<f64> = (0..rows).map(|_| salary_dist.sample(&mut rng)).collect();
    let mut depts: Vec<Option<&str>> = (0..rows)
        .map(|_| Some(DEPARTMENTS[rng.gen_range(0..DEPARTMENTS.len())]))
        .collect();
    let remote: Vec<&str> = (0..rows)
        .map(|_| REMOTE_VALUES[rng.gen_range(0..REMOTE_VALUES.len())])
        .collect();

    for i in 0..rows {
        if rng.gen::<f64>() < missing_rate {
            ages[i] = None;
            depts[i] = None;
        }
    }

    let df = df! {
        AGE => ages,
        SALARY => salaries,
        DEPT => depts,
        REMOTE => remote,
    }?;

    Ok(df)
}
