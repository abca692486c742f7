//! The two pipelines under comparison.
//!
//! Both read the same CSV and apply, in order: imputation, min-max
//! normalization, drop-first one-hot encoding of `dept` and a read-only
//! z-score outlier pass on `salary`.

use crate::errors::{BenchError, BenchResult};
use crate::generate::{AGE, DEPT, SALARY};
use crate::io;
use crate::session::{CleaningSession, NormalizationMethod, OutlierAction, OutlierMethod};
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

const OUTLIER_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Runner {
    /// Stateful cleaning session (the pipeline under test).
    Session,
    /// Hand-written polars expressions (the baseline).
    Baseline,
}

impl Runner {
    pub fn name(&self) -> &'static str {
        match self {
            Runner::Session => "Session",
            Runner::Baseline => "Baseline",
        }
    }

    pub fn run(&self, path: &Path) -> BenchResult<DataFrame> {
        match self {
            Runner::Session => session_pipeline(path),
            Runner::Baseline => baseline_pipeline(path),
        }
    }
}

pub fn session_pipeline(path: &Path) -> BenchResult<DataFrame> {
    let mut session = CleaningSession::new();
    session
        .load_data(path)?
        .imputation()?
        .normalization(NormalizationMethod::MinMax)?
        .one_hot_encoding(&[DEPT])?
        .outlier(OutlierMethod::default(), OutlierAction::Detect)?;
    session.into_data()
}

pub fn baseline_pipeline(path: &Path) -> BenchResult<DataFrame> {
    let df = io::read_csv(path)?.collect()?;

    // impute numeric: median, categorical: mode
    let dept_mode = column_mode(&df, DEPT)?;
    let df = df
        .lazy()
        .with_columns([
            col(AGE).fill_null(col(AGE).median()),
            col(DEPT).fill_null(lit(dept_mode)),
        ])
        .collect()?;

    let df = minmax_scale(df, &[AGE, SALARY])?;
    let df = get_dummies(df, DEPT)?;

    let z = (col(SALARY) - col(SALARY).mean()) / col(SALARY).std(0);
    let detected = df
        .clone()
        .lazy()
        .filter(
            z.clone()
                .gt(lit(OUTLIER_THRESHOLD))
                .or(z.lt(lit(-OUTLIER_THRESHOLD))),
        )
        .collect()?;
    debug!("Baseline flagged {} salary outliers", detected.height());

    Ok(df)
}

/// Most frequent non-null value, ties going to the first one seen.
fn column_mode(df: &DataFrame, column: &str) -> BenchResult<String> {
    let counts = df
        .clone()
        .lazy()
        .filter(col(column).is_not_null())
        .group_by_stable([col(column)])
        .agg([len().alias("count")])
        .sort(
            vec![PlSmallStr::from("count")],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .limit(1)
        .collect()?;

    counts
        .column(column)?
        .str()?
        .get(0)
        .map(|s| s.to_string())
        .ok_or_else(|| {
            BenchError::PipelineError(format!("Column '{}' has no values to impute from", column))
        })
}

fn scalar(stats: &DataFrame, name: &str) -> BenchResult<f64> {
    stats
        .column(name)?
        .f64()?
        .get(0)
        .ok_or_else(|| BenchError::PipelineError(format!("Missing statistic {}", name)))
}

fn minmax_scale(df: DataFrame, columns: &[&str]) -> BenchResult<DataFrame> {
    let mut stat_exprs = Vec::with_capacity(columns.len() * 2);
    for &c in columns {
        let base = col(c).cast(DataType::Float64);
        stat_exprs.push(base.clone().min().alias(format!("{}__min", c)));
        stat_exprs.push(base.max().alias(format!("{}__max", c)));
    }
    let stats = df.clone().lazy().select(stat_exprs).collect()?;

    let mut exprs = Vec::with_capacity(columns.len());
    for &c in columns {
        let min = scalar(&stats, &format!("{}__min", c))?;
        let max = scalar(&stats, &format!("{}__max", c))?;
        let scaled = if max == min {
            lit(0.0)
        } else {
            (col(c).cast(DataType::Float64) - lit(min)) / lit(max - min)
        };
        exprs.push(scaled.alias(c));
    }

    Ok(df.lazy().with_columns(exprs).collect()?)
}

/// Indicator columns for every sorted category but the first; `column` is dropped.
fn get_dummies(df: DataFrame, column: &str) -> BenchResult<DataFrame> {
    let categories = df
        .clone()
        .lazy()
        .select([col(column)
            .drop_nulls()
            .unique()
            .sort(SortOptions::default())])
        .collect()?;

    let dummies: Vec<Expr> = categories
        .column(column)?
        .str()?
        .into_iter()
        .flatten()
        .skip(1)
        .map(|category| {
            when(col(column).eq(lit(category)))
                .then(lit(1i32))
                .otherwise(lit(0i32))
                .alias(format!("{}_{}", column, category))
        })
        .collect();

    let df = df.lazy().with_columns(dummies).collect()?;
    Ok(df.drop(column)?)
}
