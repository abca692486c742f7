//! Stateful cleaning session.
//!
//! Mirrors the call sequence of a cleaning toolbox: load a dataset, impute,
//! normalize, one-hot encode, handle outliers and hand back the table. Each
//! stage works on whatever columns are present when it runs.

use crate::errors::{BenchError, BenchResult};
use crate::features;
use crate::io;
use crate::observability::Metrics;
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    MinMax,
    ZScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutlierMethod {
    ZScore { threshold: f64 },
}

impl Default for OutlierMethod {
    fn default() -> Self {
        OutlierMethod::ZScore {
            threshold: DEFAULT_ZSCORE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierAction {
    /// Record flagged rows, leave the table as is.
    Detect,
    /// Drop every row flagged in any column.
    Remove,
}

/// Rows flagged for one column by an outlier pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSummary {
    pub column: String,
    pub threshold: f64,
    pub rows: Vec<usize>,
}

fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_float() || dtype.is_integer()
}

#[derive(Debug, Default)]
pub struct CleaningSession {
    data: Option<DataFrame>,
    outliers: Vec<OutlierSummary>,
    metrics: Metrics,
}

impl CleaningSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> BenchResult<&DataFrame> {
        self.data
            .as_ref()
            .ok_or_else(|| BenchError::SessionError("no dataset loaded".to_string()))
    }

    fn columns_where(&self, pred: impl Fn(&DataType) -> bool) -> BenchResult<Vec<String>> {
        Ok(self
            .data()?
            .get_columns()
            .iter()
            .filter(|c| pred(c.dtype()))
            .map(|c| c.name().to_string())
            .collect())
    }

    fn finish_step(&mut self, step: &str, started: Instant) {
        let elapsed = started.elapsed();
        debug!("Session step '{}' took {:?}", step, elapsed);
        self.metrics.record_step(step, elapsed);
    }

    pub fn load_data<P: AsRef<Path>>(&mut self, path: P) -> BenchResult<&mut Self> {
        let started = Instant::now();
        let df = io::read_csv(path)?.collect()?;
        self.metrics.rows_read = df.height();
        self.data = Some(df);
        self.outliers.clear();
        self.finish_step("load_data", started);
        Ok(self)
    }

    /// Default imputation: numeric columns take their median, string columns
    /// their most frequent value.
    pub fn imputation(&mut self) -> BenchResult<&mut Self> {
        let started = Instant::now();
        let mut df = self.data()?.clone();

        let targets: Vec<(String, DataType)> = df
            .get_columns()
            .iter()
            .filter(|c| c.null_count() > 0)
            .map(|c| (c.name().to_string(), c.dtype().clone()))
            .collect();

        for (name, dtype) in targets {
            if is_numeric(&dtype) {
                let median = features::fit_median(&df, &name)?;
                df = features::impute_numeric(&df, &name, median)?;
            } else if dtype == DataType::String {
                let mode = features::fit_mode(&df, &name)?;
                df = features::impute_categorical(&df, &name, &mode)?;
            } else {
                debug!("Skipping imputation of column '{}' ({:?})", name, dtype);
            }
        }

        self.data = Some(df);
        self.finish_step("imputation", started);
        Ok(self)
    }

    pub fn normalization(&mut self, method: NormalizationMethod) -> BenchResult<&mut Self> {
        let started = Instant::now();
        let columns = self.columns_where(is_numeric)?;
        let mut df = self.data()?.clone();

        for name in &columns {
            df = match method {
                NormalizationMethod::MinMax => {
                    let stats = features::fit_minmax(&df, name)?;
                    features::transform_minmax(&df, name, &stats)?
                }
                NormalizationMethod::ZScore => {
                    let stats = features::fit_standard(&df, name, 0)?;
                    features::transform_standard(&df, name, &stats)?
                }
            };
        }

        self.data = Some(df);
        self.finish_step("normalization", started);
        Ok(self)
    }

    /// Drop-first one-hot encoding of each listed string column.
    pub fn one_hot_encoding(&mut self, columns: &[&str]) -> BenchResult<&mut Self> {
        let started = Instant::now();
        let mut df = self.data()?.clone();

        for &name in columns {
            let vocab = features::fit_onehot(&df, name)
                .map_err(|e| BenchError::SessionError(e.to_string()))?;
            df = features::transform_onehot(&df, name, &vocab, true)?;
        }

        self.data = Some(df);
        self.finish_step("one_hot_encoding", started);
        Ok(self)
    }

    /// Outlier pass over every Float64 column.
    pub fn outlier(
        &mut self,
        method: OutlierMethod,
        action: OutlierAction,
    ) -> BenchResult<&mut Self> {
        let started = Instant::now();
        let OutlierMethod::ZScore { threshold } = method;
        let columns = self.columns_where(|dtype| *dtype == DataType::Float64)?;
        let df = self.data()?;

        let mut summaries = Vec::with_capacity(columns.len());
        for name in columns {
            let rows = features::detect_outliers(df, &name, threshold)?;
            debug!("Column '{}': {} outliers (|z| > {})", name, rows.len(), threshold);
            summaries.push(OutlierSummary {
                column: name,
                threshold,
                rows,
            });
        }

        if action == OutlierAction::Remove {
            let mut keep = vec![true; df.height()];
            for summary in &summaries {
                for &row in &summary.rows {
                    keep[row] = false;
                }
            }
            let mask = BooleanChunked::from_slice("keep".into(), &keep);
            let filtered = df.filter(&mask)?;
            self.data = Some(filtered);
        }

        self.outliers = summaries;
        self.finish_step("outlier", started);
        Ok(self)
    }

    pub fn outliers(&self) -> &[OutlierSummary] {
        &self.outliers
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn get_data(&self) -> BenchResult<DataFrame> {
        Ok(self.data()?.clone())
    }

    pub fn into_data(self) -> BenchResult<DataFrame> {
        self.data
            .ok_or_else(|| BenchError::SessionError("no dataset loaded".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const CSV: &str = "age,salary,dept,remote\n\
                       30,100,HR,yes\n\
                       ,200,,no\n\
                       50,300,Eng,no\n\
                       40,400,HR,yes\n";

    fn load(content: &str) -> CleaningSession {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.csv");
        fs::write(&path, content).unwrap();
        let mut session = CleaningSession::new();
        session.load_data(&path).unwrap();
        session
    }

    #[test]
    fn test_stage_before_load_errors() {
        let mut session = CleaningSession::new();
        assert!(matches!(
            session.imputation(),
            Err(BenchError::SessionError(_))
        ));
        assert!(session.get_data().is_err());
    }

    #[test]
    fn test_imputation() {
        let mut session = load(CSV);
        session.imputation().unwrap();
        let df = session.get_data().unwrap();

        assert_eq!(df.column("age").unwrap().null_count(), 0);
        assert_eq!(df.column("dept").unwrap().null_count(), 0);
        // median of 30, 50, 40
        let age = df.column("age").unwrap().cast(&DataType::Float64).unwrap();
        assert_eq!(age.f64().unwrap().get(1), Some(40.0));
        assert_eq!(df.column("dept").unwrap().str().unwrap().get(1), Some("HR"));
    }

    #[test]
    fn test_full_chain() {
        let mut session = load(CSV);
        session
            .imputation()
            .unwrap()
            .normalization(NormalizationMethod::MinMax)
            .unwrap()
            .one_hot_encoding(&["dept"])
            .unwrap()
            .outlier(OutlierMethod::default(), OutlierAction::Detect)
            .unwrap();

        let df = session.get_data().unwrap();
        assert_eq!(df.height(), 4);
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["age", "salary", "remote", "dept_HR"]);

        let salary = df.column("salary").unwrap().f64().unwrap();
        assert_eq!(salary.get(0), Some(0.0));
        assert_eq!(salary.get(3), Some(1.0));

        assert_eq!(session.outliers().len(), 2);
        assert!(session.metrics().step_durations_us.contains_key("outlier"));
        assert_eq!(session.metrics().rows_read, 4);
    }

    #[test]
    fn test_zscore_normalization() {
        let mut session = load("x\n0\n10\n");
        session.normalization(NormalizationMethod::ZScore).unwrap();
        let df = session.get_data().unwrap();
        let x = df.column("x").unwrap().f64().unwrap();
        assert_eq!(x.get(0), Some(-1.0));
        assert_eq!(x.get(1), Some(1.0));
    }

    #[test]
    fn test_one_hot_unknown_column() {
        let mut session = load(CSV);
        assert!(session.one_hot_encoding(&["missing"]).is_err());
    }

    fn spiked_csv() -> String {
        let mut csv = String::from("value\n");
        for _ in 0..20 {
            csv.push_str("1.0\n");
        }
        csv.push_str("500.0\n");
        csv
    }

    #[test]
    fn test_outlier_detect_does_not_mutate() {
        let mut session = load(&spiked_csv());
        let before = session.get_data().unwrap();
        session
            .outlier(OutlierMethod::default(), OutlierAction::Detect)
            .unwrap();
        let after = session.get_data().unwrap();

        assert!(before.equals(&after));
        assert_eq!(session.outliers()[0].rows, vec![20]);
    }

    #[test]
    fn test_outlier_remove_drops_rows() {
        let mut session = load(&spiked_csv());
        session
            .outlier(OutlierMethod::default(), OutlierAction::Remove)
            .unwrap();
        let df = session.into_data().unwrap();
        assert_eq!(df.height(), 20);
    }
}
