use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code("PREPBENCH-001"),
        help("Please check the benchmark flags or the YAML config file.")
    )]
    ConfigError(String, #[label("here")] Option<SourceSpan>),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code("PREPBENCH-002"),
        help("Check file paths and permissions of the temporary directory.")
    )]
    IoError(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    #[diagnostic(
        code("PREPBENCH-003"),
        help("An error occurred within the data processing engine.")
    )]
    PolarsError(#[from] polars::error::PolarsError),

    #[error("Dataset generation error: {0}")]
    #[diagnostic(
        code("PREPBENCH-004"),
        help("Synthetic data parameters must describe valid distributions.")
    )]
    GenerationError(String),

    #[error("Pipeline error: {0}")]
    #[diagnostic(
        code("PREPBENCH-005"),
        help("The baseline pipeline could not clean the dataset.")
    )]
    PipelineError(String),

    #[error("Cleaning session error: {0}")]
    #[diagnostic(
        code("PREPBENCH-006"),
        help("Load a dataset before applying cleaning stages.")
    )]
    SessionError(String),

    #[error("Profiling error: {0}")]
    #[diagnostic(
        code("PREPBENCH-007"),
        help("The sampling profiler is only available on unix targets.")
    )]
    ProfileError(String),

    #[error("Report error: {0}")]
    #[diagnostic(code("PREPBENCH-008"), help("Failed to serialize the benchmark report."))]
    ReportError(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code("PREPBENCH-000"))]
    Unknown(#[from] anyhow::Error),
}

impl BenchError {
    pub fn config(msg: impl Into<String>) -> Self {
        BenchError::ConfigError(msg.into(), None)
    }
}

pub type BenchResult<T> = Result<T, BenchError>;
