use crate::errors::{BenchError, BenchResult};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn read_csv<P: AsRef<Path>>(path: P) -> BenchResult<LazyFrame> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()
        .map_err(BenchError::PolarsError)
}

/// Write `df` as CSV with a header row. Nulls are written as empty fields.
pub fn write_csv<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> BenchResult<()> {
    let mut file = File::create(path).map_err(BenchError::IoError)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(BenchError::PolarsError)?;
    Ok(())
}

/// Serialize `df` to a freshly allocated temporary `.csv` file.
///
/// The file outlives this call; the caller owns the returned path and must
/// eventually pass it to [`remove`] (or wrap it in a [`PersistedCsv`]).
pub fn persist(df: &mut DataFrame) -> BenchResult<PathBuf> {
    let mut tmp = tempfile::Builder::new()
        .prefix("prepbench-")
        .suffix(".csv")
        .tempfile()
        .map_err(BenchError::IoError)?;

    CsvWriter::new(tmp.as_file_mut())
        .include_header(true)
        .finish(df)
        .map_err(BenchError::PolarsError)?;

    let (_file, path) = tmp.keep().map_err(|e| BenchError::IoError(e.error))?;
    debug!("Persisted {} rows to {:?}", df.height(), path);
    Ok(path)
}

/// Best-effort removal. A file that is already gone or that the OS refuses
/// to delete is not an error.
pub fn remove<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{:?} already removed", path)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            debug!("Permission denied removing {:?}: {}", path, e)
        }
        Err(e) => warn!("Failed to remove {:?}: {}", path, e),
    }
}

/// Owns a persisted dataset and removes it on drop.
#[derive(Debug)]
pub struct PersistedCsv {
    path: PathBuf,
}

impl PersistedCsv {
    pub fn new(df: &mut DataFrame) -> BenchResult<Self> {
        Ok(Self {
            path: persist(df)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PersistedCsv {
    fn drop(&mut self) {
        remove(&self.path);
    }
}
