pub mod bench;
pub mod config;
pub mod errors;
pub mod features;
pub mod generate;
pub mod io;
pub mod measure;
pub mod observability;
pub mod pipelines;
pub mod profile;
pub mod session;

pub use bench::{speed_delta_pct, PipelineStats, SizeReport};
pub use config::BenchConfig;
pub use errors::{BenchError, BenchResult};
pub use measure::{measure, TracingAllocator, Trial};
pub use pipelines::Runner;
pub use session::CleaningSession;
