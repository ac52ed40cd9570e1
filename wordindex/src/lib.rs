pub mod concurrent;
pub mod config;
pub mod errors;
pub mod filters;
pub mod index;
pub mod metrics;
pub mod pipeline;
pub mod query;
pub mod results;
pub mod text;

pub use config::{IndexConfig, ThreadCount};
pub use errors::{IndexError, IndexResult};
pub use index::{IndexBuilder, InvertedIndex, ParallelIndexBuilder};
pub use metrics::{PipelineMetrics, PipelineStats};
pub use pipeline::{build_index, run_queries};
pub use query::{ParallelQueryRunner, QueryRunner, ResultTable};
pub use results::SearchResult;
