//! Entry points that pick the sequential or the parallel implementation.
//!
//! `None` for the thread count means everything runs on the calling thread.
use std::path::Path;
use std::sync::Arc;

use crate::config::ThreadCount;
use crate::errors::IndexResult;
use crate::index::{IndexBuilder, InvertedIndex, ParallelIndexBuilder};
use crate::metrics::PipelineStats;
use crate::query::{ParallelQueryRunner, QueryRunner, ResultTable};

/// Builds the index of every text file under `root`.
pub fn build_index(
    root: &Path,
    threads: Option<ThreadCount>,
) -> IndexResult<(Arc<InvertedIndex>, PipelineStats)> {
    let index = Arc::new(InvertedIndex::new());
    let stats = match threads {
        Some(threads) => {
            let builder = ParallelIndexBuilder::new(threads)?;
            builder.build(&index, root)?;
            builder.metrics().snapshot()
        }
        None => {
            let builder = IndexBuilder::new();
            builder.build_directory(&index, root)?;
            builder.metrics().snapshot()
        }
    };
    Ok((index, stats))
}

/// Evaluates every query line of `query_path` against `index`.
pub fn run_queries(
    index: &Arc<InvertedIndex>,
    query_path: &Path,
    threads: Option<ThreadCount>,
) -> IndexResult<(ResultTable, PipelineStats)> {
    match threads {
        Some(threads) => {
            let runner = ParallelQueryRunner::new(threads)?;
            runner.search_file(index, query_path)?;
            let stats = runner.metrics().snapshot();
            Ok((runner.take_table(), stats))
        }
        None => {
            let runner = QueryRunner::new();
            runner.search_file(index, query_path)?;
            let stats = runner.metrics().snapshot();
            Ok((runner.into_table(), stats))
        }
    }
}
