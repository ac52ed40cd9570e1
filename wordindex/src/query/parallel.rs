use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::{for_each_query, ResultTable};
use crate::concurrent::{CompletionBarrier, WorkQueue};
use crate::config::ThreadCount;
use crate::errors::{IndexError, IndexResult};
use crate::index::InvertedIndex;
use crate::metrics::PipelineMetrics;
use crate::text;

/// Evaluates query lines on a worker pool.
///
/// The source is read on the calling thread. Each new line is reserved in
/// the table before its search task is submitted, which keeps the output in
/// first-seen order however the searches interleave.
pub struct ParallelQueryRunner {
    queue: WorkQueue,
    barrier: Arc<CompletionBarrier>,
    table: Arc<ResultTable>,
    metrics: PipelineMetrics,
}

impl ParallelQueryRunner {
    pub fn new(threads: ThreadCount) -> IndexResult<Self> {
        Ok(Self {
            queue: WorkQueue::new(threads)?,
            barrier: Arc::new(CompletionBarrier::new()),
            table: Arc::new(ResultTable::new()),
            metrics: PipelineMetrics::new(),
        })
    }

    /// The shared table. Only complete once a search call has returned.
    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    /// Waits for outstanding searches and moves the results out.
    pub fn take_table(&self) -> ResultTable {
        self.barrier.await_zero();
        self.table.take()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Searches every query line of the file at `path`.
    pub fn search_file(&self, index: &Arc<InvertedIndex>, path: &Path) -> IndexResult<()> {
        info!(
            "Searching queries from {} with {} workers",
            path.display(),
            self.queue.size()
        );
        let file = File::open(path).map_err(|e| IndexError::from_io(path, e))?;
        self.search_reader(index, BufReader::new(file))
            .map_err(|e| match e {
                IndexError::IoError(source) => IndexError::from_io(path, source),
                other => other,
            })
    }

    /// Submits one search per query line and waits for all of them.
    ///
    /// On a read error the searches already submitted still finish before
    /// the error is returned.
    pub fn search_reader<R: BufRead>(
        &self,
        index: &Arc<InvertedIndex>,
        reader: R,
    ) -> IndexResult<()> {
        let result = for_each_query(reader, |query| self.submit(index, query));
        self.barrier.await_zero();
        debug!("Finished {} queries", self.table.len());
        result
    }

    fn submit(&self, index: &Arc<InvertedIndex>, query: String) {
        self.table.reserve(&query);
        let guard = self.barrier.enter();
        let index = Arc::clone(index);
        let table = Arc::clone(&self.table);
        let metrics = self.metrics.clone();
        self.queue.execute(move || {
            let _guard = guard;
            trace!("Searching query: {}", query);
            let results = index.search(&text::tokenize(&query));
            table.insert(&query, results);
            metrics.record_query();
        });
    }

    /// Waits for outstanding searches and stops the workers.
    pub fn shutdown(&self) {
        self.barrier.await_zero();
        self.queue.shutdown();
    }
}

impl Drop for ParallelQueryRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
