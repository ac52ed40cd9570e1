use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, trace};

use super::{for_each_query, ResultTable};
use crate::errors::{IndexError, IndexResult};
use crate::index::InvertedIndex;
use crate::metrics::PipelineMetrics;
use crate::text;

/// Evaluates query lines one after another on the calling thread.
#[derive(Debug, Default)]
pub struct QueryRunner {
    table: ResultTable,
    metrics: PipelineMetrics,
}

impl QueryRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    pub fn into_table(self) -> ResultTable {
        self.table
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Searches every query line of the file at `path`.
    pub fn search_file(&self, index: &InvertedIndex, path: &Path) -> IndexResult<()> {
        info!("Searching queries from {}", path.display());
        let file = File::open(path).map_err(|e| IndexError::from_io(path, e))?;
        self.search_reader(index, BufReader::new(file))
            .map_err(|e| match e {
                IndexError::IoError(source) => IndexError::from_io(path, source),
                other => other,
            })
    }

    pub fn search_reader<R: BufRead>(&self, index: &InvertedIndex, reader: R) -> IndexResult<()> {
        for_each_query(reader, |query| self.search_line(index, query))?;
        debug!("Finished {} queries", self.table.len());
        Ok(())
    }

    fn search_line(&self, index: &InvertedIndex, query: String) {
        trace!("Searching query: {}", query);
        let results = index.search(&text::tokenize(&query));
        self.table.insert(&query, results);
        self.metrics.record_query();
    }
}
