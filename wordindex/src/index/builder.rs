use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

use super::InvertedIndex;
use crate::errors::{IndexError, IndexResult};
use crate::filters::list_text_files;
use crate::metrics::PipelineMetrics;
use crate::text;

const BUFFER_CAPACITY: usize = 65536;

/// Words read from one file into a private index
#[derive(Debug)]
pub struct FileIndex {
    pub index: InvertedIndex,
    pub words: usize,
}

/// Reads `path` line by line into a private index.
///
/// Empty lines are skipped and positions count words from 1 across the
/// whole file, so each word's positions come out ascending.
pub fn index_file(path: &Path) -> IndexResult<FileIndex> {
    trace!("Indexing file: {}", path.display());
    let file = File::open(path).map_err(|e| IndexError::from_io(path, e))?;
    let reader = BufReader::with_capacity(BUFFER_CAPACITY, file);

    let index = InvertedIndex::new();
    let path_str = path.to_string_lossy();
    let mut position = 0;

    for line in reader.lines() {
        let line = line.map_err(|e| IndexError::from_io(path, e))?;
        if line.is_empty() {
            continue;
        }
        for word in text::tokenize(&line) {
            position += 1;
            index.add(&word, &path_str, position);
        }
    }

    debug!("Read {} words from {}", position, path.display());
    Ok(FileIndex {
        index,
        words: position,
    })
}

/// Single-threaded index construction.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    metrics: PipelineMetrics,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Indexes one file and merges it into `index`.
    pub fn build_file(&self, index: &InvertedIndex, path: &Path) -> IndexResult<()> {
        let file_index = index_file(path)?;
        index.merge(file_index.index);
        self.metrics.record_file(file_index.words as u64);
        Ok(())
    }

    /// Indexes every file in turn. Failing files are logged and skipped.
    pub fn build_files(&self, index: &InvertedIndex, files: &[PathBuf]) {
        for path in files {
            if let Err(e) = self.build_file(index, path) {
                warn!("Unable to index {}: {}", path.display(), e);
                self.metrics.record_file_failure();
            }
        }
    }

    /// Lists every text file under `root` and indexes them one after another.
    pub fn build_directory(&self, index: &InvertedIndex, root: &Path) -> IndexResult<()> {
        info!("Building index sequentially from {}", root.display());
        let files = list_text_files(root)?;
        self.build_files(index, &files);
        self.metrics.log_stats();
        Ok(())
    }
}
