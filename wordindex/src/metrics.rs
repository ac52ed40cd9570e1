use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Counters describing one pipeline run, shared by all of its tasks.
///
/// Cloning yields a handle to the same counters.
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    directories_traversed: Arc<AtomicU64>,
    directories_failed: Arc<AtomicU64>,
    files_indexed: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,
    words_indexed: Arc<AtomicU64>,
    queries_searched: Arc<AtomicU64>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            directories_traversed: Arc::new(AtomicU64::new(0)),
            directories_failed: Arc::new(AtomicU64::new(0)),
            files_indexed: Arc::new(AtomicU64::new(0)),
            files_failed: Arc::new(AtomicU64::new(0)),
            words_indexed: Arc::new(AtomicU64::new(0)),
            queries_searched: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a directory whose entries were listed
    pub fn record_directory(&self) {
        self.directories_traversed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a directory that could not be listed
    pub fn record_directory_failure(&self) {
        self.directories_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file merged into the index with its word count
    pub fn record_file(&self, words: u64) {
        self.files_indexed.fetch_add(1, Ordering::Relaxed);
        let total = self.words_indexed.fetch_add(words, Ordering::Relaxed) + words;
        debug!("Indexed {} words, total: {}", words, total);
    }

    /// Records a file whose contribution was dropped
    pub fn record_file_failure(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one evaluated query line
    pub fn record_query(&self) {
        self.queries_searched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            directories_traversed: self.directories_traversed.load(Ordering::Relaxed),
            directories_failed: self.directories_failed.load(Ordering::Relaxed),
            files_indexed: self.files_indexed.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            words_indexed: self.words_indexed.load(Ordering::Relaxed),
            queries_searched: self.queries_searched.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.snapshot();
        info!(
            "Pipeline stats:\n\
             Directories traversed/failed: {}/{}\n\
             Files indexed/failed: {}/{}\n\
             Words indexed: {}\n\
             Queries searched: {}",
            stats.directories_traversed,
            stats.directories_failed,
            stats.files_indexed,
            stats.files_failed,
            stats.words_indexed,
            stats.queries_searched
        );
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`PipelineMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub directories_traversed: u64,
    pub directories_failed: u64,
    pub files_indexed: u64,
    pub files_failed: u64,
    pub words_indexed: u64,
    pub queries_searched: u64,
}
