use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::builder::index_file;
use super::InvertedIndex;
use crate::concurrent::{CompletionBarrier, WorkQueue};
use crate::config::ThreadCount;
use crate::errors::{IndexError, IndexResult};
use crate::filters::is_text_file;
use crate::metrics::PipelineMetrics;

/// Builds an index by fanning out over a directory tree on a worker pool.
///
/// Every directory becomes a task that lists its entries and submits one
/// task per sub-directory and one per text file. A file task reads its file
/// into a private index and merges it into the shared one, so the shared
/// write lock is only held for the merge itself. [`build`](Self::build)
/// returns once the whole fan-out has finished.
///
/// Symbolic links are followed. A directory link that resolves to one of its
/// own ancestors is skipped, so cyclic trees terminate.
pub struct ParallelIndexBuilder {
    queue: Arc<WorkQueue>,
    barrier: Arc<CompletionBarrier>,
    metrics: PipelineMetrics,
}

/// Shared handles carried by every task of one build
#[derive(Clone)]
struct BuildTask {
    queue: Arc<WorkQueue>,
    barrier: Arc<CompletionBarrier>,
    metrics: PipelineMetrics,
    index: Arc<InvertedIndex>,
}

impl ParallelIndexBuilder {
    pub fn new(threads: ThreadCount) -> IndexResult<Self> {
        Ok(Self {
            queue: Arc::new(WorkQueue::new(threads)?),
            barrier: Arc::new(CompletionBarrier::new()),
            metrics: PipelineMetrics::new(),
        })
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Indexes every text file under `root` into `index` and waits for completion.
    ///
    /// Fails only when `root` itself cannot be read; unreadable entries below
    /// it are logged and skipped.
    pub fn build(&self, index: &Arc<InvertedIndex>, root: &Path) -> IndexResult<()> {
        info!(
            "Building index from {} with {} workers",
            root.display(),
            self.queue.size()
        );
        let task = BuildTask {
            queue: Arc::clone(&self.queue),
            barrier: Arc::clone(&self.barrier),
            metrics: self.metrics.clone(),
            index: Arc::clone(index),
        };

        let metadata = fs::metadata(root).map_err(|e| IndexError::from_io(root, e))?;
        if metadata.is_dir() {
            let listing = fs::read_dir(root).map_err(|e| IndexError::from_io(root, e))?;
            let canonical = fs::canonicalize(root).map_err(|e| IndexError::from_io(root, e))?;
            task.submit_listing(root.to_path_buf(), listing, vec![canonical]);
        } else if is_text_file(root) {
            task.submit_file(root.to_path_buf());
        } else {
            return Err(IndexError::not_a_directory(root));
        }

        self.barrier.await_zero();
        debug!("Finished building index from {}", root.display());
        self.metrics.log_stats();
        Ok(())
    }

    /// Waits for outstanding work and stops the workers.
    pub fn shutdown(&self) {
        self.barrier.await_zero();
        self.queue.shutdown();
    }
}

impl Drop for ParallelIndexBuilder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl BuildTask {
    /// `ancestors` holds the resolved paths of `dir` and every directory above it.
    fn submit_directory(&self, dir: PathBuf, ancestors: Vec<PathBuf>) {
        let guard = self.barrier.enter();
        let task = self.clone();
        self.queue.execute(move || {
            let _guard = guard;
            match fs::read_dir(&dir) {
                Ok(listing) => task.traverse(&dir, listing, &ancestors),
                Err(e) => {
                    warn!("Unable to traverse directory {}: {}", dir.display(), e);
                    task.metrics.record_directory_failure();
                }
            }
        });
    }

    fn submit_listing(&self, dir: PathBuf, listing: ReadDir, ancestors: Vec<PathBuf>) {
        let guard = self.barrier.enter();
        let task = self.clone();
        self.queue.execute(move || {
            let _guard = guard;
            task.traverse(&dir, listing, &ancestors);
        });
    }

    fn submit_file(&self, path: PathBuf) {
        let guard = self.barrier.enter();
        let task = self.clone();
        self.queue.execute(move || {
            let _guard = guard;
            task.build_file(&path);
        });
    }

    fn traverse(&self, dir: &Path, listing: ReadDir, ancestors: &[PathBuf]) {
        trace!("Traversing directory: {}", dir.display());
        self.metrics.record_directory();

        for entry in listing {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("Unable to read entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            if path.is_dir() {
                let canonical = match fs::canonicalize(&path) {
                    Ok(canonical) => canonical,
                    Err(e) => {
                        warn!("Unable to resolve {}: {}", path.display(), e);
                        continue;
                    }
                };
                if ancestors.contains(&canonical) {
                    warn!("Skipping symlink loop at {}", path.display());
                    continue;
                }
                let mut chain = ancestors.to_vec();
                chain.push(canonical);
                self.submit_directory(path, chain);
            } else if is_text_file(&path) {
                self.submit_file(path);
            }
        }
    }

    fn build_file(&self, path: &Path) {
        match index_file(path) {
            Ok(file_index) => {
                self.index.merge(file_index.index);
                self.metrics.record_file(file_index.words as u64);
            }
            Err(e) => {
                warn!("Unable to index {}: {}", path.display(), e);
                self.metrics.record_file_failure();
            }
        }
    }
}
