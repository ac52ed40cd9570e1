use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::concurrent::MultiReaderLock;
use crate::errors::{IndexError, IndexResult};
use crate::results::SearchResult;

/// Query lines in first-seen order, with a slot lookup by line
#[derive(Debug, Default)]
struct Entries {
    order: Vec<(String, Vec<SearchResult>)>,
    slots: HashMap<String, usize>,
}

impl Entries {
    fn contains(&self, line: &str) -> bool {
        self.slots.contains_key(line)
    }

    fn get(&self, line: &str) -> Option<&Vec<SearchResult>> {
        self.slots.get(line).map(|&slot| &self.order[slot].1)
    }

    /// Replaces the value of an existing line or appends a new one.
    fn upsert(&mut self, line: &str, results: Vec<SearchResult>) {
        match self.slots.get(line) {
            Some(&slot) => self.order[slot].1 = results,
            None => {
                self.slots.insert(line.to_string(), self.order.len());
                self.order.push((line.to_string(), results));
            }
        }
    }
}

/// Ranked results per query line, kept in the order lines were first seen.
///
/// Tasks share a table through an `Arc`. Keys are reserved by the submitter
/// before any search runs, so the iteration order never depends on which
/// search finishes first.
#[derive(Default)]
pub struct ResultTable {
    entries: MultiReaderLock<Entries>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an empty entry for `line` unless it is already present.
    ///
    /// Returns whether the entry was inserted.
    pub fn reserve(&self, line: &str) -> bool {
        let mut entries = self.entries.write();
        if entries.contains(line) {
            return false;
        }
        entries.upsert(line, Vec::new());
        true
    }

    /// Stores `results` for `line`. An existing key keeps its position.
    pub fn insert(&self, line: &str, results: Vec<SearchResult>) {
        self.entries.write().upsert(line, results);
    }

    pub fn get(&self, line: &str) -> Option<Vec<SearchResult>> {
        self.entries.read().get(line).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().order.is_empty()
    }

    /// Query lines in first-seen order
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .read()
            .order
            .iter()
            .map(|(line, _)| line.clone())
            .collect()
    }

    /// Moves every entry out of `self`, leaving it empty.
    pub fn take(&self) -> ResultTable {
        let entries = std::mem::take(&mut *self.entries.write());
        ResultTable {
            entries: MultiReaderLock::new(entries),
        }
    }

    /// Writes each line, its ranked results and a blank line.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let entries = self.entries.read();
        for (line, results) in &entries.order {
            writeln!(writer, "{}", line)?;
            for result in results {
                writeln!(writer, "{}", result)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    pub fn write_to_file(&self, path: &Path) -> IndexResult<()> {
        debug!("Writing query results to {}", path.display());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IndexError::from_io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| IndexError::from_io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| IndexError::from_io(path, e))
    }
}

impl fmt::Debug for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultTable")
            .field("queries", &self.len())
            .finish()
    }
}
