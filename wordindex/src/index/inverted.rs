use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::ops::Bound;
use std::path::Path;
use tracing::{debug, trace, warn};

use crate::concurrent::MultiReaderLock;
use crate::errors::{IndexError, IndexResult};
use crate::results::SearchResult;

/// Positions of one word within one file, ascending
type Positions = Vec<usize>;
/// path -> positions
type PathMap = BTreeMap<String, Positions>;
/// word -> path -> positions
type WordMap = BTreeMap<String, PathMap>;

/// Thread-safe inverted index: word -> path -> ascending 1-based positions.
///
/// Words and paths are kept in sorted order, so every word sharing a prefix
/// sits in one contiguous range and the dump is deterministic. Mutation
/// (`add`, `add_all`, `merge`) takes the write lock; everything else takes the
/// read lock.
#[derive(Default)]
pub struct InvertedIndex {
    words: MultiReaderLock<WordMap>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `word` at `position` in `path`.
    pub fn add(&self, word: &str, path: &str, position: usize) {
        let mut words = self.words.write();
        if let Some(paths) = words.get_mut(word) {
            match paths.get_mut(path) {
                Some(positions) => positions.push(position),
                None => {
                    paths.insert(path.to_string(), vec![position]);
                }
            }
            return;
        }
        let paths = PathMap::from([(path.to_string(), vec![position])]);
        words.insert(word.to_string(), paths);
    }

    /// Merges a copy of `other` into this index.
    ///
    /// Positions of a path already present are appended after the existing
    /// ones, so a path must only ever come from one source index for its
    /// positions to stay ascending.
    pub fn add_all(&self, other: &InvertedIndex) {
        if std::ptr::eq(self, other) {
            warn!("Ignoring merge of an index into itself");
            return;
        }
        // Copy under the source's read lock, then release it before writing
        let snapshot = other.words.read().clone();
        self.merge_words(snapshot);
    }

    /// Merges `other` into this index, taking ownership of its entries.
    pub fn merge(&self, other: InvertedIndex) {
        self.merge_words(other.words.into_inner());
    }

    fn merge_words(&self, other: WordMap) {
        let mut words = self.words.write();
        for (word, other_paths) in other {
            match words.entry(word) {
                Entry::Vacant(slot) => {
                    slot.insert(other_paths);
                }
                Entry::Occupied(mut slot) => {
                    let paths = slot.get_mut();
                    for (path, positions) in other_paths {
                        paths.entry(path).or_default().extend(positions);
                    }
                }
            }
        }
    }

    /// Finds every indexed word starting with one of `tokens` and ranks the
    /// files they occur in.
    ///
    /// All tokens fold into the same per-file aggregate, so a file matching
    /// two tokens accumulates both counts.
    pub fn search<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<SearchResult> {
        let words = self.words.read();
        let mut by_path: HashMap<&str, SearchResult> = HashMap::new();

        for token in tokens {
            let token = token.as_ref();
            let matches = words
                .range::<str, _>((Bound::Included(token), Bound::Unbounded))
                .take_while(|(word, _)| word.starts_with(token));

            for (word, paths) in matches {
                trace!("Token '{}' matched word '{}'", token, word);
                for (path, positions) in paths {
                    let Some(&first) = positions.first() else {
                        continue;
                    };
                    by_path
                        .entry(path.as_str())
                        .and_modify(|result| result.update(positions.len(), first))
                        .or_insert_with(|| SearchResult::new(path.as_str(), positions.len(), first));
                }
            }
        }
        let mut results: Vec<SearchResult> = by_path.into_values().collect();
        drop(words);

        results.sort();
        results
    }

    /// Writes the index dump: each word, then one `"path", p1, p2, ...` line per
    /// file, then a blank line.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let words = self.words.read();
        for (word, paths) in words.iter() {
            write!(writer, "{}", word)?;
            for (path, positions) in paths {
                write!(writer, "\n\"{}\"", path)?;
                for position in positions {
                    write!(writer, ", {}", position)?;
                }
            }
            writeln!(writer)?;
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Writes the index dump to `path`, creating parent directories as needed.
    pub fn write_to_file(&self, path: &Path) -> IndexResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IndexError::from_io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| IndexError::from_io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        debug!("Wrote index with {} words to {}", self.word_count(), path.display());
        Ok(())
    }

    /// Number of distinct words
    pub fn word_count(&self) -> usize {
        self.words.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.read().is_empty()
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.words.read().contains_key(word)
    }

    /// Positions of `word` in `path`, if it occurs there
    pub fn positions(&self, word: &str, path: &str) -> Option<Vec<usize>> {
        self.words
            .read()
            .get(word)
            .and_then(|paths| paths.get(path))
            .cloned()
    }

    /// All indexed words in sorted order
    pub fn words(&self) -> Vec<String> {
        self.words.read().keys().cloned().collect()
    }
}

impl fmt::Debug for InvertedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvertedIndex")
            .field("words", &self.word_count())
            .finish()
    }
}
