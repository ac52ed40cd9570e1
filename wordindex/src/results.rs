//! Search result types.
//!
//! A [`SearchResult`] aggregates, for one query and one file, how many
//! occurrences of matching words were found and the earliest position of any
//! of them. Results rank by:
//!
//! 1. `total_count`, highest first
//! 2. `first_position`, lowest first
//! 3. `path`, alphabetically ignoring case
//!
//! Paths that differ only in case fall back to an exact comparison, so the
//! order is total and sorting never depends on the order results were
//! aggregated in.
use std::cmp::Ordering;
use std::fmt;

/// Aggregated matches of one query within one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// The file the matches were found in
    path: String,
    /// Number of matching word occurrences in the file
    total_count: usize,
    /// Smallest position of any matching occurrence
    first_position: usize,
}

impl SearchResult {
    /// Creates a result for the first matching word seen in `path`
    pub fn new(path: impl Into<String>, total_count: usize, first_position: usize) -> Self {
        Self {
            path: path.into(),
            total_count,
            first_position,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn first_position(&self) -> usize {
        self.first_position
    }

    /// Adds the occurrences of another matching word
    pub fn add_frequency(&mut self, count: usize) {
        self.total_count += count;
    }

    /// Keeps the smaller of the current and the given first position
    pub fn update_position(&mut self, position: usize) {
        self.first_position = self.first_position.min(position);
    }

    /// Folds another matching word's occurrences into this result
    pub fn update(&mut self, count: usize, first_position: usize) {
        self.add_frequency(count);
        self.update_position(first_position);
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .total_count
            .cmp(&self.total_count)
            .then_with(|| self.first_position.cmp(&other.first_position))
            .then_with(|| compare_ignore_case(&self.path, &other.path))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\", {}, {}",
            self.path, self.total_count, self.first_position
        )
    }
}
