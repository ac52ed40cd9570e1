//! The inverted index and the two ways of building it.
//!
//! [`IndexBuilder`] walks the tree up front and indexes one file after
//! another on the calling thread. [`ParallelIndexBuilder`] discovers the tree
//! while it indexes, one task per directory and per file. Both read each
//! file into a private [`InvertedIndex`] first and merge it into the shared
//! one afterwards, so their dumps are identical.
pub mod builder;
pub mod inverted;
pub mod parallel;

pub use builder::{index_file, FileIndex, IndexBuilder};
pub use inverted::InvertedIndex;
pub use parallel::ParallelIndexBuilder;
