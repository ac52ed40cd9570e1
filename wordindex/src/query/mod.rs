//! Evaluating query files against a built index.
//!
//! Every non-empty cleaned line of a query source is one query. Its tokens
//! are prefix-searched and the ranked results are stored in a
//! [`ResultTable`] keyed by the cleaned line, in the order lines were first
//! seen.
use std::io::BufRead;

use crate::errors::IndexResult;
use crate::text;

pub mod parallel;
pub mod runner;
pub mod table;

pub use parallel::ParallelQueryRunner;
pub use runner::QueryRunner;
pub use table::ResultTable;

/// Calls `f` with each non-empty cleaned line of `reader`.
pub(crate) fn for_each_query<R, F>(reader: R, mut f: F) -> IndexResult<()>
where
    R: BufRead,
    F: FnMut(String),
{
    for line in reader.lines() {
        let query = text::clean(&line?);
        if !query.is_empty() {
            f(query);
        }
    }
    Ok(())
}
