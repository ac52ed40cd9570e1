//! Selection of the files that make up the corpus.
//!
//! Only plain text files are indexed: a file qualifies when its extension is
//! `txt`, compared case-insensitively (`notes.TXT` counts). The parallel
//! builder applies [`has_text_extension`] while it discovers entries one
//! directory at a time; the sequential builder lists the whole tree up front
//! with [`list_text_files`].
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::errors::{IndexError, IndexResult};

/// Extension of the files that are indexed
pub const TEXT_EXTENSION: &str = "txt";

/// Checks if a path carries the text extension, ignoring case
pub fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TEXT_EXTENSION))
}

/// Checks if a path is an existing regular file with the text extension
pub fn is_text_file(path: &Path) -> bool {
    path.is_file() && has_text_extension(path)
}

/// Lists every text file under `root`, sorted by path.
///
/// A `root` that is itself a text file yields just that file. Symbolic links
/// are followed; a link back to one of its own ancestors is skipped. Entries
/// that cannot be read while walking are logged and skipped.
pub fn list_text_files(root: &Path) -> IndexResult<Vec<PathBuf>> {
    let metadata = std::fs::metadata(root).map_err(|e| IndexError::from_io(root, e))?;

    if metadata.is_file() {
        return if has_text_extension(root) {
            Ok(vec![root.to_path_buf()])
        } else {
            Err(IndexError::not_a_directory(root))
        };
    }

    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(true)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Unable to traverse entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| has_text_extension(entry.path()))
        .map(|entry| {
            trace!("Found text file: {}", entry.path().display());
            entry.into_path()
        })
        .collect();

    files.sort();
    debug!("Found {} text files under {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_has_text_extension() {
        assert!(has_text_extension(Path::new("notes.txt")));
        assert!(has_text_extension(Path::new("dir/NOTES.TXT")));
        assert!(has_text_extension(Path::new("mixed.TxT")));
        assert!(!has_text_extension(Path::new("notes.md")));
        assert!(!has_text_extension(Path::new("txt")));
        assert!(!has_text_extension(Path::new("archive.txt.gz")));
    }

    #[test]
    fn test_is_text_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.TXT");
        fs::write(&file, "notes").unwrap();
        fs::create_dir(dir.path().join("folder.txt")).unwrap();

        assert!(is_text_file(&file));
        assert!(!is_text_file(&dir.path().join("folder.txt")));
        assert!(!is_text_file(&dir.path().join("absent.txt")));
    }

    #[test]
    fn test_list_text_files_recurses() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("root.txt"), "root").unwrap();
        fs::write(dir.path().join("a/one.TXT"), "one").unwrap();
        fs::write(dir.path().join("a/b/two.txt"), "two").unwrap();
        fs::write(dir.path().join("a/b/skip.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join(".hidden.txt"), "hidden").unwrap();

        let files = list_text_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from(".hidden.txt"),
                PathBuf::from("a/b/two.txt"),
                PathBuf::from("a/one.TXT"),
                PathBuf::from("root.txt"),
            ]
        );
    }

    #[test]
    fn test_list_text_files_single_file_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("only.txt");
        fs::write(&file, "only").unwrap();

        assert_eq!(list_text_files(&file).unwrap(), vec![file]);

        let other = dir.path().join("image.png");
        fs::write(&other, [0u8, 1, 2]).unwrap();
        assert!(matches!(
            list_text_files(&other),
            Err(IndexError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_list_text_files_missing_root() {
        let dir = tempdir().unwrap();
        let result = list_text_files(&dir.path().join("missing"));
        assert!(matches!(result, Err(IndexError::FileNotFound(_))));
    }
}
