//! Target selection: the file(s) or folder the assistant works on.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no paths were selected")]
    Empty,
}

/// The user's chosen scope: an ordered, non-empty set of paths plus the
/// working directory derived from the first of them. Immutable once built;
/// a new selection replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSelection {
    paths: Vec<PathBuf>,
    working_dir: PathBuf,
}

impl TargetSelection {
    pub fn new(paths: Vec<PathBuf>) -> Result<Self, SelectionError> {
        let first = paths.first().ok_or(SelectionError::Empty)?;
        let working_dir = working_dir_of(first);
        Ok(Self { paths, working_dir })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Short label text for the selector row.
    pub fn describe(&self) -> String {
        match self.paths.as_slice() {
            [single] => format!("Selected: {}", single.display()),
            many => format!(
                "Selected: {} paths in {}",
                many.len(),
                self.working_dir.display()
            ),
        }
    }
}

/// Parent of the given path. A bare file name has the current directory as
/// its parent; the filesystem root is its own working directory.
fn working_dir_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_path_uses_its_parent() {
        let sel = TargetSelection::new(vec![PathBuf::from("/proj/src/main.rs")]).unwrap();
        assert_eq!(sel.working_dir(), Path::new("/proj/src"));
        assert_eq!(sel.paths().len(), 1);
    }

    #[test]
    fn multi_path_uses_first_paths_parent() {
        let sel = TargetSelection::new(vec![
            PathBuf::from("/proj/a/one.rs"),
            PathBuf::from("/proj/b/two.rs"),
        ])
        .unwrap();
        assert_eq!(sel.working_dir(), Path::new("/proj/a"));
    }

    #[test]
    fn bare_file_name_falls_back_to_current_dir() {
        let sel = TargetSelection::new(vec![PathBuf::from("main.rs")]).unwrap();
        assert_eq!(sel.working_dir(), Path::new("."));
    }

    #[test]
    fn filesystem_root_is_its_own_working_dir() {
        let sel = TargetSelection::new(vec![PathBuf::from("/")]).unwrap();
        assert_eq!(sel.working_dir(), Path::new("/"));
    }

    #[test]
    fn empty_selection_is_rejected() {
        assert_eq!(
            TargetSelection::new(Vec::new()).unwrap_err(),
            SelectionError::Empty
        );
    }

    #[test]
    fn describe_mentions_count_for_multi_selection() {
        let sel = TargetSelection::new(vec![
            PathBuf::from("/proj/a.rs"),
            PathBuf::from("/proj/b.rs"),
        ])
        .unwrap();
        assert!(sel.describe().contains("2 paths"));
    }
}
