use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::CoreError;

/// Extension of AGK source files.
pub const SOURCE_EXTENSION: &str = "agk";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the root that was walked.
    pub path: PathBuf,
    pub contents: String,
}

/// Every `.agk` file under `root`, in a stable order.
pub fn load_sources(root: impl AsRef<Path>) -> Result<Vec<SourceFile>, CoreError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(CoreError::MissingSourceRoot(root.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            let contents = fs::read_to_string(path)?;
            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            files.push(SourceFile {
                path: relative,
                contents,
            });
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_agk_files_recursively() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir(dir.path().join("nested")).expect("nested dir");
        fs::write(dir.path().join("main.agk"), "print(1)\n").expect("write main");
        fs::write(dir.path().join("nested/util.agk"), "print(2)\n").expect("write util");
        fs::write(dir.path().join("notes.txt"), "not source").expect("write notes");

        let files = load_sources(dir.path()).expect("sources load");
        let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("main.agk"), PathBuf::from("nested").join("util.agk")]
        );
        assert_eq!(files[0].contents, "print(1)\n");
    }

    #[test]
    fn missing_root_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent");
        assert!(matches!(
            load_sources(&missing),
            Err(CoreError::MissingSourceRoot(path)) if path == missing
        ));
    }
}
