//! File and path utilities

use crate::{CliError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Utilities for working with files and paths
pub struct FileUtils;

impl FileUtils {
    /// Find all Python strategy sources in a directory, sorted by path.
    /// Underscore-prefixed files such as `__init__.py` are ignored.
    pub fn find_strategy_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = entry.map_err(|e| CliError::Io(e.into()))?;

            if !entry.file_type().is_file() {
                continue;
            }
            if Self::is_strategy_file(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Check if a path looks like a strategy source file
    pub fn is_strategy_file(path: &Path) -> bool {
        let has_extension = path.extension().is_some_and(|ext| ext == "py");
        let visible = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| !name.starts_with('_'));
        has_extension && visible
    }

    /// Ensure a directory exists, creating it if necessary
    pub fn ensure_dir_exists(dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(CliError::Io)?;
        }
        Ok(())
    }

    /// Write content through a sibling temp file and rename, so a watching
    /// build never observes a half-written module.
    pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir_exists(parent)?;
            }
        }
        let tmp = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => path.with_file_name(format!("{name}.tmp")),
            None => {
                return Err(CliError::InvalidInput(format!(
                    "Not a writable path: {}",
                    path.display()
                )))
            }
        };

        fs::write(&tmp, content).map_err(CliError::Io)?;
        fs::rename(&tmp, path).map_err(CliError::Io)?;
        Ok(())
    }

    /// Get the modification time of a file
    pub fn modification_time(path: &Path) -> Result<std::time::SystemTime> {
        let metadata = fs::metadata(path).map_err(CliError::Io)?;

        metadata.modified().map_err(CliError::Io)
    }

    /// Check if a file is newer than another
    pub fn is_newer(file1: &Path, file2: &Path) -> Result<bool> {
        let time1 = Self::modification_time(file1)?;
        let time2 = Self::modification_time(file2)?;

        Ok(time1 > time2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_strategy_files_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("sure_bets.py"), "").unwrap();
        fs::write(root.join("market_maker.py"), "").unwrap();
        fs::write(root.join("__init__.py"), "").unwrap();
        fs::write(root.join("notes.md"), "").unwrap();

        let files = FileUtils::find_strategy_files(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["market_maker.py", "sure_bets.py"]);
    }

    #[test]
    fn test_is_strategy_file() {
        assert!(FileUtils::is_strategy_file(Path::new("sure_bets.py")));
        assert!(FileUtils::is_strategy_file(Path::new(
            "strategies/market_maker.py"
        )));
        assert!(!FileUtils::is_strategy_file(Path::new("__init__.py")));
        assert!(!FileUtils::is_strategy_file(Path::new("_draft.py")));
        assert!(!FileUtils::is_strategy_file(Path::new("sure_bets.rs")));
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out/module.rs");

        FileUtils::write_atomic(&target, "pub struct A;\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "pub struct A;\n");

        let siblings: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(siblings, vec![std::ffi::OsString::from("module.rs")]);
    }

    #[test]
    fn test_write_atomic_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("module.rs");

        FileUtils::write_atomic(&target, "old").unwrap();
        FileUtils::write_atomic(&target, "new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_is_newer() {
        let temp_dir = TempDir::new().unwrap();
        let older = temp_dir.path().join("older.py");
        let newer = temp_dir.path().join("newer.rs");

        fs::write(&older, "").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::write(&newer, "").unwrap();

        assert!(FileUtils::is_newer(&newer, &older).unwrap());
        assert!(!FileUtils::is_newer(&older, &newer).unwrap());
    }
}
