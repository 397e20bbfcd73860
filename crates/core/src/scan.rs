use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::info;
use walkdir::WalkDir;

use crate::fsops::is_ignored_name;
use crate::metadata::MetadataProvider;
use crate::model::{DuplicateState, FileRecord};

/// How far below the root the walk may descend. `Levels(0)` lists only the
/// root directory's immediate files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDepth {
    Unlimited,
    Levels(usize),
}

impl ScanDepth {
    /// Maps the conventional `-1 = unlimited` flag value.
    pub fn from_flag(value: i64) -> Self {
        if value < 0 {
            Self::Unlimited
        } else {
            Self::Levels(value as usize)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub depth: ScanDepth,
    pub excludes: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            depth: ScanDepth::Levels(0),
            excludes: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanOutput {
    pub files: Vec<FileRecord>,
    pub warnings: Vec<String>,
}

/// Walks the root to the bounded depth and produces enriched file records.
/// Per-entry access failures are logged into the warnings and skipped; only
/// an invalid root aborts the scan.
pub fn scan_directory(
    options: &ScanOptions,
    provider: &dyn MetadataProvider,
) -> Result<ScanOutput> {
    if !options.root.is_dir() {
        return Err(anyhow!(
            "scan root is not a directory: {}",
            options.root.display()
        ));
    }

    let mut output = ScanOutput::default();
    let excludes = ExcludeSet::new(&options.excludes, &mut output.warnings);

    let mut walker = WalkDir::new(&options.root).follow_links(false);
    if let ScanDepth::Levels(levels) = options.depth {
        // Files directly under the root sit at walkdir depth 1.
        walker = walker.max_depth(levels + 1);
    }
    let iter = walker
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !excludes.is_excluded(entry.path()));

    for item in iter {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                output.warnings.push(format!(
                    "walk error under {}: {}",
                    options.root.display(),
                    err
                ));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if is_ignored_name(entry.file_name()) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                output.warnings.push(format!(
                    "metadata read failed for {}: {}",
                    entry.path().display(),
                    err
                ));
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        let extension = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();
        let last_modified = metadata
            .modified()
            .map(timestamp_seconds)
            .unwrap_or_default();
        let date_created = metadata
            .created()
            .map(timestamp_seconds)
            .unwrap_or(last_modified);

        output.files.push(FileRecord {
            name,
            path: entry.path().to_path_buf(),
            size: metadata.len(),
            last_modified,
            date_created,
            duplicate: DuplicateState::Unknown,
            metadata: provider.metadata(entry.path(), &extension),
        });
    }

    info!(
        "scan of {} complete: {} file(s), {} warning(s)",
        options.root.display(),
        output.files.len(),
        output.warnings.len()
    );
    Ok(output)
}

fn timestamp_seconds(time: SystemTime) -> i64 {
    DateTime::<Utc>::from(time).timestamp()
}

struct ExcludeSet {
    globset: Option<GlobSet>,
}

impl ExcludeSet {
    fn new(patterns: &[String], warnings: &mut Vec<String>) -> Self {
        if patterns.is_empty() {
            return Self { globset: None };
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            match Glob::new(pattern.trim()) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => warnings.push(format!("invalid exclude glob '{pattern}': {err}")),
            }
        }

        let globset = match builder.build() {
            Ok(set) => Some(set),
            Err(err) => {
                warnings.push(format!("failed to compile exclude globs: {err}"));
                None
            }
        };
        Self { globset }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.globset
            .as_ref()
            .is_some_and(|globset| globset.is_match(path))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::metadata::NullMetadataProvider;

    fn scan(root: &Path, depth: i64) -> ScanOutput {
        let options = ScanOptions {
            root: root.to_path_buf(),
            depth: ScanDepth::from_flag(depth),
            excludes: Vec::new(),
        };
        scan_directory(&options, &NullMetadataProvider).expect("scan")
    }

    fn names(output: &ScanOutput) -> Vec<String> {
        let mut names: Vec<String> = output.files.iter().map(|f| f.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn depth_zero_sees_only_top_level_files() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("top.txt"), b"x").expect("write");
        fs::create_dir(temp.path().join("sub")).expect("mkdir");
        fs::write(temp.path().join("sub/nested.txt"), b"x").expect("write");

        let output = scan(temp.path(), 0);
        assert_eq!(names(&output), vec!["top.txt"]);
    }

    #[test]
    fn depth_zero_with_only_subdirectories_is_empty() {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir(temp.path().join("sub")).expect("mkdir");
        fs::write(temp.path().join("sub/nested.txt"), b"x").expect("write");

        let output = scan(temp.path(), 0);
        assert!(output.files.is_empty());
    }

    #[test]
    fn unlimited_depth_reaches_every_level() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"x").expect("write");
        fs::create_dir_all(temp.path().join("one/two")).expect("mkdir");
        fs::write(temp.path().join("one/b.txt"), b"x").expect("write");
        fs::write(temp.path().join("one/two/c.txt"), b"x").expect("write");

        let output = scan(temp.path(), -1);
        assert_eq!(names(&output), vec!["a.txt", "b.txt", "c.txt"]);

        let bounded = scan(temp.path(), 1);
        assert_eq!(names(&bounded), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn system_noise_files_are_skipped() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join(".DS_Store"), b"x").expect("write");
        fs::write(temp.path().join("Thumbs.db"), b"x").expect("write");
        fs::write(temp.path().join("real.txt"), b"x").expect("write");

        let output = scan(temp.path(), 0);
        assert_eq!(names(&output), vec!["real.txt"]);
    }

    #[test]
    fn exclude_globs_prune_subtrees() {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir(temp.path().join("node_modules")).expect("mkdir");
        fs::write(temp.path().join("node_modules/pkg.js"), b"x").expect("write");
        fs::write(temp.path().join("keep.js"), b"x").expect("write");

        let options = ScanOptions {
            root: temp.path().to_path_buf(),
            depth: ScanDepth::Unlimited,
            excludes: vec!["**/node_modules".to_string()],
        };
        let output = scan_directory(&options, &NullMetadataProvider).expect("scan");
        assert_eq!(names(&output), vec!["keep.js"]);
    }

    #[test]
    fn invalid_root_is_an_error() {
        let options = ScanOptions {
            root: PathBuf::from("/no/such/root"),
            ..ScanOptions::default()
        };
        assert!(scan_directory(&options, &NullMetadataProvider).is_err());
    }
}
