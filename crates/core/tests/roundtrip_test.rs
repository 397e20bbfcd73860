use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use sortplan_core::{
    execute_plan, scan_directory, undo_actions, Criterion, NamingOptions, NullMetadataProvider,
    OperationKind, OrganizationConfig, ScanDepth, ScanOptions,
};

fn scan_all(root: &Path) -> Vec<sortplan_core::FileRecord> {
    let options = ScanOptions {
        root: root.to_path_buf(),
        depth: ScanDepth::Unlimited,
        excludes: Vec::new(),
    };
    scan_directory(&options, &NullMetadataProvider)
        .expect("scan")
        .files
}

fn tree_snapshot(root: &Path) -> BTreeSet<PathBuf> {
    let mut paths = BTreeSet::new();
    for entry in walkdir_paths(root) {
        paths.insert(entry.strip_prefix(root).expect("under root").to_path_buf());
    }
    paths
}

fn walkdir_paths(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).expect("read_dir") {
            let path = entry.expect("entry").path();
            out.push(path.clone());
            if path.is_dir() {
                stack.push(path);
            }
        }
    }
    out
}

#[test]
fn move_then_undo_restores_the_original_tree() {
    let source = TempDir::new().expect("tempdir");
    let target = TempDir::new().expect("tempdir");
    fs::create_dir_all(source.path().join("camera/2024")).expect("mkdir");
    fs::write(source.path().join("camera/2024/photo.jpg"), b"jpg-bytes").expect("write");
    fs::write(source.path().join("camera/song.mp3"), b"mp3-bytes").expect("write");
    fs::write(source.path().join("notes.txt"), b"notes").expect("write");

    let before = tree_snapshot(source.path());

    let config = OrganizationConfig {
        source_directory: source.path().to_path_buf(),
        target_directory: target.path().to_path_buf(),
        operation: OperationKind::Move,
        primary: Criterion::Type,
        secondary: None,
        options: NamingOptions::default(),
        delete_empty_folders: true,
        files: scan_all(source.path()),
    };
    let outcome = execute_plan(&config).expect("execute");

    assert_eq!(outcome.processed, 3);
    assert_eq!(outcome.errors, 0);
    assert!(target.path().join("Images/photo.jpg").exists());
    assert!(target.path().join("Audio/song.mp3").exists());
    assert!(target.path().join("Documents/notes.txt").exists());
    // Emptied source subtree was cleaned away.
    assert!(!source.path().join("camera").exists());

    let undone = undo_actions(&outcome.undo_log, target.path());
    assert_eq!(undone.moved_back, 3);
    assert_eq!(undone.restored_folders, outcome.cleaned_folders);
    assert_eq!(undone.errors, 0);

    assert_eq!(tree_snapshot(source.path()), before);
    // Every folder the run created in the target is gone again.
    assert!(tree_snapshot(target.path()).is_empty());
}

#[test]
fn copy_then_undo_leaves_source_untouched_and_target_clean() {
    let source = TempDir::new().expect("tempdir");
    let target = TempDir::new().expect("tempdir");
    fs::write(source.path().join("a.pdf"), b"pdf").expect("write");
    fs::write(source.path().join("b.zip"), b"zip").expect("write");

    let before = tree_snapshot(source.path());

    let config = OrganizationConfig {
        source_directory: source.path().to_path_buf(),
        target_directory: target.path().to_path_buf(),
        operation: OperationKind::Copy,
        primary: Criterion::Type,
        secondary: None,
        options: NamingOptions::default(),
        delete_empty_folders: false,
        files: scan_all(source.path()),
    };
    let outcome = execute_plan(&config).expect("execute");

    assert_eq!(outcome.processed, 2);
    assert!(source.path().join("a.pdf").exists());
    assert!(target.path().join("Documents/a.pdf").exists());
    assert!(target.path().join("Archives/b.zip").exists());

    let undone = undo_actions(&outcome.undo_log, target.path());
    assert_eq!(undone.deleted_copies, 2);
    assert_eq!(undone.errors, 0);

    assert_eq!(tree_snapshot(source.path()), before);
    assert!(tree_snapshot(target.path()).is_empty());
}

#[test]
fn undo_after_partial_manual_changes_reports_errors_but_finishes() {
    let source = TempDir::new().expect("tempdir");
    let target = TempDir::new().expect("tempdir");
    fs::write(source.path().join("a.txt"), b"a").expect("write");
    fs::write(source.path().join("b.txt"), b"b").expect("write");

    let config = OrganizationConfig {
        source_directory: source.path().to_path_buf(),
        target_directory: target.path().to_path_buf(),
        operation: OperationKind::Move,
        primary: Criterion::Type,
        secondary: None,
        options: NamingOptions::default(),
        delete_empty_folders: false,
        files: scan_all(source.path()),
    };
    let outcome = execute_plan(&config).expect("execute");
    assert_eq!(outcome.processed, 2);

    // Someone deletes one organized file before the undo runs.
    fs::remove_file(target.path().join("Documents/a.txt")).expect("remove");

    let undone = undo_actions(&outcome.undo_log, target.path());
    assert_eq!(undone.moved_back, 1);
    assert_eq!(undone.errors, 1);
    assert!(source.path().join("b.txt").exists());
    assert!(undone.log.iter().any(|line| line.starts_with("[ERROR]")));
}
