use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::fsops::{dir_is_effectively_empty, move_file};
use crate::model::{UndoAction, UndoOutcome};

/// Replays a recorded action log in strict reverse order, restoring moved
/// files, deleting copies, and recreating deleted folders. Item failures are
/// logged and counted; the replay always runs to completion.
pub fn undo_actions(actions: &[UndoAction], target_dir: &Path) -> UndoOutcome {
    info!("starting undo of {} action(s)", actions.len());

    let mut log = Vec::new();
    let mut moved_back = 0_u64;
    let mut deleted_copies = 0_u64;
    let mut restored_folders = 0_u64;
    let mut errors = 0_u64;
    let mut copy_parents: BTreeSet<PathBuf> = BTreeSet::new();

    for action in actions.iter().rev() {
        match action {
            UndoAction::Move { from, to } => match restore_move(from, to) {
                Ok(()) => {
                    let shown = to.file_name().map(|n| n.to_string_lossy().to_string());
                    log.push(format!(
                        "Moved back '{}'",
                        shown.unwrap_or_else(|| to.display().to_string())
                    ));
                    moved_back += 1;
                }
                Err(err) => {
                    log.push(format!(
                        "[ERROR] Failed to move '{}' back: {}",
                        from.display(),
                        err
                    ));
                    error!("undo move failed for {}: {}", from.display(), err);
                    errors += 1;
                }
            },
            UndoAction::CopiedFile { path } => {
                if let Some(parent) = path.parent() {
                    copy_parents.insert(parent.to_path_buf());
                }
                match fs::remove_file(path) {
                    Ok(()) => {
                        let shown = path.file_name().map(|n| n.to_string_lossy().to_string());
                        log.push(format!(
                            "Deleted copied file '{}'",
                            shown.unwrap_or_else(|| path.display().to_string())
                        ));
                        deleted_copies += 1;
                    }
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        warn!("copied file already gone: {}", path.display());
                    }
                    Err(err) => {
                        log.push(format!(
                            "[ERROR] Failed to delete copied file '{}': {}",
                            path.display(),
                            err
                        ));
                        error!("undo delete failed for {}: {}", path.display(), err);
                        errors += 1;
                    }
                }
            }
            UndoAction::DeletedFolder { path } => match fs::create_dir_all(path) {
                Ok(()) => {
                    let shown = path.strip_prefix(target_dir).unwrap_or(path);
                    log.push(format!("Restored folder '{}'", shown.display()));
                    restored_folders += 1;
                }
                Err(err) => {
                    log.push(format!(
                        "[ERROR] Failed to restore folder '{}': {}",
                        path.display(),
                        err
                    ));
                    error!("undo restore failed for {}: {}", path.display(), err);
                    errors += 1;
                }
            },
            // Handled by the trailing cleanup pass; recreating nothing here.
            UndoAction::CreatedFolder { .. } => {}
        }
    }

    let created_folders: Vec<&PathBuf> = actions
        .iter()
        .filter_map(|action| match action {
            UndoAction::CreatedFolder { path } => Some(path),
            _ => None,
        })
        .collect();

    if deleted_copies > 0 || !created_folders.is_empty() {
        log.push("--- Starting cleanup of empty folders from undo ---".to_string());

        let mut candidates: Vec<PathBuf> = copy_parents.into_iter().collect();
        candidates.extend(created_folders.into_iter().cloned());
        candidates.sort();
        candidates.dedup();
        // Deepest first so nested empties unwind without a second walk.
        candidates.sort_by_key(|path| Reverse(path.as_os_str().len()));

        let mut cleaned = 0_u64;
        for folder in candidates {
            if !dir_is_effectively_empty(&folder) {
                continue;
            }
            match fs::remove_dir(&folder) {
                Ok(()) => {
                    let shown = folder.strip_prefix(target_dir).unwrap_or(&folder);
                    log.push(format!("Cleaned up empty folder: '{}'", shown.display()));
                    cleaned += 1;
                }
                Err(err) => warn!("could not remove empty folder {}: {}", folder.display(), err),
            }
        }
        if cleaned > 0 {
            log.push(format!("Removed {cleaned} empty folders."));
        }
    }

    let mut summary = format!(
        "UNDO SUMMARY: Moved back {moved_back} files, deleted {deleted_copies} copied files, and restored {restored_folders} folders."
    );
    if errors > 0 {
        summary.push_str(&format!(" Encountered {errors} error(s)."));
    }
    let header = format!("{0} UNDO SUMMARY {0}", "=".repeat(25));
    let ruler = "=".repeat(header.len());
    log.insert(0, summary.clone());
    log.insert(0, header);
    log.push(ruler);
    info!("{summary}");

    UndoOutcome {
        log,
        moved_back,
        deleted_copies,
        restored_folders,
        errors,
    }
}

fn restore_move(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    move_file(from, to)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn moves_files_back_to_their_source_paths() {
        let temp = TempDir::new().expect("tempdir");
        let source = temp.path().join("src/a.txt");
        let dest = temp.path().join("dst/Documents/a.txt");
        fs::create_dir_all(dest.parent().unwrap()).expect("mkdir");
        fs::write(&dest, b"payload").expect("write");

        let actions = vec![UndoAction::Move {
            from: dest.clone(),
            to: source.clone(),
        }];
        let outcome = undo_actions(&actions, temp.path());

        assert_eq!(outcome.moved_back, 1);
        assert_eq!(outcome.errors, 0);
        assert!(source.exists());
        assert!(!dest.exists());
    }

    #[test]
    fn deletes_copies_and_unwinds_created_folders() {
        let target = TempDir::new().expect("tempdir");
        let folder = target.path().join("Documents");
        let copy = folder.join("a.txt");
        fs::create_dir_all(&folder).expect("mkdir");
        fs::write(&copy, b"copy").expect("write");

        let actions = vec![
            UndoAction::CopiedFile { path: copy.clone() },
            UndoAction::CreatedFolder {
                path: folder.clone(),
            },
        ];
        let outcome = undo_actions(&actions, target.path());

        assert_eq!(outcome.deleted_copies, 1);
        assert!(!copy.exists());
        assert!(!folder.exists());
        assert!(target.path().exists());
    }

    #[test]
    fn missing_copy_is_a_warning_not_an_error() {
        let target = TempDir::new().expect("tempdir");
        let actions = vec![UndoAction::CopiedFile {
            path: target.path().join("Documents/gone.txt"),
        }];
        let outcome = undo_actions(&actions, target.path());

        assert_eq!(outcome.deleted_copies, 0);
        assert_eq!(outcome.errors, 0);
    }

    #[test]
    fn restores_deleted_folders_empty() {
        let temp = TempDir::new().expect("tempdir");
        let folder = temp.path().join("was-removed");

        let actions = vec![UndoAction::DeletedFolder {
            path: folder.clone(),
        }];
        let outcome = undo_actions(&actions, temp.path());

        assert_eq!(outcome.restored_folders, 1);
        assert!(folder.is_dir());
        assert!(fs::read_dir(&folder).expect("read").next().is_none());
    }

    #[test]
    fn created_folder_with_remaining_content_survives_cleanup() {
        let target = TempDir::new().expect("tempdir");
        let folder = target.path().join("Documents");
        fs::create_dir_all(&folder).expect("mkdir");
        fs::write(folder.join("keep.txt"), b"still here").expect("write");

        let actions = vec![UndoAction::CreatedFolder {
            path: folder.clone(),
        }];
        let outcome = undo_actions(&actions, target.path());

        assert_eq!(outcome.errors, 0);
        assert!(folder.exists());
    }

    #[test]
    fn nested_created_folders_unwind_deepest_first() {
        let target = TempDir::new().expect("tempdir");
        let outer = target.path().join("Images");
        let inner = outer.join("JPG Files");
        fs::create_dir_all(&inner).expect("mkdir");

        let actions = vec![
            UndoAction::CreatedFolder {
                path: outer.clone(),
            },
            UndoAction::CreatedFolder {
                path: inner.clone(),
            },
        ];
        undo_actions(&actions, target.path());

        assert!(!inner.exists());
        assert!(!outer.exists());
    }
}
