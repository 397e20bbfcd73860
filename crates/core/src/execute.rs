use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::ConfigError;
use crate::fsops::{dir_is_effectively_empty, move_file};
use crate::model::{ExecutionOutcome, OperationKind, OrganizationConfig, UndoAction};
use crate::plan::build_plan;

/// Executes the plan for this config: moves or copies every planned file,
/// resolves on-disk name collisions, and records the reversible action log.
///
/// The target-directory precondition is the only failure that aborts; every
/// per-file problem is logged, counted, and skipped. Files are processed
/// independently, so a partial run leaves completed files in place.
pub fn execute_plan(config: &OrganizationConfig) -> Result<ExecutionOutcome, ConfigError> {
    if !config.target_directory.is_dir() {
        return Err(ConfigError::InvalidTargetDirectory {
            path: config.target_directory.clone(),
        });
    }

    let run_id = Uuid::new_v4().to_string();
    info!(
        "executing organization {run_id}: {} -> {}",
        config.source_directory.display(),
        config.target_directory.display()
    );

    let plan = build_plan(config);
    let mut log = Vec::new();
    let mut undo_log = Vec::new();

    if plan.is_empty() {
        log.push("No files to organize. Aborting.".to_string());
        warn!("organization {run_id} had no files to process");
        return Ok(ExecutionOutcome {
            run_id,
            log,
            undo_log,
            processed: 0,
            errors: 0,
            cleaned_folders: 0,
        });
    }

    let verb = match config.operation {
        OperationKind::Move => "Moving",
        OperationKind::Copy => "Copying",
    };
    let mut processed = 0_u64;
    let mut errors = 0_u64;
    let mut created_folders: BTreeSet<PathBuf> = BTreeSet::new();

    log.push(format!(
        "--- Starting organization of {} files ---",
        plan.len()
    ));

    for entry in plan.iter() {
        let source = &entry.record.path;
        if !source.exists() {
            log.push(format!(
                "Skipping '{}' (file no longer at source)",
                entry.record.name
            ));
            errors += 1;
            continue;
        }

        let planned_path = config.target_directory.join(&entry.destination);
        if let Some(parent) = planned_path.parent() {
            if !parent.exists() {
                created_folders.insert(parent.to_path_buf());
            }
            if let Err(err) = fs::create_dir_all(parent) {
                log.push(format!(
                    "[ERROR] Failed to process '{}': {}",
                    entry.record.name, err
                ));
                error!("could not create {}: {}", parent.display(), err);
                errors += 1;
                continue;
            }
        }

        // Collision handling happens against the live filesystem, per file.
        let dest_path = next_available_path(planned_path);
        let result = match config.operation {
            OperationKind::Move => move_file(source, &dest_path),
            OperationKind::Copy => fs::copy(source, &dest_path).map(|_| ()),
        };

        match result {
            Ok(()) => {
                match config.operation {
                    OperationKind::Move => undo_log.push(UndoAction::Move {
                        from: dest_path.clone(),
                        to: source.clone(),
                    }),
                    OperationKind::Copy => undo_log.push(UndoAction::CopiedFile {
                        path: dest_path.clone(),
                    }),
                }
                let shown = dest_path
                    .strip_prefix(&config.target_directory)
                    .unwrap_or(&dest_path);
                log.push(format!(
                    "{verb} '{}' to '{}'",
                    entry.record.name,
                    shown.display()
                ));
                processed += 1;
            }
            Err(err) => {
                log.push(format!(
                    "[ERROR] Failed to process '{}': {}",
                    entry.record.name, err
                ));
                error!("failed to process '{}': {}", entry.record.name, err);
                errors += 1;
            }
        }
    }

    let past = match config.operation {
        OperationKind::Move => "Moved",
        OperationKind::Copy => "Copied",
    };
    let mut summary = format!("{past} {processed} of {} files successfully.", plan.len());
    if errors > 0 {
        summary.push_str(&format!(" Encountered {errors} error(s)."));
    }
    let header = format!("{0} ORGANIZATION SUMMARY {0}", "=".repeat(20));
    let ruler = "=".repeat(header.len());
    log.insert(0, summary.clone());
    log.insert(0, header);
    log.push(ruler.clone());
    info!("{summary}");

    let mut cleaned_folders = 0_u64;
    if config.delete_empty_folders && config.operation == OperationKind::Move {
        cleaned_folders =
            cleanup_empty_source_folders(&config.source_directory, &mut log, &mut undo_log);
        let cleanup_summary =
            format!("CLEANUP SUMMARY: Removed {cleaned_folders} empty source folder(s).");
        log.push(String::new());
        log.push(format!("{0} CLEANUP REPORT {0}", "=".repeat(22)));
        log.push(cleanup_summary.clone());
        log.push(ruler);
        info!("{cleanup_summary}");
    }

    // Emitted after cleanup actions so undo replays cleanup reversal first.
    for folder in created_folders {
        undo_log.push(UndoAction::CreatedFolder { path: folder });
    }

    info!("organization {run_id} finished");
    Ok(ExecutionOutcome {
        run_id,
        log,
        undo_log,
        processed,
        errors,
        cleaned_folders,
    })
}

/// Inserts `_1`, `_2`, … before the extension until the name is free on
/// disk. The counter restarts for every conflicting destination.
fn next_available_path(planned: PathBuf) -> PathBuf {
    if !planned.exists() {
        return planned;
    }

    let stem = planned
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = planned
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let parent = planned.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = parent.join(format!("{stem}_{counter}{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Bottom-up removal of every effectively empty directory under the source
/// root, sparing the root itself. Each deletion is recorded for undo.
fn cleanup_empty_source_folders(
    root: &Path,
    log: &mut Vec<String>,
    undo_log: &mut Vec<UndoAction>,
) -> u64 {
    log.push("--- Starting comprehensive cleanup of empty folders ---".to_string());
    let mut deleted = 0_u64;

    for item in WalkDir::new(root).contents_first(true) {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                log.push(format!("[ERROR] Cleanup walk error: {err}"));
                continue;
            }
        };
        if !entry.file_type().is_dir() || entry.path() == root {
            continue;
        }
        if !dir_is_effectively_empty(entry.path()) {
            continue;
        }

        let shown = entry.path().strip_prefix(root).unwrap_or(entry.path());
        match fs::remove_dir(entry.path()) {
            Ok(()) => {
                log.push(format!("Cleaning up empty folder: '{}'", shown.display()));
                undo_log.push(UndoAction::DeletedFolder {
                    path: entry.path().to_path_buf(),
                });
                deleted += 1;
            }
            Err(err) => {
                log.push(format!(
                    "[ERROR] Could not remove '{}': {}",
                    shown.display(),
                    err
                ));
                error!("could not remove {}: {}", entry.path().display(), err);
            }
        }
    }

    deleted
}
