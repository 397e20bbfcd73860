use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One scanned file, enriched with whatever metadata the provider could read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    /// Seconds since epoch.
    pub last_modified: i64,
    pub date_created: i64,
    #[serde(default)]
    pub duplicate: DuplicateState,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Tri-state duplicate flag; `Unknown` until duplicate detection has run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateState {
    #[default]
    Unknown,
    Duplicate,
    Unique,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Move,
    Copy,
}

/// Folder/filename decoration knobs.
///
/// The two incremental flags drive both folder numbering and the per-folder
/// filename numbering; counters are 4-digit zero-padded and scoped per
/// `build_plan` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamingOptions {
    #[serde(default)]
    pub folder_prefix: String,
    #[serde(default)]
    pub folder_suffix: String,
    #[serde(default)]
    pub filename_prefix: String,
    #[serde(default)]
    pub filename_suffix: String,
    #[serde(default)]
    pub incremental_prefix: bool,
    #[serde(default)]
    pub incremental_suffix: bool,
    #[serde(default = "default_files_per_folder")]
    pub files_per_folder: usize,
    #[serde(default = "default_first_n_chars")]
    pub first_n_chars: usize,
}

fn default_files_per_folder() -> usize {
    100
}

fn default_first_n_chars() -> usize {
    3
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            folder_prefix: String::new(),
            folder_suffix: String::new(),
            filename_prefix: String::new(),
            filename_suffix: String::new(),
            incremental_prefix: false,
            incremental_suffix: false,
            files_per_folder: default_files_per_folder(),
            first_n_chars: default_first_n_chars(),
        }
    }
}

/// Complete user intent for one organize run. Immutable input to the plan
/// builder and the executor; the file list is the caller's scan output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationConfig {
    pub source_directory: PathBuf,
    pub target_directory: PathBuf,
    pub operation: OperationKind,
    pub primary: crate::classify::Criterion,
    #[serde(default)]
    pub secondary: Option<crate::classify::Criterion>,
    #[serde(default)]
    pub options: NamingOptions,
    #[serde(default)]
    pub delete_empty_folders: bool,
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub destination: String,
    pub record: FileRecord,
}

/// Insertion-ordered mapping from destination relative path to source record.
///
/// Re-inserting an existing key overwrites the record in place and keeps the
/// original position. Two sources computing the same destination therefore
/// collapse to one plan entry; execution still places both because it checks
/// the live filesystem per file, not the plan keys.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    entries: Vec<PlanEntry>,
    by_destination: HashMap<String, usize>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, destination: String, record: FileRecord) {
        match self.by_destination.get(&destination) {
            Some(&slot) => self.entries[slot].record = record,
            None => {
                self.by_destination
                    .insert(destination.clone(), self.entries.len());
                self.entries.push(PlanEntry {
                    destination,
                    record,
                });
            }
        }
    }

    pub fn get(&self, destination: &str) -> Option<&FileRecord> {
        self.by_destination
            .get(destination)
            .map(|&slot| &self.entries[slot].record)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One reversible step recorded during execution, consumed in reverse order
/// by the undo engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UndoAction {
    Move { from: PathBuf, to: PathBuf },
    CopiedFile { path: PathBuf },
    DeletedFolder { path: PathBuf },
    CreatedFolder { path: PathBuf },
}

/// Preview-only projection of the plan; never touches disk. Leaf directories
/// carry a sorted filename list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FolderNode {
    Files(Vec<String>),
    Dir(BTreeMap<String, FolderNode>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionOutcome {
    pub run_id: String,
    pub log: Vec<String>,
    pub undo_log: Vec<UndoAction>,
    pub processed: u64,
    pub errors: u64,
    pub cleaned_folders: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UndoOutcome {
    pub log: Vec<String>,
    pub moved_back: u64,
    pub deleted_copies: u64,
    pub restored_folders: u64,
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            path: PathBuf::from(format!("/src/{name}")),
            size: 1,
            last_modified: 0,
            date_created: 0,
            duplicate: DuplicateState::Unknown,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn plan_insert_overwrites_in_place() {
        let mut plan = Plan::new();
        plan.insert("Images/a.jpg".to_string(), record("a.jpg"));
        plan.insert("Audio/b.mp3".to_string(), record("b.mp3"));
        plan.insert("Images/a.jpg".to_string(), record("other-a.jpg"));

        assert_eq!(plan.len(), 2);
        let destinations: Vec<_> = plan.iter().map(|e| e.destination.as_str()).collect();
        assert_eq!(destinations, vec!["Images/a.jpg", "Audio/b.mp3"]);
        assert_eq!(plan.get("Images/a.jpg").unwrap().name, "other-a.jpg");
    }

    #[test]
    fn undo_action_json_shape_is_tagged() {
        let action = UndoAction::Move {
            from: PathBuf::from("/t/a"),
            to: PathBuf::from("/s/a"),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "move");
        assert_eq!(json["from"], "/t/a");

        let copied: UndoAction =
            serde_json::from_str(r#"{"action":"copied_file","path":"/t/b"}"#).unwrap();
        assert_eq!(
            copied,
            UndoAction::CopiedFile {
                path: PathBuf::from("/t/b")
            }
        );
    }
}
