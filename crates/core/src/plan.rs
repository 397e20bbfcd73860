use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::classify::folder_name_for;
use crate::model::{FolderNode, NamingOptions, OrganizationConfig, Plan};

/// Builds the deterministic destination plan for one config.
///
/// Files are name-sorted first; that order defines the index used by
/// position-dependent criteria and the first-seen order of every incremental
/// counter. All counters live and die inside this call.
pub fn build_plan(config: &OrganizationConfig) -> Plan {
    let mut files = config.files.clone();
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let options = &config.options;
    let mut plan = Plan::new();
    // Primary folder numbers are global; secondary numbers restart per
    // primary folder; filename numbers restart per destination folder.
    let mut primary_numbers: HashMap<String, usize> = HashMap::new();
    let mut secondary_numbers: HashMap<String, HashMap<String, usize>> = HashMap::new();
    let mut file_counters: HashMap<String, usize> = HashMap::new();

    for (index, file) in files.iter().enumerate() {
        let primary_raw = folder_name_for(file, &config.primary, options, Some(index));
        // An empty secondary label (unrecognized date format) behaves as no
        // secondary at all; an empty primary label drops that path segment.
        let secondary_raw = config
            .secondary
            .as_ref()
            .map(|criterion| folder_name_for(file, criterion, options, None))
            .filter(|name| !name.is_empty());

        let destination_folder = match &secondary_raw {
            Some(secondary_raw) => {
                let decorated = decorate_folder(secondary_raw, options, || {
                    let scope = secondary_numbers.entry(primary_raw.clone()).or_default();
                    let next = scope.len() + 1;
                    *scope.entry(secondary_raw.clone()).or_insert(next)
                });
                join_segments(
                    &primary_raw,
                    &format!(
                        "{}{decorated}{}",
                        options.folder_prefix, options.folder_suffix
                    ),
                )
            }
            None => {
                let decorated = decorate_folder(&primary_raw, options, || {
                    let next = primary_numbers.len() + 1;
                    *primary_numbers.entry(primary_raw.clone()).or_insert(next)
                });
                format!(
                    "{}{decorated}{}",
                    options.folder_prefix, options.folder_suffix
                )
            }
        };

        let counter = file_counters.entry(destination_folder.clone()).or_insert(0);
        *counter += 1;
        let filename = decorate_filename(&file.name, options, *counter);

        plan.insert(join_segments(&destination_folder, &filename), file.clone());
    }

    plan
}

/// Joins two relative path segments, dropping the separator when the left
/// side is empty. Keys must stay relative so the executor's target join
/// never escapes the target directory.
fn join_segments(base: &str, leaf: &str) -> String {
    if base.is_empty() {
        leaf.to_string()
    } else {
        format!("{base}/{leaf}")
    }
}

/// Applies the incremental folder number. The suffix form wins when both
/// flags are set; the counter is only consumed when decoration is active.
fn decorate_folder(
    raw: &str,
    options: &NamingOptions,
    take_number: impl FnOnce() -> usize,
) -> String {
    if !options.incremental_prefix && !options.incremental_suffix {
        return raw.to_string();
    }
    let number = format!("{:04}", take_number());
    if options.incremental_suffix {
        format!("{raw}_{number}")
    } else {
        format!("{number}_{raw}")
    }
}

fn decorate_filename(name: &str, options: &NamingOptions, index_in_folder: usize) -> String {
    let (stem, extension) = split_name(name);

    let mut prefix = options.filename_prefix.clone();
    if options.incremental_prefix {
        prefix.push_str(&format!("{index_in_folder:04}"));
    }
    let mut suffix = options.filename_suffix.clone();
    if options.incremental_suffix {
        suffix.push_str(&format!("{index_in_folder:04}"));
    }

    let mut filename = String::new();
    if !prefix.is_empty() {
        filename.push_str(&prefix);
        filename.push('_');
    }
    filename.push_str(stem);
    if !suffix.is_empty() {
        filename.push('_');
        filename.push_str(&suffix);
    }
    filename.push_str(&extension);
    filename
}

/// Splits a filename into stem and dotted extension (`"a.tar.gz"` gives
/// `("a.tar", ".gz")`; a missing extension gives an empty string).
fn split_name(name: &str) -> (&str, String) {
    let path = Path::new(name);
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);
    (stem, extension)
}

/// Projects the plan into a nested folder tree for preview; leaf folders
/// hold sorted filename lists. Never touches disk.
pub fn preview_tree(plan: &Plan) -> FolderNode {
    let mut root: BTreeMap<String, FolderNode> = BTreeMap::new();
    for entry in plan.iter() {
        let mut parts: Vec<&str> = entry.destination.split('/').collect();
        if let Some(filename) = parts.pop() {
            insert_leaf(&mut root, &parts, filename);
        }
    }
    sort_leaves(&mut root);
    FolderNode::Dir(root)
}

fn insert_leaf(level: &mut BTreeMap<String, FolderNode>, folders: &[&str], filename: &str) {
    match folders.split_first() {
        None => {}
        Some((name, rest)) if rest.is_empty() => {
            let node = level
                .entry(name.to_string())
                .or_insert_with(|| FolderNode::Files(Vec::new()));
            if let FolderNode::Files(files) = node {
                files.push(filename.to_string());
            }
        }
        Some((name, rest)) => {
            let node = level
                .entry(name.to_string())
                .or_insert_with(|| FolderNode::Dir(BTreeMap::new()));
            if let FolderNode::Dir(children) = node {
                insert_leaf(children, rest, filename);
            }
        }
    }
}

fn sort_leaves(level: &mut BTreeMap<String, FolderNode>) {
    for node in level.values_mut() {
        match node {
            FolderNode::Files(files) => files.sort(),
            FolderNode::Dir(children) => sort_leaves(children),
        }
    }
}
