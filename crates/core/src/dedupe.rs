use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::model::{DuplicateState, FileRecord};

/// Marks every record's duplicate state in place and returns the number of
/// duplicates found.
///
/// Files are bucketed by size first; content hashing only happens inside
/// buckets with at least two members. Within an equal-content group the
/// first file in input order stays `Unique` and the rest become `Duplicate`.
/// A file whose hash fails is left `Unique` and excluded from grouping.
pub fn identify_duplicates(files: &mut [FileRecord], warnings: &mut Vec<String>) -> u64 {
    let mut by_size: HashMap<u64, Vec<usize>> = HashMap::new();
    for (slot, file) in files.iter().enumerate() {
        by_size.entry(file.size).or_default().push(slot);
    }

    for file in files.iter_mut() {
        file.duplicate = DuplicateState::Unique;
    }

    let mut duplicates = 0_u64;
    for bucket in by_size.into_values() {
        if bucket.len() < 2 {
            continue;
        }

        // Vec values keep the original relative order inside each hash group.
        let mut by_hash: HashMap<blake3::Hash, Vec<usize>> = HashMap::new();
        for slot in bucket {
            match hash_file(&files[slot].path) {
                Ok(hash) => by_hash.entry(hash).or_default().push(slot),
                Err(err) => warnings.push(format!(
                    "hash skipped for {}: {}",
                    files[slot].path.display(),
                    err
                )),
            }
        }

        for group in by_hash.into_values() {
            for &slot in group.iter().skip(1) {
                files[slot].duplicate = DuplicateState::Duplicate;
                duplicates += 1;
            }
        }
    }

    info!("duplicate identification complete: {duplicates} duplicate(s)");
    duplicates
}

fn hash_file(path: &Path) -> Result<blake3::Hash> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0_u8; 64 * 1024];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}
