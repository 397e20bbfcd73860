use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;

/// OS noise that never counts as content: skipped by the scanner and ignored
/// by the emptiness test used for cleanup.
pub const IGNORED_SYSTEM_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

pub fn is_ignored_name(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|name| IGNORED_SYSTEM_FILES.contains(&name))
}

/// True when the directory holds nothing but ignored system files. An
/// unreadable directory reports as non-empty so cleanup leaves it alone.
pub fn dir_is_effectively_empty(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(entries) => {
            for entry in entries.flatten() {
                if !is_ignored_name(&entry.file_name()) {
                    return false;
                }
            }
            true
        }
        Err(_) => false,
    }
}

/// Rename with a copy + remove fallback so moves work across filesystems.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn noise_only_directory_counts_as_empty() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("nested");
        fs::create_dir(&dir).expect("create dir");
        assert!(dir_is_effectively_empty(&dir));

        fs::write(dir.join(".DS_Store"), b"").expect("write noise");
        assert!(dir_is_effectively_empty(&dir));

        fs::write(dir.join("real.txt"), b"content").expect("write file");
        assert!(!dir_is_effectively_empty(&dir));
    }

    #[test]
    fn missing_directory_is_not_empty() {
        assert!(!dir_is_effectively_empty(Path::new("/no/such/dir")));
    }

    #[test]
    fn move_file_replaces_source_with_destination() {
        let temp = TempDir::new().expect("tempdir");
        let from = temp.path().join("a.txt");
        let to = temp.path().join("b.txt");
        fs::write(&from, b"payload").expect("write");

        move_file(&from, &to).expect("move");
        assert!(!from.exists());
        assert_eq!(fs::read(&to).expect("read"), b"payload");
    }
}
