use std::path::PathBuf;

use thiserror::Error;

/// The only error that escapes a batch operation. Everything else is
/// recovered per item and reported through the returned log and counters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target directory is not valid: {}", path.display())]
    InvalidTargetDirectory { path: PathBuf },
}
