use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Optional media-tag readers resolved once at process start. An absent
/// capability behaves exactly like a provider that always returns an empty
/// mapping for that media kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MediaCapabilities {
    pub audio_tags: bool,
    pub video_tags: bool,
    pub photo_exif: bool,
}

impl MediaCapabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "audio_tags={} video_tags={} photo_exif={}",
            self.audio_tags, self.video_tags, self.photo_exif
        )
    }
}

/// Best-effort tag extraction for one file. Implementations never fail the
/// caller: a read problem degrades to an empty mapping (logged internally).
///
/// Keys consumed by the classifier: `artist`, `album`, `year`, `camera`,
/// `year_month`. Absent keys mean "not available", never an error.
pub trait MetadataProvider {
    fn metadata(&self, path: &Path, extension: &str) -> BTreeMap<String, String>;

    fn capabilities(&self) -> MediaCapabilities {
        MediaCapabilities::none()
    }
}

/// Provider used when no tag readers are available in this build.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMetadataProvider;

impl MetadataProvider for NullMetadataProvider {
    fn metadata(&self, _path: &Path, _extension: &str) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}
