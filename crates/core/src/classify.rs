use std::path::Path;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::model::{DuplicateState, FileRecord, NamingOptions};

/// Fixed extension table, checked in order; `.sh` belongs to the executables
/// group because it is listed there first.
const TYPE_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Images",
        &[
            "jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "svg", "ico", "heif", "heic",
            "avif", "cr2", "nef", "arw", "dng",
        ],
    ),
    (
        "Videos",
        &[
            "mp4", "mkv", "webm", "mov", "avi", "flv", "3gp", "wmv", "mpeg", "mpg",
        ],
    ),
    (
        "Audio",
        &["mp3", "wav", "ogg", "flac", "aac", "wma", "aiff", "mid", "midi"],
    ),
    (
        "Documents",
        &["pdf", "doc", "docx", "odt", "txt", "rtf", "md"],
    ),
    ("Spreadsheets", &["xls", "xlsx", "ods", "csv"]),
    ("Presentations", &["ppt", "pptx", "odp"]),
    ("Archives", &["zip", "rar", "7z", "gz", "tar", "bz2"]),
    (
        "Executables & Installers",
        &["exe", "dll", "sh", "dmg", "jar", "msi", "bat"],
    ),
    (
        "Code & Scripts",
        &[
            "py", "js", "ts", "jsx", "tsx", "php", "rb", "html", "css", "json", "xml", "java",
            "c", "cpp", "h", "sql",
        ],
    ),
];

pub fn category_for_extension(extension: &str) -> &'static str {
    let lowered = extension.to_lowercase();
    TYPE_CATEGORIES
        .iter()
        .find(|(_, extensions)| extensions.contains(&lowered.as_str()))
        .map(|(category, _)| *category)
        .unwrap_or("Other Files")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum DateFormat {
    Year,
    YearMonth,
    YearMonthDay,
    MonthDay,
    Day,
    Unrecognized(String),
}

impl DateFormat {
    fn token(&self) -> &str {
        match self {
            Self::Year => "yyyy",
            Self::YearMonth => "yyyy-mm",
            Self::YearMonthDay => "yyyy-mm-dd",
            Self::MonthDay => "mm-dd",
            Self::Day => "dd",
            Self::Unrecognized(raw) => raw,
        }
    }

    fn render(&self, date: DateTime<Local>) -> String {
        let pattern = match self {
            Self::Year => "%Y",
            Self::YearMonth => "%Y-%m",
            Self::YearMonthDay => "%Y-%m-%d",
            Self::MonthDay => "%m-%d",
            Self::Day => "%d",
            Self::Unrecognized(_) => return String::new(),
        };
        date.format(pattern).to_string()
    }
}

impl From<String> for DateFormat {
    fn from(value: String) -> Self {
        match value.as_str() {
            "yyyy" => Self::Year,
            "yyyy-mm" => Self::YearMonth,
            "yyyy-mm-dd" => Self::YearMonthDay,
            "mm-dd" => Self::MonthDay,
            "dd" => Self::Day,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<DateFormat> for String {
    fn from(value: DateFormat) -> Self {
        value.token().to_string()
    }
}

/// A named rule for deriving a folder name from a file's attributes or
/// metadata. Unrecognized names are kept verbatim and classify to the fixed
/// fallback label rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum Criterion {
    Type,
    Extension,
    DateModified(DateFormat),
    DateCreated(DateFormat),
    Alphabet,
    Size,
    Duplicates,
    FilesPerFolder,
    FirstNChars,
    MusicArtist,
    MusicAlbum,
    MusicYear,
    MusicYearAlbum,
    VideoYear,
    PhotoCameraMakeModel,
    PhotoYearMonth,
    Unrecognized(String),
}

impl From<String> for Criterion {
    fn from(value: String) -> Self {
        if let Some(fmt) = value.strip_prefix("date_modified_") {
            return Self::DateModified(DateFormat::from(fmt.to_string()));
        }
        if let Some(fmt) = value.strip_prefix("date_created_") {
            return Self::DateCreated(DateFormat::from(fmt.to_string()));
        }
        match value.as_str() {
            "type" => Self::Type,
            "extension" => Self::Extension,
            "alphabet" => Self::Alphabet,
            "size" => Self::Size,
            "duplicates" => Self::Duplicates,
            "files_per_folder" => Self::FilesPerFolder,
            "first_n_chars" => Self::FirstNChars,
            "music_artist" => Self::MusicArtist,
            "music_album" => Self::MusicAlbum,
            "music_year" => Self::MusicYear,
            "music_year_album" => Self::MusicYearAlbum,
            "video_year" => Self::VideoYear,
            "photo_camera_make_model" => Self::PhotoCameraMakeModel,
            "photo_year_month" => Self::PhotoYearMonth,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<Criterion> for String {
    fn from(value: Criterion) -> Self {
        match value {
            Criterion::Type => "type".to_string(),
            Criterion::Extension => "extension".to_string(),
            Criterion::DateModified(fmt) => format!("date_modified_{}", fmt.token()),
            Criterion::DateCreated(fmt) => format!("date_created_{}", fmt.token()),
            Criterion::Alphabet => "alphabet".to_string(),
            Criterion::Size => "size".to_string(),
            Criterion::Duplicates => "duplicates".to_string(),
            Criterion::FilesPerFolder => "files_per_folder".to_string(),
            Criterion::FirstNChars => "first_n_chars".to_string(),
            Criterion::MusicArtist => "music_artist".to_string(),
            Criterion::MusicAlbum => "music_album".to_string(),
            Criterion::MusicYear => "music_year".to_string(),
            Criterion::MusicYearAlbum => "music_year_album".to_string(),
            Criterion::VideoYear => "video_year".to_string(),
            Criterion::PhotoCameraMakeModel => "photo_camera_make_model".to_string(),
            Criterion::PhotoYearMonth => "photo_year_month".to_string(),
            Criterion::Unrecognized(raw) => raw,
        }
    }
}

/// Derives the folder name for one file under one criterion. Pure; `index`
/// is the file's position in the name-sorted input and only meaningful for
/// the primary criterion (`None` for secondary criteria and preview roots).
pub fn folder_name_for(
    record: &FileRecord,
    criterion: &Criterion,
    options: &NamingOptions,
    index: Option<usize>,
) -> String {
    match criterion {
        Criterion::Type => {
            let extension = Path::new(&record.name)
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("");
            category_for_extension(extension).to_string()
        }
        Criterion::Extension => match Path::new(&record.name)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) if !ext.is_empty() => format!("{} Files", ext.to_uppercase()),
            _ => "No Extension".to_string(),
        },
        Criterion::DateModified(fmt) => render_timestamp(record.last_modified, fmt),
        Criterion::DateCreated(fmt) => render_timestamp(record.date_created, fmt),
        Criterion::Alphabet => match record.name.chars().next() {
            Some(first) if first.is_alphabetic() => first.to_uppercase().to_string(),
            _ => "#".to_string(),
        },
        Criterion::Size => {
            let kb = record.size / 1024;
            if kb < 100 {
                "Tiny (0 KB - 100 KB)".to_string()
            } else if kb < 1024 {
                "Small (100KB - 1MB)".to_string()
            } else if kb < 102_400 {
                "Medium (1MB - 100MB)".to_string()
            } else {
                "Large (100MB plus)".to_string()
            }
        }
        Criterion::Duplicates => match record.duplicate {
            DuplicateState::Unknown => "Duplicates (Not Scanned)".to_string(),
            DuplicateState::Duplicate => "Duplicate Files".to_string(),
            DuplicateState::Unique => "Unique Files".to_string(),
        },
        Criterion::FilesPerFolder => match index {
            None => "Files_per_Folder".to_string(),
            Some(index) => {
                let batch = options.files_per_folder.max(1);
                let start = (index / batch) * batch + 1;
                let end = start + batch - 1;
                format!("{start:04}-{end:04}")
            }
        },
        Criterion::FirstNChars => {
            let stem = Path::new(&record.name)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("");
            if stem.is_empty() {
                "---".to_string()
            } else {
                stem.chars().take(options.first_n_chars).collect()
            }
        }
        Criterion::MusicArtist => tag_or(record, "artist", "Unknown Artist"),
        Criterion::MusicAlbum => tag_or(record, "album", "Unknown Album"),
        Criterion::MusicYear | Criterion::VideoYear => tag_or(record, "year", "Unknown Year"),
        Criterion::MusicYearAlbum => format!(
            "{} - {}",
            tag_or(record, "year", "Unknown Year"),
            tag_or(record, "album", "Unknown Album")
        ),
        Criterion::PhotoCameraMakeModel => tag_or(record, "camera", "Unknown Camera"),
        Criterion::PhotoYearMonth => tag_or(record, "year_month", "Unknown Date"),
        Criterion::Unrecognized(_) => "Uncategorized".to_string(),
    }
}

fn tag_or(record: &FileRecord, key: &str, fallback: &str) -> String {
    record
        .metadata
        .get(key)
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

fn render_timestamp(seconds: i64, fmt: &DateFormat) -> String {
    Local
        .timestamp_opt(seconds, 0)
        .single()
        .map(|date| fmt.render(date))
        .unwrap_or_default()
}
