//! Extension-derived file classification.
//!
//! Entirely cosmetic: the category routes previews in the UI and is
//! never used for a security decision. Computed on demand from the
//! lowercase extension, never cached.

use std::path::Path;

use serde::Serialize;

/// Classification of a file by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Text,
    Code,
    Markdown,
    Image,
    Audio,
    Video,
    Pdf,
    Other,
}

impl FileCategory {
    /// Classify a filename by its extension. Unknown or missing
    /// extensions are [`FileCategory::Other`].
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" | "log" | "csv" | "json" | "xml" | "yaml" | "yml" | "toml" | "env" | "conf" => {
                Self::Text
            }
            "py" | "js" | "ts" | "go" | "rs" | "c" | "cpp" | "java" | "sh" | "sql" | "html"
            | "css" => Self::Code,
            "md" => Self::Markdown,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "bmp" => Self::Image,
            "mp3" | "wav" | "ogg" | "flac" | "aac" | "m4a" => Self::Audio,
            "mp4" | "webm" | "mkv" | "mov" | "avi" => Self::Video,
            "pdf" => Self::Pdf,
            _ => Self::Other,
        }
    }
}
