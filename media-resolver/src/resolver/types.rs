use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Display text used when the search service reports no length.
pub const LIVE_DURATION: &str = "LIVE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaMetadata {
    pub title: String,
    pub duration_text: String,
    pub duration_seconds: u64,
    pub thumbnail_url: String,
    pub id: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliderEntry {
    pub title: String,
    pub duration_text: String,
    pub thumbnail_url: String,
    pub id: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackDetails {
    pub title: String,
    pub link: String,
    pub id: String,
    pub duration_text: String,
    pub thumbnail_url: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    pub format_label: String,
    pub file_size_bytes: Option<u64>,
    pub format_id: String,
    pub extension: Option<String>,
    pub format_note: Option<String>,
    pub source_url: String
}

/// What yt-dlp reports it would write for a given format selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedMedia {
    pub id: String,
    pub ext: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum ResolvedMedia {
    StreamUrl(String),
    File(PathBuf)
}

impl ResolvedMedia {
    pub fn is_local_file(&self) -> bool {
        matches!(self, ResolvedMedia::File(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadMode {
    #[default]
    Audio,
    Video,
    SongAudio,
    SongVideo
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub mode: DownloadMode,
    /// Required by the song modes.
    #[serde(default)]
    pub format_id: Option<String>,
    /// Required by the song modes; becomes the file stem.
    #[serde(default)]
    pub title: Option<String>
}

#[cfg(test)]
impl DownloadRequest {
    pub fn new(mode: DownloadMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn song(mode: DownloadMode, format_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            mode,
            format_id: Some(format_id.into()),
            title: Some(title.into())
        }
    }
}
