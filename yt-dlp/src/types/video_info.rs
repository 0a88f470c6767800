use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    /// Kept as raw JSON so one odd entry cannot fail the whole document.
    #[serde(default)]
    pub formats: Vec<Value>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Format {
    pub format_id: String,
    /// Human readable label, e.g. `"18 - 640x360 (360p)"`.
    pub format: String,
    #[serde(default)]
    pub format_note: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    /// yt-dlp reports sizes as integers or floats depending on the extractor.
    #[serde(default)]
    pub filesize: Option<Number>,
    #[serde(default)]
    pub filesize_approx: Option<Number>
}

impl Format {
    pub fn from_entry(entry: &Value) -> Option<Self> {
        match serde_json::from_value(entry.clone()) {
            Ok(format) => Some(format),
            Err(e) => {
                tracing::trace!(error = %e, "skipping malformed format entry");
                None
            }
        }
    }

    pub fn is_dash(&self) -> bool {
        self.format.to_lowercase().contains("dash")
    }

    pub fn estimated_size(&self) -> Option<u64> {
        self.filesize
            .as_ref()
            .and_then(byte_count)
            .or_else(|| self.filesize_approx.as_ref().and_then(byte_count))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn byte_count(n: &Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}
