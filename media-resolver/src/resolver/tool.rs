use async_trait::async_trait;
use serde_json::Value;
use yt_dlp::{DownloadOptions, YtDlp};

use super::error::ResolveResult;
use super::types::ProbedMedia;

/// The external extraction tool, as seen by [`super::MediaResolver`].
#[async_trait]
pub trait ExtractionTool: Send + Sync {
    /// First playable URL for `format`. Failure carries the tool's diagnostic.
    async fn get_stream_url(&self, url: &str, format: &str) -> ResolveResult<String>;

    /// Downloads according to `options`; the destination comes from its output template.
    async fn download_file(&self, url: &str, options: &DownloadOptions) -> ResolveResult<()>;

    async fn list_playlist(&self, url: &str, limit: u32) -> ResolveResult<Vec<String>>;

    /// Raw `formats` entries of the metadata document, unvalidated.
    async fn probe_formats(&self, url: &str) -> ResolveResult<Vec<Value>>;

    /// Id and container extension the tool would produce for `format`.
    async fn probe_media(&self, url: &str, format: &str) -> ResolveResult<ProbedMedia>;
}

#[async_trait]
impl ExtractionTool for YtDlp {
    async fn get_stream_url(&self, url: &str, format: &str) -> ResolveResult<String> {
        Ok(YtDlp::get_stream_url(self, url, format).await?)
    }

    async fn download_file(&self, url: &str, options: &DownloadOptions) -> ResolveResult<()> {
        Ok(self.download_with_options(url, options).await?)
    }

    async fn list_playlist(&self, url: &str, limit: u32) -> ResolveResult<Vec<String>> {
        Ok(self.list_playlist_ids(url, limit).await?)
    }

    async fn probe_formats(&self, url: &str) -> ResolveResult<Vec<Value>> {
        let info = self.get_video_info(url).await?;
        Ok(info.formats)
    }

    async fn probe_media(&self, url: &str, format: &str) -> ResolveResult<ProbedMedia> {
        let info = self.get_video_info_for_format(url, format).await?;
        tracing::debug!(id = %info.id, title = ?info.title, ext = ?info.ext, "probed media");
        Ok(ProbedMedia {
            id: info.id,
            ext: info.ext.unwrap_or_else(|| "webm".to_string())
        })
    }
}
