//! Resolution of platform links into metadata, stream URLs and local files.

mod duration;
mod error;
mod flags;
mod link;
mod message;
mod tool;
mod types;

pub use duration::duration_to_seconds;
pub use error::{ResolveError, ResolveResult};
pub use flags::{DIRECT_STREAM_FLAG, FeatureFlags};
pub use link::MediaReference;
pub use message::Message;
pub use tool::ExtractionTool;
pub use types::{
    DownloadMode, DownloadRequest, FormatDescriptor, MediaMetadata, ResolvedMedia, SliderEntry,
    TrackDetails
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use yt_dlp::{Container, DownloadOptions, Format, OutputFormat};

use crate::search::{SearchHit, VideoSearch};
use types::LIVE_DURATION;

const VIDEO_STREAM_FORMAT: &str = "best[height<=?720][width<=?1280]";
const AUDIO_STREAM_FORMAT: &str = "bestaudio/best";
const VIDEO_DOWNLOAD_FORMAT: &str =
    "(bestvideo[height<=?720][width<=?1280][ext=mp4])+(bestaudio[ext=m4a])";
/// m4a audio track muxed under song videos.
const SONG_AUDIO_TRACK: &str = "140";
const SONG_AUDIO_QUALITY: &str = "192";
const SLIDER_RESULTS: usize = 10;
const UNKNOWN_TITLE: &str = "Unknown Title";

pub struct MediaResolver {
    tool: Arc<dyn ExtractionTool>,
    search: Arc<dyn VideoSearch>,
    flags: Arc<dyn FeatureFlags>,
    download_dir: PathBuf
}

impl MediaResolver {
    pub fn new(
        tool: Arc<dyn ExtractionTool>,
        search: Arc<dyn VideoSearch>,
        flags: Arc<dyn FeatureFlags>,
        download_dir: impl Into<PathBuf>
    ) -> Self {
        Self {
            tool,
            search,
            flags,
            download_dir: download_dir.into()
        }
    }

    pub fn exists(&self, link: &str, is_id: bool) -> bool {
        link::exists(link, is_id)
    }

    pub fn extract_url_from_message(&self, message: &Message) -> Option<String> {
        message::extract_url(message)
    }

    pub async fn fetch_details(&self, link: &str, is_id: bool) -> ResolveResult<MediaMetadata> {
        let hit = self.first_hit(link, is_id).await?;
        let duration_text = hit.duration.clone().unwrap_or_else(|| LIVE_DURATION.to_string());

        Ok(MediaMetadata {
            title: hit.title.clone().unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            duration_seconds: duration_to_seconds(&duration_text),
            duration_text,
            thumbnail_url: clean_thumbnail(&hit),
            id: hit.id
        })
    }

    pub async fn fetch_title(&self, link: &str, is_id: bool) -> Option<String> {
        self.swallowed_hit(link, is_id).await?.title
    }

    pub async fn fetch_duration(&self, link: &str, is_id: bool) -> Option<String> {
        self.swallowed_hit(link, is_id).await?.duration
    }

    pub async fn fetch_thumbnail(&self, link: &str, is_id: bool) -> Option<String> {
        let hit = self.swallowed_hit(link, is_id).await?;
        hit.thumbnail_url.as_deref().map(strip_query)
    }

    /// Track card for the first hit, plus its id.
    pub async fn fetch_track(&self, link: &str, is_id: bool) -> ResolveResult<(TrackDetails, String)> {
        let hit = self.first_hit(link, is_id).await?;

        let details = TrackDetails {
            title: hit.title.clone().unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            link: hit.link(),
            id: hit.id.clone(),
            duration_text: hit.duration.clone().unwrap_or_else(|| LIVE_DURATION.to_string()),
            thumbnail_url: clean_thumbnail(&hit)
        };

        Ok((details, hit.id))
    }

    /// Entry `index` of a ten-result search; out-of-range indexes are `NotFound`.
    pub async fn fetch_slider(&self, query: &str, index: usize, is_id: bool) -> ResolveResult<SliderEntry> {
        let query = MediaReference::new(query, is_id).normalized();
        let hits = self.search.search(&query, SLIDER_RESULTS).await?;

        let hit = hits.into_iter().nth(index).ok_or(ResolveError::NotFound)?;

        Ok(SliderEntry {
            title: hit.title.clone().unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            duration_text: hit.duration.clone().unwrap_or_else(|| LIVE_DURATION.to_string()),
            thumbnail_url: clean_thumbnail(&hit),
            id: hit.id
        })
    }

    /// Direct stream URL capped at 720p, falling back once to audio only.
    pub async fn resolve_direct_url(&self, link: &str, is_id: bool) -> ResolveResult<String> {
        let url = MediaReference::new(link, is_id).normalized();

        match self.tool.get_stream_url(&url, VIDEO_STREAM_FORMAT).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::warn!("video stream lookup failed for {}, retrying audio only: {}", url, e);
            }
        }

        self.tool.get_stream_url(&url, AUDIO_STREAM_FORMAT).await
    }

    pub async fn download_audio(&self, link: &str, is_id: bool) -> ResolveResult<PathBuf> {
        let url = MediaReference::new(link, is_id).normalized();
        self.download_by_id(&url, AUDIO_STREAM_FORMAT).await
    }

    pub async fn download_video(&self, link: &str, is_id: bool) -> ResolveResult<PathBuf> {
        let url = MediaReference::new(link, is_id).normalized();
        self.download_by_id(&url, VIDEO_DOWNLOAD_FORMAT).await
    }

    pub async fn download(
        &self,
        link: &str,
        is_id: bool,
        request: &DownloadRequest
    ) -> ResolveResult<ResolvedMedia> {
        match request.mode {
            DownloadMode::SongVideo => {
                let (format_id, title) = song_fields(request)?;
                let url = MediaReference::new(link, is_id).normalized();
                let options = base_options(&format!("{format_id}+{SONG_AUDIO_TRACK}"))
                    .container(Container::Mp4);
                let path = self.download_dir.join(format!("{title}.mp4"));
                self.download_titled(&url, &title, options, path).await.map(ResolvedMedia::File)
            }
            DownloadMode::SongAudio => {
                let (format_id, title) = song_fields(request)?;
                let url = MediaReference::new(link, is_id).normalized();
                let options = base_options(&format_id)
                    .extract_audio(true)
                    .audio_format("mp3")
                    .audio_quality(SONG_AUDIO_QUALITY);
                let path = self.download_dir.join(format!("{title}.mp3"));
                self.download_titled(&url, &title, options, path).await.map(ResolvedMedia::File)
            }
            DownloadMode::Video => {
                if self.direct_stream_enabled().await {
                    self.resolve_direct_url(link, is_id).await.map(ResolvedMedia::StreamUrl)
                } else {
                    self.download_video(link, is_id).await.map(ResolvedMedia::File)
                }
            }
            DownloadMode::Audio => self.download_audio(link, is_id).await.map(ResolvedMedia::File)
        }
    }

    pub async fn list_playlist_ids(&self, link: &str, limit: u32, is_id: bool) -> ResolveResult<Vec<String>> {
        let url = MediaReference::new(link, is_id).playlist_url();
        let ids = self.tool.list_playlist(&url, limit).await?;
        tracing::debug!("playlist {} expanded to {} ids", url, ids.len());
        Ok(ids)
    }

    /// Non-DASH formats in tool order, with the link they were probed from.
    pub async fn list_formats(&self, link: &str, is_id: bool) -> ResolveResult<(Vec<FormatDescriptor>, String)> {
        let url = MediaReference::new(link, is_id).normalized();
        let entries = self.tool.probe_formats(&url).await?;

        let formats = entries
            .iter()
            .filter_map(Format::from_entry)
            .filter(|f| !f.is_dash())
            .map(|f| FormatDescriptor {
                file_size_bytes: f.estimated_size(),
                format_label: f.format,
                format_id: f.format_id,
                extension: f.ext,
                format_note: f.format_note,
                source_url: url.clone()
            })
            .collect();

        Ok((formats, url))
    }

    async fn first_hit(&self, link: &str, is_id: bool) -> ResolveResult<SearchHit> {
        let query = MediaReference::new(link, is_id).normalized();
        self.search
            .search(&query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or(ResolveError::NotFound)
    }

    async fn swallowed_hit(&self, link: &str, is_id: bool) -> Option<SearchHit> {
        match self.first_hit(link, is_id).await {
            Ok(hit) => Some(hit),
            Err(e) => {
                tracing::debug!("lookup for {} yielded nothing: {}", link, e);
                None
            }
        }
    }

    async fn direct_stream_enabled(&self) -> bool {
        match self.flags.is_on(DIRECT_STREAM_FLAG).await {
            Ok(on) => on,
            Err(e) => {
                tracing::warn!("flag lookup failed, downloading instead: {}", e);
                false
            }
        }
    }

    /// Downloads to `<download_dir>/<id>.<ext>` unless that file is already there.
    async fn download_by_id(&self, url: &str, format: &str) -> ResolveResult<PathBuf> {
        let probed = self.tool.probe_media(url, format).await?;
        let path = self.download_dir.join(format!("{}.{}", probed.id, probed.ext));

        if tokio::fs::try_exists(&path).await? {
            tracing::debug!("reusing {}", path.display());
            return Ok(path);
        }

        let options = base_options(format).output_template(template_in(&self.download_dir, "%(id)s"));
        tracing::info!("downloading {} to {}", url, path.display());
        self.tool.download_file(url, &options).await?;

        Ok(path)
    }

    async fn download_titled(
        &self,
        url: &str,
        title: &str,
        options: DownloadOptions,
        path: PathBuf
    ) -> ResolveResult<PathBuf> {
        if tokio::fs::try_exists(&path).await? {
            tracing::debug!("reusing {}", path.display());
            return Ok(path);
        }

        let options = options.output_template(template_in(&self.download_dir, &escape_template(title)));
        tracing::info!("downloading {} to {}", url, path.display());
        self.tool.download_file(url, &options).await?;

        Ok(path)
    }
}

fn base_options(format: &str) -> DownloadOptions {
    DownloadOptions::new()
        .format(OutputFormat::Custom(format.to_string()))
        .quiet(true)
        .no_check_certificates(true)
        .geo_bypass(true)
}

/// Output template `<dir>/<stem>.%(ext)s`; `stem` may hold template fields, `dir` is taken literally.
fn template_in(dir: &Path, stem: &str) -> String {
    let dir = escape_template(&dir.to_string_lossy());
    Path::new(&dir).join(format!("{stem}.%(ext)s")).to_string_lossy().to_string()
}

fn escape_template(text: &str) -> String {
    text.replace('%', "%%")
}

fn song_fields(request: &DownloadRequest) -> ResolveResult<(String, String)> {
    let format_id = request
        .format_id
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ResolveError::InvalidRequest("song downloads need a format_id".to_string()))?;

    let title = request
        .title
        .as_deref()
        .map(sanitize_filename)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ResolveError::InvalidRequest("song downloads need a title".to_string()))?;

    Ok((format_id.to_string(), title))
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn clean_thumbnail(hit: &SearchHit) -> String {
    hit.thumbnail_url.as_deref().map(strip_query).unwrap_or_default()
}

fn strip_query(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use super::types::ProbedMedia;

    #[derive(Default)]
    struct StubTool {
        stream_results: Mutex<VecDeque<ResolveResult<String>>>,
        stream_formats: Mutex<Vec<String>>,
        downloads: AtomicUsize,
        last_options: Mutex<Option<DownloadOptions>>,
        probed: Option<ProbedMedia>,
        playlist: Mutex<Vec<(String, u32)>>,
        formats: Vec<Value>
    }

    impl StubTool {
        fn with_streams(results: Vec<ResolveResult<String>>) -> Self {
            Self {
                stream_results: Mutex::new(results.into()),
                ..Self::default()
            }
        }

        fn with_probe(id: &str, ext: &str) -> Self {
            Self {
                probed: Some(ProbedMedia {
                    id: id.to_string(),
                    ext: ext.to_string()
                }),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ExtractionTool for StubTool {
        async fn get_stream_url(&self, _url: &str, format: &str) -> ResolveResult<String> {
            self.stream_formats.lock().unwrap().push(format.to_string());
            self.stream_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ResolveError::ToolFailure("no scripted result".to_string())))
        }

        async fn download_file(&self, _url: &str, options: &DownloadOptions) -> ResolveResult<()> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            let template = options.output_template.clone().unwrap();
            let ext = if options.extract_audio {
                "mp3".to_string()
            } else if options.container == Container::Mp4 {
                "mp4".to_string()
            } else {
                self.probed.as_ref().unwrap().ext.clone()
            };
            let id = self.probed.as_ref().map(|p| p.id.clone()).unwrap_or_default();
            let path = template
                .replace("%%", "\u{0}")
                .replace("%(id)s", &id)
                .replace("%(ext)s", &ext)
                .replace('\u{0}', "%");
            std::fs::write(path, b"media")?;
            *self.last_options.lock().unwrap() = Some(options.clone());
            Ok(())
        }

        async fn list_playlist(&self, url: &str, limit: u32) -> ResolveResult<Vec<String>> {
            self.playlist.lock().unwrap().push((url.to_string(), limit));
            Ok(vec!["aaa".to_string(), "bbb".to_string()])
        }

        async fn probe_formats(&self, _url: &str) -> ResolveResult<Vec<Value>> {
            Ok(self.formats.clone())
        }

        async fn probe_media(&self, _url: &str, _format: &str) -> ResolveResult<ProbedMedia> {
            self.probed.clone().ok_or(ResolveError::NotFound)
        }
    }

    #[derive(Default)]
    struct StubSearch {
        hits: Vec<SearchHit>,
        fail: bool,
        queries: Mutex<Vec<(String, usize)>>
    }

    #[async_trait]
    impl VideoSearch for StubSearch {
        async fn search(&self, query: &str, limit: usize) -> ResolveResult<Vec<SearchHit>> {
            self.queries.lock().unwrap().push((query.to_string(), limit));
            if self.fail {
                return Err(ResolveError::Search("connection reset".to_string()));
            }
            Ok(self.hits.iter().take(limit).cloned().collect())
        }
    }

    struct StubFlags(bool);

    #[async_trait]
    impl FeatureFlags for StubFlags {
        async fn is_on(&self, _flag: u32) -> ResolveResult<bool> {
            Ok(self.0)
        }
    }

    fn hit(id: &str, duration: Option<&str>) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            title: Some(format!("Title {id}")),
            duration: duration.map(String::from),
            thumbnail_url: Some(format!("https://i.ytimg.com/vi/{id}/hq720.jpg?sqp=-oay"))
        }
    }

    fn resolver(tool: Arc<StubTool>, search: Arc<StubSearch>, direct: bool, dir: &Path) -> MediaResolver {
        MediaResolver::new(tool, search, Arc::new(StubFlags(direct)), dir)
    }

    fn searching(hits: Vec<SearchHit>) -> (Arc<StubSearch>, MediaResolver) {
        let search = Arc::new(StubSearch {
            hits,
            ..StubSearch::default()
        });
        let resolver = resolver(Arc::new(StubTool::default()), search.clone(), false, Path::new("downloads"));
        (search, resolver)
    }

    #[tokio::test]
    async fn test_details_not_found_on_empty_results() {
        let (_, resolver) = searching(Vec::new());
        let result = resolver.fetch_details("https://youtu.be/missing", false).await;
        assert!(matches!(result, Err(ResolveError::NotFound)));
    }

    #[tokio::test]
    async fn test_details_maps_first_hit() {
        let (search, resolver) = searching(vec![hit("abc123", Some("3:45")), hit("zzz", Some("1:00"))]);

        let details = resolver
            .fetch_details("https://www.youtube.com/shorts/abc123", false)
            .await
            .unwrap();

        assert_eq!(details, MediaMetadata {
            title: "Title abc123".to_string(),
            duration_text: "3:45".to_string(),
            duration_seconds: 225,
            thumbnail_url: "https://i.ytimg.com/vi/abc123/hq720.jpg".to_string(),
            id: "abc123".to_string()
        });
        assert_eq!(search.queries.lock().unwrap()[0], (
            "https://www.youtube.com/watch?v=abc123".to_string(),
            1
        ));
    }

    #[tokio::test]
    async fn test_live_details_have_zero_seconds() {
        let (_, resolver) = searching(vec![hit("live", None)]);
        let details = resolver.fetch_details("live", true).await.unwrap();
        assert_eq!(details.duration_text, "LIVE");
        assert_eq!(details.duration_seconds, 0);
    }

    #[tokio::test]
    async fn test_single_field_lookups_swallow_errors() {
        let search = Arc::new(StubSearch {
            fail: true,
            ..StubSearch::default()
        });
        let resolver = resolver(Arc::new(StubTool::default()), search, false, Path::new("downloads"));

        assert_eq!(resolver.fetch_title("abc", true).await, None);
        assert_eq!(resolver.fetch_duration("abc", true).await, None);
        assert_eq!(resolver.fetch_thumbnail("abc", true).await, None);
    }

    #[tokio::test]
    async fn test_single_field_lookups() {
        let (_, resolver) = searching(vec![hit("abc", Some("1:02:03"))]);

        assert_eq!(resolver.fetch_title("abc", true).await.as_deref(), Some("Title abc"));
        assert_eq!(resolver.fetch_duration("abc", true).await.as_deref(), Some("1:02:03"));
        assert_eq!(
            resolver.fetch_thumbnail("abc", true).await.as_deref(),
            Some("https://i.ytimg.com/vi/abc/hq720.jpg")
        );
    }

    #[tokio::test]
    async fn test_track_details() {
        let (_, resolver) = searching(vec![hit("abc", Some("4:20"))]);

        let (track, id) = resolver.fetch_track("abc", true).await.unwrap();
        assert_eq!(id, "abc");
        assert_eq!(track.link, "https://www.youtube.com/watch?v=abc");
        assert_eq!(track.duration_text, "4:20");
    }

    #[tokio::test]
    async fn test_slider_is_bounds_checked() {
        let (search, resolver) = searching(vec![hit("a", Some("1:00")), hit("b", Some("2:00"))]);

        let entry = resolver.fetch_slider("lofi beats", 1, false).await.unwrap();
        assert_eq!(entry.id, "b");
        assert_eq!(search.queries.lock().unwrap()[0].1, 10);

        let missing = resolver.fetch_slider("lofi beats", 5, false).await;
        assert!(matches!(missing, Err(ResolveError::NotFound)));
    }

    #[tokio::test]
    async fn test_direct_url_first_try() {
        let tool = Arc::new(StubTool::with_streams(vec![Ok("https://rr1.googlevideo.com/v".to_string())]));
        let resolver = resolver(tool.clone(), Arc::new(StubSearch::default()), false, Path::new("downloads"));

        let url = resolver.resolve_direct_url("abc", true).await.unwrap();
        assert_eq!(url, "https://rr1.googlevideo.com/v");
        assert_eq!(*tool.stream_formats.lock().unwrap(), vec![VIDEO_STREAM_FORMAT]);
    }

    #[tokio::test]
    async fn test_direct_url_falls_back_to_audio_once() {
        let tool = Arc::new(StubTool::with_streams(vec![
            Err(ResolveError::ToolFailure("ERROR: Requested format is not available".to_string())),
            Ok("https://rr1.googlevideo.com/audio".to_string())
        ]));
        let resolver = resolver(tool.clone(), Arc::new(StubSearch::default()), false, Path::new("downloads"));

        let url = resolver.resolve_direct_url("abc", true).await.unwrap();
        assert_eq!(url, "https://rr1.googlevideo.com/audio");
        assert_eq!(
            *tool.stream_formats.lock().unwrap(),
            vec![VIDEO_STREAM_FORMAT, AUDIO_STREAM_FORMAT]
        );
    }

    #[tokio::test]
    async fn test_direct_url_surfaces_second_diagnostic() {
        let tool = Arc::new(StubTool::with_streams(vec![
            Err(ResolveError::ToolFailure("first failure".to_string())),
            Err(ResolveError::ToolFailure("ERROR: [youtube] abc: Sign in to confirm your age\n".to_string())),
            Ok("never reached".to_string())
        ]));
        let resolver = resolver(tool.clone(), Arc::new(StubSearch::default()), false, Path::new("downloads"));

        match resolver.resolve_direct_url("abc", true).await {
            Err(ResolveError::ToolFailure(message)) => {
                assert_eq!(message, "ERROR: [youtube] abc: Sign in to confirm your age\n");
            }
            other => panic!("unexpected result: {other:?}")
        }
        assert_eq!(tool.stream_formats.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_download_audio_fetches_once() {
        let dir = TempDir::new().unwrap();
        let tool = Arc::new(StubTool::with_probe("abc123", "webm"));
        let resolver = resolver(tool.clone(), Arc::new(StubSearch::default()), false, dir.path());

        let first = resolver.download_audio("abc123", true).await.unwrap();
        let second = resolver.download_audio("abc123", true).await.unwrap();

        assert_eq!(first, dir.path().join("abc123.webm"));
        assert_eq!(first, second);
        assert!(first.exists());
        assert_eq!(tool.downloads.load(Ordering::SeqCst), 1);

        let options = tool.last_options.lock().unwrap().clone().unwrap();
        assert_eq!(options.format, OutputFormat::Custom(AUDIO_STREAM_FORMAT.to_string()));
        assert!(options.geo_bypass);
        assert!(options.no_check_certificates);
    }

    #[tokio::test]
    async fn test_download_video_uses_capped_format() {
        let dir = TempDir::new().unwrap();
        let tool = Arc::new(StubTool::with_probe("abc123", "mp4"));
        let resolver = resolver(tool.clone(), Arc::new(StubSearch::default()), false, dir.path());

        let path = resolver.download_video("https://youtu.be/abc123", false).await.unwrap();
        assert_eq!(path, dir.path().join("abc123.mp4"));

        let options = tool.last_options.lock().unwrap().clone().unwrap();
        assert_eq!(options.format, OutputFormat::Custom(VIDEO_DOWNLOAD_FORMAT.to_string()));
    }

    #[tokio::test]
    async fn test_video_mode_follows_flag() {
        let dir = TempDir::new().unwrap();
        let request = DownloadRequest::new(DownloadMode::Video);

        let tool = Arc::new(StubTool {
            stream_results: Mutex::new(vec![Ok("https://rr1.googlevideo.com/v".to_string())].into()),
            ..StubTool::with_probe("abc", "mp4")
        });
        let direct = resolver(tool.clone(), Arc::new(StubSearch::default()), true, dir.path());
        let media = direct.download("abc", true, &request).await.unwrap();
        assert_eq!(media, ResolvedMedia::StreamUrl("https://rr1.googlevideo.com/v".to_string()));
        assert!(!media.is_local_file());
        assert_eq!(tool.downloads.load(Ordering::SeqCst), 0);

        let downloading = resolver(tool.clone(), Arc::new(StubSearch::default()), false, dir.path());
        let media = downloading.download("abc", true, &request).await.unwrap();
        assert_eq!(media, ResolvedMedia::File(dir.path().join("abc.mp4")));
        assert!(media.is_local_file());
    }

    #[tokio::test]
    async fn test_default_mode_downloads_audio() {
        let dir = TempDir::new().unwrap();
        let tool = Arc::new(StubTool::with_probe("abc", "m4a"));
        let resolver = resolver(tool, Arc::new(StubSearch::default()), true, dir.path());

        let media = resolver.download("abc", true, &DownloadRequest::default()).await.unwrap();
        assert_eq!(media, ResolvedMedia::File(dir.path().join("abc.m4a")));
    }

    #[tokio::test]
    async fn test_song_video_download() {
        let dir = TempDir::new().unwrap();
        let tool = Arc::new(StubTool::with_probe("abc", "webm"));
        let resolver = resolver(tool.clone(), Arc::new(StubSearch::default()), false, dir.path());

        let request = DownloadRequest::song(DownloadMode::SongVideo, "22", "AC/DC: Thunderstruck");
        let media = resolver.download("abc", true, &request).await.unwrap();

        let expected = dir.path().join("AC_DC_ Thunderstruck.mp4");
        assert_eq!(media, ResolvedMedia::File(expected.clone()));
        assert!(expected.exists());

        let options = tool.last_options.lock().unwrap().clone().unwrap();
        assert_eq!(options.format, OutputFormat::Custom("22+140".to_string()));
        assert_eq!(options.container, Container::Mp4);
    }

    #[tokio::test]
    async fn test_song_audio_download() {
        let dir = TempDir::new().unwrap();
        let tool = Arc::new(StubTool::with_probe("abc", "webm"));
        let resolver = resolver(tool.clone(), Arc::new(StubSearch::default()), false, dir.path());

        let request = DownloadRequest::song(DownloadMode::SongAudio, "251", "Song");
        let media = resolver.download("abc", true, &request).await.unwrap();
        assert_eq!(media, ResolvedMedia::File(dir.path().join("Song.mp3")));

        let options = tool.last_options.lock().unwrap().clone().unwrap();
        assert!(options.extract_audio);
        assert_eq!(options.audio_format.as_deref(), Some("mp3"));
        assert_eq!(options.audio_quality.as_deref(), Some("192"));
    }

    #[tokio::test]
    async fn test_song_modes_require_fields() {
        let resolver = resolver(
            Arc::new(StubTool::default()),
            Arc::new(StubSearch::default()),
            false,
            Path::new("downloads")
        );

        let request = DownloadRequest {
            mode: DownloadMode::SongAudio,
            format_id: None,
            title: Some("Song".to_string())
        };
        let result = resolver.download("abc", true, &request).await;
        assert!(matches!(result, Err(ResolveError::InvalidRequest(_))));

        let request = DownloadRequest::song(DownloadMode::SongVideo, "22", "   ");
        let result = resolver.download("abc", true, &request).await;
        assert!(matches!(result, Err(ResolveError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_playlist_uses_playlist_base() {
        let tool = Arc::new(StubTool::default());
        let resolver = resolver(tool.clone(), Arc::new(StubSearch::default()), false, Path::new("downloads"));

        let ids = resolver.list_playlist_ids("PL123", 25, true).await.unwrap();
        assert_eq!(ids, vec!["aaa", "bbb"]);
        assert_eq!(tool.playlist.lock().unwrap()[0], (
            "https://youtube.com/playlist?list=PL123".to_string(),
            25
        ));
    }

    #[tokio::test]
    async fn test_formats_keep_well_formed_non_dash_in_order() {
        let tool = Arc::new(StubTool {
            formats: vec![
                json!({ "format_id": "18", "format": "18 - 640x360 (360p)", "ext": "mp4",
                        "format_note": "360p", "filesize": 1_000_000 }),
                json!({ "format_id": "137", "format": "137 - 1920x1080 (DASH video)", "ext": "mp4" }),
                json!("garbage"),
                json!({ "format_id": "251" }),
                json!({ "format_id": "22", "format": "22 - 1280x720 (720p)", "ext": "mp4",
                        "filesize_approx": 42 }),
                json!({ "format_id": "140", "format": "140 - audio only (dash audio)" })
            ],
            ..StubTool::default()
        });
        let resolver = resolver(tool, Arc::new(StubSearch::default()), false, Path::new("downloads"));

        let (formats, link) = resolver
            .list_formats("https://www.youtube.com/watch?v=abc&list=PL1", false)
            .await
            .unwrap();

        assert_eq!(link, "https://www.youtube.com/watch?v=abc");
        let ids: Vec<&str> = formats.iter().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, vec!["18", "22"]);
        assert_eq!(formats[0].file_size_bytes, Some(1_000_000));
        assert_eq!(formats[0].format_note.as_deref(), Some("360p"));
        assert_eq!(formats[1].file_size_bytes, Some(42));
        assert_eq!(formats[1].source_url, link);
    }

    #[tokio::test]
    async fn test_song_title_percent_is_literal() {
        let dir = TempDir::new().unwrap();
        let tool = Arc::new(StubTool::with_probe("abc", "webm"));
        let resolver = resolver(tool.clone(), Arc::new(StubSearch::default()), false, dir.path());

        let request = DownloadRequest::song(DownloadMode::SongAudio, "251", "100% %(id)s");
        let media = resolver.download("abc", true, &request).await.unwrap();

        let expected = dir.path().join("100% %(id)s.mp3");
        assert_eq!(media, ResolvedMedia::File(expected.clone()));
        assert!(expected.exists());

        let options = tool.last_options.lock().unwrap().clone().unwrap();
        assert!(options.output_template.unwrap().ends_with("100%% %%(id)s.%(ext)s"));
    }

    #[test]
    fn test_template_escapes_directory() {
        assert_eq!(
            template_in(Path::new("/srv/50%"), "%(id)s"),
            "/srv/50%%/%(id)s.%(ext)s"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename(" a/b:c?d "), "a_b_c_d");
    }
}
