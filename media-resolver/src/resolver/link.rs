use std::sync::LazyLock;

use regex::Regex;

pub const WATCH_BASE: &str = "https://www.youtube.com/watch?v=";
pub const PLAYLIST_BASE: &str = "https://youtube.com/playlist?list=";

static PLATFORM_HOSTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:youtube\.com|youtu\.be)").expect("static host pattern"));

/// A caller-supplied link, or a bare platform id when `is_video_id` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    link: String,
    is_video_id: bool
}

impl MediaReference {
    pub fn new(link: impl Into<String>, is_video_id: bool) -> Self {
        Self {
            link: link.into(),
            is_video_id
        }
    }

    /// The link as given, expanded to a watch URL when it is a bare id.
    pub fn video_url(&self) -> String {
        if self.is_video_id {
            format!("{WATCH_BASE}{}", self.link)
        } else {
            self.link.clone()
        }
    }

    /// Canonical watch URL handed to the search service and to yt-dlp.
    pub fn normalized(&self) -> String {
        normalize_link(&self.video_url())
    }

    /// Playlist URL with any trailing query parameters removed.
    pub fn playlist_url(&self) -> String {
        let url = if self.is_video_id {
            format!("{PLAYLIST_BASE}{}", self.link)
        } else {
            self.link.clone()
        };
        strip_query_trailer(&url).to_string()
    }
}

pub fn exists(link: &str, is_video_id: bool) -> bool {
    PLATFORM_HOSTS.is_match(&MediaReference::new(link, is_video_id).video_url())
}

/// Drops everything after the first `&` and rewrites `shorts/<id>` to
/// `watch?v=<id>`. Applying it twice yields the same string.
pub fn normalize_link(link: &str) -> String {
    let link = strip_query_trailer(link);
    match link.split_once("shorts/") {
        Some((head, rest)) => {
            let id = rest.split(['?', '/']).next().unwrap_or_default();
            format!("{head}watch?v={id}")
        }
        None => link.to_string()
    }
}

fn strip_query_trailer(link: &str) -> &str {
    link.split('&').next().unwrap_or(link)
}
