use async_trait::async_trait;
use serde_json::{Value, json};

use crate::resolver::{ResolveError, ResolveResult};

const INNERTUBE_API: &str = "https://www.youtube.com";
const CLIENT_NAME: &str = "WEB";
const CLIENT_ID: &str = "1";
const CLIENT_VERSION: &str = "2.20240726.00.00";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
/// Search filter restricting results to videos.
const VIDEO_FILTER: &str = "EgIQAQ%3D%3D";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub title: Option<String>,
    /// `None` for live streams.
    pub duration: Option<String>,
    pub thumbnail_url: Option<String>
}

impl SearchHit {
    pub fn link(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// At most `limit` video hits for a free-text or link query, best first.
    async fn search(&self, query: &str, limit: usize) -> ResolveResult<Vec<SearchHit>>;
}

/// Search over the web client's InnerTube endpoint.
#[derive(Debug, Clone)]
pub struct InnertubeSearch {
    http: reqwest::Client,
    base_url: String
}

impl InnertubeSearch {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: INNERTUBE_API.to_string()
        }
    }
}

#[async_trait]
impl VideoSearch for InnertubeSearch {
    async fn search(&self, query: &str, limit: usize) -> ResolveResult<Vec<SearchHit>> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION,
                    "hl": "en",
                    "gl": "US"
                }
            },
            "query": query,
            "params": VIDEO_FILTER
        });

        let url = format!("{}/youtubei/v1/search?prettyPrint=false", self.base_url);

        let res = self
            .http
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .header("X-YouTube-Client-Name", CLIENT_ID)
            .header("X-YouTube-Client-Version", CLIENT_VERSION)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ResolveError::Search(format!("search returned {}", res.status())));
        }

        let response: Value = res.json().await?;
        let hits = parse_search_response(&response, limit);

        if hits.is_empty() {
            tracing::debug!("search returned no videos for query: {}", query);
        }

        Ok(hits)
    }
}

pub fn parse_search_response(response: &Value, limit: usize) -> Vec<SearchHit> {
    let sections = response
        .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents")
        .and_then(Value::as_array);

    sections
        .into_iter()
        .flatten()
        .filter_map(|section| {
            section
                .pointer("/itemSectionRenderer/contents")
                .and_then(Value::as_array)
        })
        .flatten()
        .filter_map(|item| item.get("videoRenderer"))
        .filter_map(parse_video_renderer)
        .take(limit)
        .collect()
}

fn parse_video_renderer(renderer: &Value) -> Option<SearchHit> {
    let id = renderer.get("videoId").and_then(Value::as_str)?;

    let thumbnail_url = renderer
        .pointer("/thumbnail/thumbnails/0/url")
        .and_then(Value::as_str)
        .map(String::from);

    Some(SearchHit {
        id: id.to_string(),
        title: renderer.get("title").and_then(get_text),
        duration: renderer.get("lengthText").and_then(get_text),
        thumbnail_url
    })
}

fn get_text(value: &Value) -> Option<String> {
    if let Some(text) = value.get("simpleText").and_then(Value::as_str) {
        return Some(text.to_string());
    }

    let runs = value.get("runs")?.as_array()?;
    let text: String = runs
        .iter()
        .filter_map(|run| run.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() { None } else { Some(text) }
}
