use axum::{
    extract::{Path, Query, State},
    response::Json
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::models::Settings;
use crate::resolver::{DownloadRequest, MediaMetadata, Message, SliderEntry};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LinkQuery {
    link: String,
    #[serde(default)]
    is_id: bool
}

#[derive(Debug, Deserialize)]
pub struct SliderQuery {
    query: String,
    index: usize,
    #[serde(default)]
    is_id: bool
}

#[derive(Debug, Deserialize)]
pub struct PlaylistQuery {
    link: String,
    limit: u32,
    #[serde(default)]
    is_id: bool
}

#[derive(Debug, Deserialize)]
pub struct DownloadBody {
    link: String,
    #[serde(default)]
    is_id: bool,
    #[serde(flatten)]
    request: DownloadRequest
}

#[derive(Debug, Deserialize)]
pub struct FlagBody {
    enabled: bool
}

#[derive(Debug, Deserialize)]
pub struct SettingBody {
    key: String,
    value: String
}

#[tracing::instrument(skip(state))]
pub async fn exists(
    State(state): State<AppState>,
    Query(q): Query<LinkQuery>
) -> Json<Value> {
    Json(json!({ "exists": state.resolver.exists(&q.link, q.is_id) }))
}

#[tracing::instrument(skip(state, message))]
pub async fn message_url(
    State(state): State<AppState>,
    Json(message): Json<Message>
) -> Json<Value> {
    Json(json!({ "url": state.resolver.extract_url_from_message(&message) }))
}

#[tracing::instrument(skip(state))]
pub async fn details(
    State(state): State<AppState>,
    Query(q): Query<LinkQuery>
) -> Result<Json<MediaMetadata>, AppError> {
    Ok(Json(state.resolver.fetch_details(&q.link, q.is_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn title(
    State(state): State<AppState>,
    Query(q): Query<LinkQuery>
) -> Json<Value> {
    Json(json!({ "title": state.resolver.fetch_title(&q.link, q.is_id).await }))
}

#[tracing::instrument(skip(state))]
pub async fn duration(
    State(state): State<AppState>,
    Query(q): Query<LinkQuery>
) -> Json<Value> {
    Json(json!({ "duration": state.resolver.fetch_duration(&q.link, q.is_id).await }))
}

#[tracing::instrument(skip(state))]
pub async fn thumbnail(
    State(state): State<AppState>,
    Query(q): Query<LinkQuery>
) -> Json<Value> {
    Json(json!({ "thumbnail": state.resolver.fetch_thumbnail(&q.link, q.is_id).await }))
}

#[tracing::instrument(skip(state))]
pub async fn track(
    State(state): State<AppState>,
    Query(q): Query<LinkQuery>
) -> Result<Json<Value>, AppError> {
    let (track, id) = state.resolver.fetch_track(&q.link, q.is_id).await?;
    Ok(Json(json!({ "track": track, "id": id })))
}

#[tracing::instrument(skip(state))]
pub async fn slider(
    State(state): State<AppState>,
    Query(q): Query<SliderQuery>
) -> Result<Json<SliderEntry>, AppError> {
    Ok(Json(state.resolver.fetch_slider(&q.query, q.index, q.is_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn stream(
    State(state): State<AppState>,
    Query(q): Query<LinkQuery>
) -> Result<Json<Value>, AppError> {
    let url = state.resolver.resolve_direct_url(&q.link, q.is_id).await?;
    Ok(Json(json!({ "url": url })))
}

#[tracing::instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Json(body): Json<DownloadBody>
) -> Result<Json<Value>, AppError> {
    let media = state.resolver.download(&body.link, body.is_id, &body.request).await?;
    tracing::info!("resolved {} as {:?}", body.link, media);
    Ok(Json(json!({ "local": media.is_local_file(), "media": media })))
}

#[tracing::instrument(skip(state))]
pub async fn playlist(
    State(state): State<AppState>,
    Query(q): Query<PlaylistQuery>
) -> Result<Json<Value>, AppError> {
    let ids = state.resolver.list_playlist_ids(&q.link, q.limit, q.is_id).await?;
    Ok(Json(json!({ "ids": ids })))
}

#[tracing::instrument(skip(state))]
pub async fn formats(
    State(state): State<AppState>,
    Query(q): Query<LinkQuery>
) -> Result<Json<Value>, AppError> {
    let (formats, link) = state.resolver.list_formats(&q.link, q.is_id).await?;
    Ok(Json(json!({ "formats": formats, "link": link })))
}

#[tracing::instrument(skip(state))]
pub async fn get_flag(
    State(state): State<AppState>,
    Path(flag): Path<u32>
) -> Result<Json<Value>, AppError> {
    let enabled = state.flags.get(flag).await?;
    Ok(Json(json!({ "flag": flag, "enabled": enabled })))
}

#[tracing::instrument(skip(state))]
pub async fn set_flag(
    State(state): State<AppState>,
    Path(flag): Path<u32>,
    Json(body): Json<FlagBody>
) -> Result<Json<Value>, AppError> {
    state.flags.set(flag, body.enabled).await?;
    tracing::info!("flag {} set to {}", flag, body.enabled);
    Ok(Json(json!({ "flag": flag, "enabled": body.enabled })))
}

/// Persists a tool setting; it is applied on the next start.
#[tracing::instrument(skip(state))]
pub async fn update_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingBody>
) -> Result<Json<Value>, AppError> {
    if !Settings::KEYS.contains(&body.key.as_str()) {
        return Err(AppError::bad_request(format!("Unknown setting: {}", body.key)));
    }

    Settings::set(&state.pool, &body.key, body.value.trim()).await?;
    tracing::info!("Updated setting {}", body.key);

    Ok(Json(json!({ "key": body.key, "saved": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DownloadMode;

    #[test]
    fn test_download_body_flattens_request() {
        let body: DownloadBody = serde_json::from_value(json!({
            "link": "https://youtu.be/abc",
            "mode": "song_video",
            "format_id": "22",
            "title": "Song"
        }))
        .unwrap();

        assert_eq!(body.link, "https://youtu.be/abc");
        assert!(!body.is_id);
        assert_eq!(body.request.mode, DownloadMode::SongVideo);
        assert_eq!(body.request.format_id.as_deref(), Some("22"));
        assert_eq!(body.request.title.as_deref(), Some("Song"));
    }

    #[test]
    fn test_download_body_defaults_to_audio() {
        let body: DownloadBody = serde_json::from_value(json!({ "link": "abc", "is_id": true })).unwrap();

        assert!(body.is_id);
        assert_eq!(body.request.mode, DownloadMode::Audio);
        assert_eq!(body.request.format_id, None);
    }

    #[test]
    fn test_download_body_rejects_unknown_mode() {
        let result = serde_json::from_value::<DownloadBody>(json!({ "link": "abc", "mode": "podcast" }));
        assert!(result.is_err());
    }
}
