mod config;
mod db;
mod error;
mod handlers;
mod models;
mod resolver;
mod search;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post}
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yt_dlp::YtDlp;

use config::Config;
use handlers::api;
use models::{FlagStore, Settings};
use resolver::MediaResolver;
use search::InnertubeSearch;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_resolver=info,tower_http=debug".into())
        )
        .init();

    let config = Config::from_env();

    let pool = db::init_pool(&config.database_path)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("failed to open database at {}", config.database_path))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    tracing::info!("Database initialized at {}", config.database_path);

    let yt_dlp = configure_ytdlp(&pool, &config).await;

    match yt_dlp.check_binary().await {
        Ok(version) => tracing::info!("yt-dlp version: {}", version),
        Err(e) => tracing::warn!("yt-dlp not found or not executable: {}", e)
    }

    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| format!("failed to create {}", config.download_dir.display()))?;

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let flags = FlagStore::new(pool.clone());
    let resolver = MediaResolver::new(
        Arc::new(yt_dlp),
        Arc::new(InnertubeSearch::new(http)),
        Arc::new(flags.clone()),
        config.download_dir.clone()
    );

    let state = AppState {
        pool,
        resolver: Arc::new(resolver),
        flags
    };

    let app = Router::new()
        .route("/api/exists", get(api::exists))
        .route("/api/message/url", post(api::message_url))
        .route("/api/details", get(api::details))
        .route("/api/title", get(api::title))
        .route("/api/duration", get(api::duration))
        .route("/api/thumbnail", get(api::thumbnail))
        .route("/api/track", get(api::track))
        .route("/api/slider", get(api::slider))
        .route("/api/stream", get(api::stream))
        .route("/api/download", post(api::download))
        .route("/api/playlist", get(api::playlist))
        .route("/api/formats", get(api::formats))
        .route("/api/flags/{flag}", get(api::get_flag).post(api::set_flag))
        .route("/api/settings", post(api::update_setting))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Builds the tool client from the environment, letting stored settings win.
async fn configure_ytdlp(pool: &db::DbPool, config: &Config) -> YtDlp {
    let binary = match Settings::get_non_empty(pool, "ytdlp_path").await {
        Ok(Some(path)) => {
            tracing::info!("Using custom yt-dlp path: {}", path);
            path
        }
        _ => config.ytdlp_path.clone()
    };
    let mut yt_dlp = YtDlp::with_binary(binary);

    let cookies = match Settings::get_non_empty(pool, "cookies_file").await {
        Ok(Some(path)) => PathBuf::from(path),
        _ => config.cookies_file.clone()
    };
    if cookies.exists() {
        tracing::info!("Using cookies file: {}", cookies.display());
        yt_dlp.set_cookies_file(Some(cookies));
    } else {
        tracing::warn!("cookies file {} not found, running without it", cookies.display());
    }

    match Settings::get_extractor_args(pool).await {
        Ok(args) if !args.is_empty() => yt_dlp.set_extra_args(args),
        Ok(_) => {}
        Err(e) => tracing::warn!("failed to read extractor args: {}", e)
    }

    if let Ok(Some(ffmpeg_path)) = Settings::get_non_empty(pool, "ffmpeg_path").await {
        tracing::info!("Using custom ffmpeg path: {}", ffmpeg_path);
        yt_dlp.set_ffmpeg_location(Some(PathBuf::from(ffmpeg_path)));
    }

    yt_dlp
}
