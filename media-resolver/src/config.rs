use std::path::PathBuf;

const DEFAULT_DATABASE_PATH: &str = "./media-resolver.db";
const DEFAULT_COOKIES_FILE: &str = "cookies/cookies.txt";
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
const DEFAULT_PORT: &str = "8000";

/// Startup configuration. Persisted settings may override parts of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_path: String,
    pub cookies_file: PathBuf,
    pub download_dir: PathBuf,
    pub ytdlp_path: String,
    pub port: String
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            database_path: var("DATABASE_PATH", DEFAULT_DATABASE_PATH),
            cookies_file: PathBuf::from(var("COOKIES_FILE", DEFAULT_COOKIES_FILE)),
            download_dir: PathBuf::from(var("DOWNLOAD_DIR", DEFAULT_DOWNLOAD_DIR)),
            ytdlp_path: var("YTDLP_PATH", DEFAULT_YTDLP_PATH),
            port: var("PORT", DEFAULT_PORT)
        }
    }
}
