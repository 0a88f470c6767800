use sqlx::{Row, SqlitePool};

pub struct Settings;

impl Settings {
    /// Keys that may be written through the API.
    pub const KEYS: [&'static str; 4] = ["ytdlp_path", "cookies_file", "extractor_args", "ffmpeg_path"];

    pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value"
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// A stored value, ignoring blanks.
    pub async fn get_non_empty(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
        Ok(Self::get(pool, key).await?.filter(|v| !v.trim().is_empty()))
    }

    pub async fn get_extractor_args(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        Ok(Self::get(pool, "extractor_args")
            .await?
            .map(|args| parse_extractor_args(&args))
            .unwrap_or_default())
    }
}

/// One `--extractor-args` value built from the non-empty lines of the stored setting.
pub fn parse_extractor_args(input: &str) -> Vec<String> {
    let joined: Vec<&str> = input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if joined.is_empty() {
        return Vec::new();
    }
    vec![
        "--extractor-args".to_string(),
        joined.join(";")
    ]
}
