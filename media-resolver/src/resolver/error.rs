#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no media found")]
    NotFound,

    #[error("extraction tool failed: {0}")]
    ToolFailure(String),

    #[error("search request failed: {0}")]
    Search(String),

    #[error("feature flag lookup failed: {0}")]
    Flags(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error)
}

impl From<yt_dlp::Error> for ResolveError {
    fn from(err: yt_dlp::Error) -> Self {
        match err.diagnostic() {
            Some(stderr) => ResolveError::ToolFailure(stderr.to_string()),
            None => ResolveError::ToolFailure(err.to_string())
        }
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        ResolveError::Search(err.to_string())
    }
}

impl From<sqlx::Error> for ResolveError {
    fn from(err: sqlx::Error) -> Self {
        ResolveError::Flags(err.to_string())
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
