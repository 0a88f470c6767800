use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("yt-dlp binary not executable: {0}")]
    BinaryNotExecutable(PathBuf),

    #[error("failed to execute yt-dlp: {0}")]
    ExecutionFailed(#[from] std::io::Error),

    #[error("yt-dlp command failed with exit code {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("yt-dlp produced no output: {stderr}")]
    NoOutput { stderr: String },

    #[error("failed to parse JSON output: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    TaskFailed(String)
}

impl Error {
    /// Diagnostic text reported by yt-dlp itself, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { stderr, .. } | Error::NoOutput { stderr } => Some(stderr),
            _ => None
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
