use std::path::PathBuf;
use std::process::Output;

use tokio::process::Command;

use crate::command::CommandBuilder;
use crate::error::{Error, Result};
use crate::types::{DownloadOptions, VideoInfo};

/// Warning yt-dlp prints for playlists with private or deleted members.
const HIDDEN_VIDEOS_NOTICE: &str = "unavailable videos are hidden";

#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    cookies_file: Option<PathBuf>,
    extra_args: Vec<String>,
    ffmpeg_location: Option<PathBuf>
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlp {
    pub fn new() -> Self {
        Self::with_binary("yt-dlp")
    }

    pub fn with_binary(path: impl Into<PathBuf>) -> Self {
        Self {
            binary: path.into(),
            cookies_file: None,
            extra_args: Vec::new(),
            ffmpeg_location: None
        }
    }

    pub fn set_cookies_file(&mut self, path: Option<PathBuf>) {
        self.cookies_file = path;
    }

    pub fn set_extra_args(&mut self, args: Vec<String>) {
        self.extra_args = args;
    }

    pub fn set_ffmpeg_location(&mut self, path: Option<PathBuf>) {
        self.ffmpeg_location = path;
    }

    pub async fn check_binary(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(Error::BinaryNotExecutable(self.binary.clone()))
        }
    }

    /// Full metadata document for a single video, formats included.
    pub async fn get_video_info(&self, url: &str) -> Result<VideoInfo> {
        self.dump_info(url, None).await
    }

    /// Metadata as it would look after `format` is selected; `ext` then names
    /// the container the download will produce.
    pub async fn get_video_info_for_format(&self, url: &str, format: &str) -> Result<VideoInfo> {
        self.dump_info(url, Some(format)).await
    }

    /// First URL printed by `-g` for the given format selector.
    pub async fn get_stream_url(&self, url: &str, format: &str) -> Result<String> {
        let builder = self.command().get_url().format(format).url(url);
        let output = self.run(&builder).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match first_line(&stdout) {
            Some(line) => Ok(line.to_string()),
            None => Err(Error::NoOutput {
                stderr: String::from_utf8_lossy(&output.stderr).to_string()
            })
        }
    }

    pub async fn list_playlist_ids(&self, url: &str, limit: u32) -> Result<Vec<String>> {
        let builder = self
            .command()
            .ignore_errors()
            .get_id()
            .flat_playlist()
            .playlist_end(limit)
            .skip_download()
            .url(url);
        let output = self.run(&builder).await?;

        let ids = parse_id_lines(&String::from_utf8_lossy(&output.stdout));
        let stderr = String::from_utf8_lossy(&output.stderr);

        if ids.is_empty() && !stderr.trim().is_empty() && !is_benign_playlist_warning(&stderr) {
            return Err(Error::CommandFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.to_string()
            });
        }

        Ok(ids)
    }

    pub async fn download_with_options(&self, url: &str, options: &DownloadOptions) -> Result<()> {
        let builder = self.command().with_options(options).url(url);
        let output = self.run(&builder).await?;
        check_status(&output)
    }

    async fn dump_info(&self, url: &str, format: Option<&str>) -> Result<VideoInfo> {
        let mut builder = self.command();
        if let Some(format) = format {
            builder = builder.format(format);
        }
        let builder = builder.json_output().skip_download().no_playlist().url(url);

        let output = self.run(&builder).await?;
        check_status(&output)?;

        // Format-rich documents run to megabytes; keep parsing off the reactor.
        let stdout = output.stdout;
        tokio::task::spawn_blocking(move || serde_json::from_slice::<VideoInfo>(&stdout))
            .await
            .map_err(|e| Error::TaskFailed(e.to_string()))?
            .map_err(Error::from)
    }

    async fn run(&self, builder: &CommandBuilder) -> Result<Output> {
        tracing::debug!(
            binary = %self.binary.display(),
            args = ?builder.get_args(),
            "spawning yt-dlp"
        );

        let output = builder.build().output().await?;

        tracing::trace!(
            status = ?output.status.code(),
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "yt-dlp exited"
        );

        Ok(output)
    }

    fn command(&self) -> CommandBuilder {
        let mut builder = CommandBuilder::new(&self.binary)
            .cookies_file_opt(self.cookies_file.as_ref())
            .args(self.extra_args.iter().map(String::as_str));

        if let Some(ref ffmpeg_path) = self.ffmpeg_location {
            builder = builder.ffmpeg_location(ffmpeg_path);
        }

        builder
    }
}

fn check_status(output: &Output) -> Result<()> {
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string()
        })
    }
}

fn first_line(stdout: &str) -> Option<&str> {
    stdout.lines().map(str::trim).find(|line| !line.is_empty())
}

fn parse_id_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn is_benign_playlist_warning(stderr: &str) -> bool {
    stderr.to_lowercase().contains(HIDDEN_VIDEOS_NOTICE)
}
