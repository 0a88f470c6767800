//! Async Rust wrapper for yt-dlp CLI.
//!
//! This library provides an async interface to the yt-dlp command-line tool:
//! direct stream URL resolution, downloads, flat playlist listing and
//! metadata/format introspection.
//!
//! # Example
//!
//! ```no_run
//! use yt_dlp::{DownloadOptions, OutputFormat, YtDlp};
//!
//! #[tokio::main]
//! async fn main() -> yt_dlp::Result<()> {
//!     let client = YtDlp::new();
//!
//!     let version = client.check_binary().await?;
//!     println!("yt-dlp version: {}", version);
//!
//!     let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
//!     let stream = client.get_stream_url(url, "bestaudio/best").await?;
//!     println!("Stream: {}", stream);
//!
//!     let options = DownloadOptions::new()
//!         .format(OutputFormat::Custom("bestaudio/best".to_string()))
//!         .output_template("downloads/%(id)s.%(ext)s");
//!     client.download_with_options(url, &options).await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod command;
pub mod error;
pub mod types;

pub use client::YtDlp;
pub use error::{Error, Result};
pub use types::{Container, DownloadOptions, Format, OutputFormat, VideoInfo};
