//! Thin wrapper around the yt-dlp executable.
//!
//! The binary is bundled under `assets/` and unpacked to the temp dir on
//! first use; when no bundled copy exists we fall back to whatever yt-dlp
//! is on PATH. Metadata comes from `--dump-json`, downloads stream their
//! progress through a `--progress-template` parsed line by line.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use rust_embed::RustEmbed;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::progress::{parse_destination_line, parse_progress_line};

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("yt-dlp not found: bundle it under assets/ or install it on PATH")]
    MissingBinary,
    #[error("failed to run yt-dlp: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected metadata from yt-dlp: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("{0}")]
    Failed(String),
}

/// Opaque handle to a resolved video: display metadata plus the URL the
/// download operation re-feeds to yt-dlp.
#[derive(Debug, Clone)]
pub struct VideoHandle {
    pub url: String,
    pub title: String,
    pub author: String,
    /// Total length in seconds.
    pub length: u64,
    pub thumbnail_url: Option<String>,
}

/// Subset of yt-dlp's `--dump-json` document we care about.
#[derive(Deserialize)]
struct RawMetadata {
    title: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
}

/// Locates the yt-dlp executable, unpacking the embedded copy if present.
fn binary() -> Result<PathBuf, DownloadError> {
    let name = if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" };
    if let Some(embedded) = Asset::get(name) {
        let target = env::temp_dir().join(name);
        if !target.exists() {
            let mut file = File::create(&target)?;
            file.write_all(&embedded.data)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755))?;
            }
        }
        return Ok(target);
    }
    which::which(name).map_err(|_| DownloadError::MissingBinary)
}

/// Resolves a URL into a [`VideoHandle`] via `yt-dlp --dump-json`.
pub async fn fetch_metadata(url: &str) -> Result<VideoHandle, DownloadError> {
    tracing::debug!(url, "fetching metadata");
    let output = Command::new(binary()?)
        .args(["--dump-json", "--no-playlist", "--no-warnings", url])
        .output()
        .await?;

    if !output.status.success() {
        return Err(DownloadError::Failed(last_nonempty_line(&output.stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_metadata(url, &stdout)
}

fn parse_metadata(url: &str, json: &str) -> Result<VideoHandle, DownloadError> {
    // One JSON document per line; --no-playlist guarantees a single entry.
    let line = json.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let raw: RawMetadata = serde_json::from_str(line)?;
    Ok(VideoHandle {
        url: raw.webpage_url.unwrap_or_else(|| url.to_string()),
        title: raw.title,
        author: raw.channel.or(raw.uploader).unwrap_or_default(),
        length: raw.duration.unwrap_or(0.0).round() as u64,
        thumbnail_url: raw.thumbnail,
    })
}

/// Downloads one stream variant of `video` into `directory`, writing
/// `<filename>.<ext>`. `on_progress` receives (downloaded, total) byte
/// counts as yt-dlp reports them. Returns the output file path.
pub async fn download(
    video: &VideoHandle,
    format: &str,
    directory: &Path,
    filename: &str,
    mut on_progress: impl FnMut(u64, u64),
) -> Result<PathBuf, DownloadError> {
    let template = directory.join(format!("{filename}.%(ext)s"));
    tracing::debug!(url = %video.url, format, "spawning download");

    let mut child = Command::new(binary()?)
        .arg("-f")
        .arg(format)
        .arg("--no-playlist")
        .arg("--newline")
        .arg("--progress-template")
        .arg("progress:%(progress.downloaded_bytes)s/%(progress.total_bytes,progress.total_bytes_estimate)s")
        .arg("-o")
        .arg(&template)
        .arg(&video.url)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Drain stderr concurrently so a chatty child cannot fill the pipe;
    // keep the last line around as the failure message.
    let stderr = child.stderr.take().unwrap();
    let stderr_task = tokio::spawn(async move {
        let mut last = String::new();
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::trace!(target: "yt_dlp", "{line}");
            if !line.trim().is_empty() {
                last = line;
            }
        }
        last
    });

    let stdout = child.stdout.take().unwrap();
    let mut destination: Option<PathBuf> = None;
    let mut lines = BufReader::new(stdout).lines();
    while let Some(line) = lines.next_line().await? {
        tracing::trace!(target: "yt_dlp", "{line}");
        if let Some((downloaded, total)) = parse_progress_line(&line) {
            on_progress(downloaded, total);
        } else if let Some(path) = parse_destination_line(&line) {
            destination = Some(path);
        }
    }

    let status = child.wait().await?;
    let last_stderr = stderr_task.await.unwrap_or_default();
    if !status.success() {
        let message = if last_stderr.is_empty() {
            format!("yt-dlp exited with {status}")
        } else {
            last_stderr
        };
        return Err(DownloadError::Failed(message));
    }

    Ok(destination.unwrap_or_else(|| directory.join(filename)))
}

fn last_nonempty_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("yt-dlp exited with an error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dump_json_metadata() {
        let json = concat!(
            r#"{"title":"My Video! (2024)","channel":"Creator","uploader":"creator123","#,
            r#""duration":125.0,"thumbnail":"https://i.ytimg.com/vi/abc123/hqdefault.jpg","#,
            r#""webpage_url":"https://www.youtube.com/watch?v=abc123"}"#
        );
        let video = parse_metadata("https://youtu.be/abc123", json).unwrap();
        assert_eq!(video.title, "My Video! (2024)");
        assert_eq!(video.author, "Creator");
        assert_eq!(video.length, 125);
        assert_eq!(video.url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(
            video.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/abc123/hqdefault.jpg")
        );
    }

    #[test]
    fn metadata_falls_back_to_uploader_and_request_url() {
        let json = r#"{"title":"Clip","uploader":"someone","duration":59}"#;
        let video = parse_metadata("https://example.com/clip", json).unwrap();
        assert_eq!(video.author, "someone");
        assert_eq!(video.length, 59);
        assert_eq!(video.url, "https://example.com/clip");
        assert!(video.thumbnail_url.is_none());
    }

    #[test]
    fn metadata_without_a_title_is_an_error() {
        assert!(parse_metadata("https://example.com", r#"{"duration":10}"#).is_err());
        assert!(parse_metadata("https://example.com", "").is_err());
    }

    #[test]
    fn last_stderr_line_wins() {
        let stderr = b"WARNING: something minor\nERROR: Video unavailable\n\n";
        assert_eq!(last_nonempty_line(stderr), "ERROR: Video unavailable");
        assert_eq!(last_nonempty_line(b""), "yt-dlp exited with an error");
    }
}
