//! Session state and the operations the UI drives.
//!
//! The model owns everything the window displays: the currently fetched
//! video, the download directory, the chosen quality, progress and status.
//! Observers registered at startup are notified after every state change;
//! the actual network work is delegated to the `downloader` module.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use directories::UserDirs;

use crate::downloader::{self, VideoHandle};

/// Zero-argument callback invoked after every model mutation.
pub type Observer = Box<dyn Fn() + Send + Sync>;

/// Quality preset used to pick a stream variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Highest,
    Lowest,
    AudioOnly,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::Highest, Quality::Lowest, Quality::AudioOnly];

    /// yt-dlp format selector for this preset.
    pub fn format_selector(self) -> &'static str {
        match self {
            Quality::Highest => "best",
            Quality::Lowest => "worst",
            Quality::AudioOnly => "bestaudio",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Highest => write!(f, "highest"),
            Quality::Lowest => write!(f, "lowest"),
            Quality::AudioOnly => write!(f, "audio_only"),
        }
    }
}

impl FromStr for Quality {
    type Err = std::convert::Infallible;

    /// Unrecognized values fall back to the highest resolution.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "lowest" => Quality::Lowest,
            "audio_only" => Quality::AudioOnly,
            _ => Quality::Highest,
        })
    }
}

/// Snapshot of the fetched video, ready for display.
#[derive(Debug, Clone, Default)]
pub struct VideoInfo {
    pub title: String,
    pub author: String,
    pub duration: String,
    pub available: bool,
}

struct State {
    video: Option<VideoHandle>,
    download_path: String,
    quality: Quality,
    progress: f32,
    status: String,
}

/// Shared handle to the session state. Cloning is cheap; all clones point
/// at the same state and observer list, so worker tasks can mutate and
/// notify from any thread.
#[derive(Clone)]
pub struct Model {
    state: Arc<Mutex<State>>,
    observers: Arc<Mutex<Vec<Observer>>>,
}

impl Model {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                video: None,
                download_path: default_download_path(),
                quality: Quality::default(),
                progress: 0.0,
                status: "Ready".to_string(),
            })),
            observers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Registers an observer to notify when the model changes. The list is
    /// only appended to during startup and iterated afterwards.
    pub fn register_observer(&self, observer: Observer) {
        self.observers.lock().unwrap().push(observer);
    }

    fn notify_observers(&self) {
        for observer in self.observers.lock().unwrap().iter() {
            observer();
        }
    }

    pub fn download_path(&self) -> String {
        self.state.lock().unwrap().download_path.clone()
    }

    pub fn quality(&self) -> Quality {
        self.state.lock().unwrap().quality
    }

    pub fn progress(&self) -> f32 {
        self.state.lock().unwrap().progress
    }

    pub fn status(&self) -> String {
        self.state.lock().unwrap().status.clone()
    }

    pub fn thumbnail_url(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.video.as_ref().and_then(|video| video.thumbnail_url.clone())
    }

    /// Resolves the URL into a video handle and stores it. Failures are
    /// reported through the returned message, never as a fault.
    pub async fn set_url(&self, url: &str) -> Result<(), String> {
        match downloader::fetch_metadata(url).await {
            Ok(video) => {
                {
                    let mut state = self.state.lock().unwrap();
                    state.video = Some(video);
                    state.status = "Video info fetched successfully".to_string();
                }
                self.notify_observers();
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                {
                    let mut state = self.state.lock().unwrap();
                    state.status = format!("Error: {message}");
                }
                self.notify_observers();
                Err(message)
            }
        }
    }

    /// Stores the path verbatim; existence is checked at download time.
    pub fn set_download_path(&self, path: &str) {
        self.state.lock().unwrap().download_path = path.to_string();
        self.notify_observers();
    }

    pub fn set_quality(&self, quality: Quality) {
        self.state.lock().unwrap().quality = quality;
        self.notify_observers();
    }

    /// Display data for the fetched video; all-empty until a fetch succeeds.
    pub fn get_video_info(&self) -> VideoInfo {
        let state = self.state.lock().unwrap();
        match &state.video {
            Some(video) => VideoInfo {
                title: video.title.clone(),
                author: video.author.clone(),
                duration: format_duration(video.length),
                available: true,
            },
            None => VideoInfo::default(),
        }
    }

    /// Downloads the fetched video with the current quality and path.
    /// Returns the output file path on success.
    pub async fn download_video(&self) -> Result<PathBuf, String> {
        let (video, quality, download_path) = {
            let state = self.state.lock().unwrap();
            let Some(video) = state.video.clone() else {
                return Err("No video selected".to_string());
            };
            (video, state.quality, state.download_path.clone())
        };

        {
            let mut state = self.state.lock().unwrap();
            state.progress = 0.0;
            state.status = "Starting download...".to_string();
        }
        self.notify_observers();

        let filename = sanitize_filename(&video.title);

        {
            let mut state = self.state.lock().unwrap();
            state.status = "Download started...".to_string();
        }
        self.notify_observers();

        let progress = self.clone();
        let result = downloader::download(
            &video,
            quality.format_selector(),
            Path::new(&download_path),
            &filename,
            move |downloaded, total| progress.on_progress(downloaded, total),
        )
        .await;

        match result {
            Ok(output) => {
                {
                    let mut state = self.state.lock().unwrap();
                    state.status = "Download complete!".to_string();
                    state.progress = 100.0;
                }
                self.notify_observers();
                Ok(output)
            }
            Err(err) => {
                let message = err.to_string();
                {
                    let mut state = self.state.lock().unwrap();
                    state.status = format!("Download failed: {message}");
                }
                self.notify_observers();
                Err(message)
            }
        }
    }

    /// Invoked mid-transfer from whatever task drives the download.
    fn on_progress(&self, downloaded: u64, total: u64) {
        if total == 0 {
            return;
        }
        let percentage = (downloaded as f64 / total as f64 * 100.0) as f32;
        {
            let mut state = self.state.lock().unwrap();
            state.progress = percentage;
            state.status = format!("Downloading: {percentage:.1}%");
        }
        self.notify_observers();
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

fn default_download_path() -> String {
    match UserDirs::new() {
        Some(dirs) => dirs
            .download_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dirs.home_dir().join("Downloads")),
        None => PathBuf::from("."),
    }
    .display()
    .to_string()
}

/// Formats a length in seconds as `H:MM:SS`, or `M:SS` under an hour.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = seconds % 3600 / 60;
    let seconds = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Turns a video title into a filesystem-safe filename: characters outside
/// word/space/hyphen are dropped, runs of hyphens and whitespace collapse
/// into a single hyphen, and leading/trailing `-`/`_` are trimmed.
pub fn sanitize_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_separator = false;
    for c in title.chars() {
        if c == '-' || c.is_whitespace() {
            pending_separator = !out.is_empty();
        } else if c.is_alphanumeric() || c == '_' {
            if pending_separator {
                out.push('-');
                pending_separator = false;
            }
            out.push(c);
        }
    }
    out.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_video() -> VideoHandle {
        VideoHandle {
            url: "https://youtu.be/abc123".to_string(),
            title: "My Video! (2024)".to_string(),
            author: "Creator".to_string(),
            length: 125,
            thumbnail_url: None,
        }
    }

    #[test]
    fn duration_under_an_hour_is_m_ss() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(125), "2:05");
        assert_eq!(format_duration(3599), "59:59");
    }

    #[test]
    fn duration_with_hours_is_h_mm_ss() {
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3725), "1:02:05");
        assert_eq!(format_duration(36_610), "10:10:10");
    }

    #[test]
    fn sanitize_strips_punctuation_and_collapses_runs() {
        assert_eq!(sanitize_filename("My Video! (2024)"), "My-Video-2024");
        assert_eq!(sanitize_filename("a  --  b"), "a-b");
    }

    #[test]
    fn sanitize_trims_edge_separators() {
        assert_eq!(sanitize_filename("-_hello world_-"), "hello-world");
        assert_eq!(sanitize_filename("***"), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for title in ["My Video! (2024)", "  spaced  out  ", "plain", "_x_"] {
            let once = sanitize_filename(title);
            assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn quality_parsing_falls_back_to_highest() {
        assert_eq!("highest".parse::<Quality>().unwrap(), Quality::Highest);
        assert_eq!("lowest".parse::<Quality>().unwrap(), Quality::Lowest);
        assert_eq!("audio_only".parse::<Quality>().unwrap(), Quality::AudioOnly);
        assert_eq!("4k".parse::<Quality>().unwrap(), Quality::Highest);
    }

    #[test]
    fn quality_maps_to_format_selectors() {
        assert_eq!(Quality::Highest.format_selector(), "best");
        assert_eq!(Quality::Lowest.format_selector(), "worst");
        assert_eq!(Quality::AudioOnly.format_selector(), "bestaudio");
    }

    #[test]
    fn video_info_is_empty_before_a_fetch() {
        let model = Model::new();
        let info = model.get_video_info();
        assert!(!info.available);
        assert!(info.title.is_empty());
        assert!(info.author.is_empty());
        assert!(info.duration.is_empty());
    }

    #[test]
    fn video_info_reflects_the_stored_handle() {
        let model = Model::new();
        model.state.lock().unwrap().video = Some(test_video());
        let info = model.get_video_info();
        assert!(info.available);
        assert_eq!(info.title, "My Video! (2024)");
        assert_eq!(info.author, "Creator");
        assert_eq!(info.duration, "2:05");
    }

    #[tokio::test]
    async fn download_without_a_video_fails_fast() {
        let model = Model::new();
        let err = model.download_video().await.unwrap_err();
        assert_eq!(err, "No video selected");
        // The early failure must not touch state or notify anyone.
        assert_eq!(model.status(), "Ready");
        assert_eq!(model.progress(), 0.0);
    }

    #[test]
    fn every_setter_notifies_observers() {
        let model = Model::new();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        model.register_observer(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        model.set_quality(Quality::Lowest);
        model.set_download_path("/tmp");
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(model.quality(), Quality::Lowest);
        assert_eq!(model.download_path(), "/tmp");
    }

    #[test]
    fn progress_callback_updates_percentage_and_status() {
        let model = Model::new();
        model.on_progress(512, 2048);
        assert_eq!(model.progress(), 25.0);
        assert_eq!(model.status(), "Downloading: 25.0%");

        // An unknown total size leaves the state untouched.
        model.on_progress(4096, 0);
        assert_eq!(model.progress(), 25.0);
    }
}
