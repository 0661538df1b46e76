//! Wires the model to the view.
//!
//! The controller is the only model observer and the only code allowed to
//! touch the view. Fetch and download run on the shared tokio runtime;
//! everything they need to say to the UI travels through one unbounded
//! channel drained at the top of each frame, together with a
//! `request_repaint` to wake the event loop.

use std::path::{Path, PathBuf};

use eframe::egui::{ColorImage, Context};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::RUNTIME;
use crate::model::{Model, Quality};
use crate::thumbnail;
use crate::view::{View, ViewAction};

/// Work posted from worker tasks onto the UI thread.
enum UiMessage {
    /// The model changed; re-pull its state into the view.
    ModelChanged,
    Thumbnail(ColorImage),
    FetchFailed(String),
    DownloadFinished(Result<PathBuf, String>),
}

pub struct Controller {
    model: Model,
    view: View,
    ctx: Context,
    ui_tx: UnboundedSender<UiMessage>,
    ui_rx: UnboundedReceiver<UiMessage>,
}

impl Controller {
    pub fn new(ctx: Context) -> Self {
        let model = Model::new();
        let mut view = View::default();
        let (ui_tx, ui_rx) = unbounded_channel();

        // Initialize the view with model data.
        view.set_dir(&model.download_path());
        view.set_status(&model.status());

        // The single observer: post a refresh and wake the event loop.
        // Observers fire on worker threads, so no view access here.
        let tx = ui_tx.clone();
        let repaint = ctx.clone();
        model.register_observer(Box::new(move || {
            let _ = tx.send(UiMessage::ModelChanged);
            repaint.request_repaint();
        }));

        let mut controller = Self { model, view, ctx, ui_tx, ui_rx };
        controller.update_view();
        controller
    }

    /// Pulls model state into the view. UI thread only.
    fn update_view(&mut self) {
        let info = self.model.get_video_info();
        self.view.set_video_info(&info.title, &info.author, &info.duration);
        self.view.set_status(&self.model.status());
        self.view.set_progress(self.model.progress());
        self.view.set_download_enabled(info.available);
    }

    fn fetch_video(&mut self) {
        let url = self.view.url().to_string();
        if url.is_empty() {
            self.view.show_error("Please enter a video URL");
            return;
        }

        // Clear stale info before fetching.
        self.view.set_video_info("", "", "");
        self.view.clear_thumbnail();
        self.view.set_download_enabled(false);
        self.view.set_status("Fetching video info...");

        let model = self.model.clone();
        let tx = self.ui_tx.clone();
        let ctx = self.ctx.clone();
        RUNTIME.get().unwrap().spawn(async move {
            match model.set_url(&url).await {
                Ok(()) => {
                    if let Some(thumbnail_url) = model.thumbnail_url() {
                        tokio::task::spawn_blocking(move || {
                            if let Some(image) = thumbnail::fetch_thumbnail(&thumbnail_url) {
                                let _ = tx.send(UiMessage::Thumbnail(image));
                                ctx.request_repaint();
                            }
                        });
                    }
                }
                Err(error) => {
                    let _ = tx.send(UiMessage::FetchFailed(error));
                    ctx.request_repaint();
                }
            }
        });
    }

    fn browse_directory(&mut self) {
        if let Some(directory) = self.view.show_directory_dialog() {
            let directory = directory.display().to_string();
            self.model.set_download_path(&directory);
            self.view.set_dir(&directory);
        }
    }

    fn change_quality(&mut self, quality: Quality) {
        self.model.set_quality(quality);
    }

    fn download_video(&mut self) {
        if !Path::new(self.view.dir()).is_dir() {
            self.view.show_error("Please select a valid directory");
            return;
        }

        self.view.set_download_enabled(false);

        let model = self.model.clone();
        let tx = self.ui_tx.clone();
        let ctx = self.ctx.clone();
        RUNTIME.get().unwrap().spawn(async move {
            let result = model.download_video().await;
            let _ = tx.send(UiMessage::DownloadFinished(result));
            ctx.request_repaint();
        });
    }
}

impl eframe::App for Controller {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        // Drain everything the workers posted since the last frame.
        while let Ok(message) = self.ui_rx.try_recv() {
            match message {
                UiMessage::ModelChanged => self.update_view(),
                UiMessage::Thumbnail(image) => self.view.set_thumbnail(ctx, image),
                UiMessage::FetchFailed(error) => {
                    self.view.show_error(&format!("Could not fetch video info: {error}"));
                }
                UiMessage::DownloadFinished(result) => {
                    match result {
                        Ok(path) => self.view.show_success(&format!(
                            "Video downloaded successfully!\n\nSaved to: {}",
                            path.display()
                        )),
                        Err(error) => self.view.show_error(&format!("Download failed: {error}")),
                    }
                    // Re-enabled regardless of outcome.
                    self.view.set_download_enabled(true);
                }
            }
        }

        for action in self.view.show(ctx) {
            match action {
                ViewAction::FetchClicked => self.fetch_video(),
                ViewAction::BrowseClicked => self.browse_directory(),
                ViewAction::QualityChanged => self.change_quality(self.view.quality()),
                ViewAction::DownloadClicked => self.download_video(),
            }
        }

        // Safety net: keep polling while background work may be pending.
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
