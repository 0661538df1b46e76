//! Pure presentation: widget state, rendering, and blocking dialogs.
//!
//! The view never touches the model. Each frame `show` renders the window
//! from its own fields and reports what the user did as [`ViewAction`]s;
//! the controller owns the dispatch.

use std::path::PathBuf;

use eframe::egui::{self, Button, ColorImage, ComboBox, Context, Image, ProgressBar, RichText, TextureHandle, TextureOptions};
use rfd::{FileDialog, MessageDialog, MessageLevel};

use crate::model::Quality;

/// User interaction reported by one rendered frame.
pub enum ViewAction {
    FetchClicked,
    BrowseClicked,
    DownloadClicked,
    QualityChanged,
}

pub struct View {
    url_text: String,
    dir_text: String,
    quality: Quality,
    title_text: String,
    author_text: String,
    duration_text: String,
    status_text: String,
    /// 0–100, mirrors the model's progress.
    progress: f32,
    download_enabled: bool,
    thumbnail: Option<TextureHandle>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            url_text: String::new(),
            dir_text: String::new(),
            quality: Quality::default(),
            title_text: String::new(),
            author_text: String::new(),
            duration_text: String::new(),
            status_text: "Ready".to_string(),
            progress: 0.0,
            download_enabled: false,
            thumbnail: None,
        }
    }
}

impl View {
    /// Renders the window and returns the actions the user triggered.
    pub fn show(&mut self, ctx: &Context) -> Vec<ViewAction> {
        let mut actions = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Video Downloader");
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                ui.label("Video URL:");
                ui.add(egui::TextEdit::singleline(&mut self.url_text).desired_width(480.0));
                if ui.button("Fetch Video").clicked() {
                    actions.push(ViewAction::FetchClicked);
                }
            });
            ui.add_space(8.0);

            ui.group(|ui| {
                ui.label(RichText::new("Video Information").strong());
                ui.separator();
                ui.horizontal(|ui| {
                    if let Some(texture) = &self.thumbnail {
                        ui.add(Image::new(texture).max_height(90.0));
                    }
                    ui.vertical(|ui| {
                        ui.label(format!("Title: {}", self.title_text));
                        ui.label(format!("Author: {}", self.author_text));
                        ui.label(format!("Length: {}", self.duration_text));
                    });
                });
            });
            ui.add_space(8.0);

            ui.group(|ui| {
                ui.label(RichText::new("Download Options").strong());
                ui.separator();

                ui.horizontal(|ui| {
                    ui.label("Quality:");
                    let previous = self.quality;
                    ComboBox::from_id_source("quality")
                        .selected_text(self.quality.to_string())
                        .show_ui(ui, |ui| {
                            for quality in Quality::ALL {
                                ui.selectable_value(&mut self.quality, quality, quality.to_string());
                            }
                        });
                    if self.quality != previous {
                        actions.push(ViewAction::QualityChanged);
                    }
                });

                ui.horizontal(|ui| {
                    ui.label("Save to:");
                    ui.add(egui::TextEdit::singleline(&mut self.dir_text).desired_width(480.0));
                    if ui.button("Browse").clicked() {
                        actions.push(ViewAction::BrowseClicked);
                    }
                });

                if ui.add_enabled(self.download_enabled, Button::new("Download")).clicked() {
                    actions.push(ViewAction::DownloadClicked);
                }
            });
            ui.add_space(8.0);

            ui.add(ProgressBar::new(self.progress / 100.0).show_percentage());
            ui.label(&self.status_text);
        });

        actions
    }

    pub fn url(&self) -> &str {
        self.url_text.trim()
    }

    pub fn dir(&self) -> &str {
        &self.dir_text
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn set_dir(&mut self, directory: &str) {
        self.dir_text = directory.to_string();
    }

    pub fn set_video_info(&mut self, title: &str, author: &str, duration: &str) {
        self.title_text = title.to_string();
        self.author_text = author.to_string();
        self.duration_text = duration.to_string();
    }

    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress;
    }

    pub fn set_status(&mut self, status: &str) {
        self.status_text = status.to_string();
    }

    pub fn set_download_enabled(&mut self, enabled: bool) {
        self.download_enabled = enabled;
    }

    pub fn set_thumbnail(&mut self, ctx: &Context, image: ColorImage) {
        self.thumbnail = Some(ctx.load_texture("video-thumbnail", image, TextureOptions::default()));
    }

    pub fn clear_thumbnail(&mut self) {
        self.thumbnail = None;
    }

    /// Modal directory picker, anchored at the current directory value.
    pub fn show_directory_dialog(&self) -> Option<PathBuf> {
        FileDialog::new().set_directory(&self.dir_text).pick_folder()
    }

    pub fn show_error(&self, message: &str) {
        let _ = MessageDialog::new()
            .set_level(MessageLevel::Error)
            .set_title("Error")
            .set_description(message)
            .show();
    }

    pub fn show_success(&self, message: &str) {
        let _ = MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title("Success")
            .set_description(message)
            .show();
    }
}
