//! Desktop video downloader: paste a URL, fetch metadata, pick a quality,
//! download to a chosen folder. Model-view-controller on top of egui, with
//! the heavy lifting delegated to yt-dlp.

// MVC wiring between model and view
mod controller;
// yt-dlp subprocess wrapper (metadata + download)
mod downloader;
// Session state, observers, and the fetch/download operations
mod model;
// Parsers for yt-dlp's stdout lines
mod progress;
// Thumbnail fetching
mod thumbnail;
// Widgets and dialogs
mod view;

use std::sync::Arc;

use eframe::egui;
use once_cell::sync::OnceCell;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use controller::Controller;

// Global tokio runtime stored in a OnceCell for lazy init
pub(crate) static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = Arc::new(Runtime::new().unwrap());
    RUNTIME.set(runtime).unwrap();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 500.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Video Downloader",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(Controller::new(cc.egui_ctx.clone()))
        }),
    )
}
