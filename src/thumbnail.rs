//! Blocking thumbnail fetch, decoded into an egui image.

use eframe::egui::ColorImage;

/// Fetches and decodes a thumbnail. Any failure means "no thumbnail";
/// the preview is optional and must never surface an error.
pub fn fetch_thumbnail(url: &str) -> Option<ColorImage> {
    let bytes = reqwest::blocking::get(url).ok()?.bytes().ok()?;
    let image = image::load_from_memory(&bytes).ok()?.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, &image))
}
