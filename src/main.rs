#![warn(clippy::all, rust_2018_idioms)]

use capture_editor::EditorApp;
use image::RgbaImage;
use log::warn;
use std::path::PathBuf;

fn load_background(path: Option<&PathBuf>) -> RgbaImage {
    let blank = || RgbaImage::from_pixel(800, 600, image::Rgba([255, 255, 255, 255]));
    let Some(path) = path else { return blank() };
    match image::open(path) {
        Ok(image) => image.to_rgba8(),
        Err(err) => {
            warn!("could not open {}: {err}", path.display());
            blank()
        }
    }
}

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let source = std::env::args_os().nth(1).map(PathBuf::from);
    let background = load_background(source.as_ref());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([400.0, 300.0])
            .with_title("Capture editor"),
        ..Default::default()
    };
    eframe::run_native(
        "capture-editor",
        native_options,
        Box::new(move |cc| Ok(Box::new(EditorApp::new(cc, background, source)))),
    )
}
