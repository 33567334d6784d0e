//! DMTool - tabletop image and fog-of-war overlay

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod control_panel;
mod overlay_view;
mod textures;
mod ui_egui;

use crate::ui_egui::DmToolApp;
use clap::Parser;
use dmtool::{logging, Args, Settings};
use eframe::egui;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.debug);

    #[cfg(windows)]
    display::win32::enable_per_monitor_dpi_awareness();

    let settings = Settings::load(args.settings_path());
    let startup = args.startup_images();
    tracing::info!(
        config = %settings.path().display(),
        images = startup.len(),
        "starting DMTool"
    );

    // The root viewport is the overlay; it is moved onto its display on the
    // first frame.
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("DMTool Overlay")
            .with_inner_size([1280.0, 720.0])
            .with_decorations(false)
            .with_always_on_top()
            .with_taskbar(false)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "DMTool",
        native_options,
        Box::new(move |cc| Ok(Box::new(DmToolApp::new(cc, settings, startup)?))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))?;

    tracing::info!("DMTool exited");
    Ok(())
}
