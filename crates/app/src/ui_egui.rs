//! egui front end: overlay in the root viewport, control window as a child

use crate::control_panel::{dropped_images, ControlPanel};
use crate::overlay_view;
use crate::textures::TextureCache;
use crossbeam_channel::{unbounded, Receiver};
use display::{DisplayBackend, DisplayEvent, DisplayWatcher, RawWindow};
use dmtool::settings::SAVE_DELAY;
use dmtool::{AppState, Settings};
use eframe::egui;
use egui::{ViewportCommand, ViewportId};
use gallery::ImageLoader;
use overlay::OverlayPlacement;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

pub struct DmToolApp {
    state: AppState,
    loader: ImageLoader,
    textures: TextureCache,
    panel: ControlPanel,
    display_events: Receiver<DisplayEvent>,
    _watcher: Option<DisplayWatcher>,
    #[cfg(not(windows))]
    monitor: Arc<display::StaticDisplays>,
    overlay_window: Option<RawWindow>,
}

impl DmToolApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: Settings,
        startup_images: Vec<PathBuf>,
    ) -> anyhow::Result<Self> {
        let ctx = cc.egui_ctx.clone();
        let waker: Arc<dyn Fn() + Send + Sync> = Arc::new(move || ctx.request_repaint());

        #[cfg(windows)]
        let backend: Arc<dyn DisplayBackend> = Arc::new(display::Win32Displays::new());
        #[cfg(not(windows))]
        let monitor = Arc::new(display::StaticDisplays::primary_only(1920, 1080, 1.0));
        #[cfg(not(windows))]
        let backend: Arc<dyn DisplayBackend> = monitor.clone();

        let (event_tx, display_events) = unbounded();
        let watcher = DisplayWatcher::spawn(event_tx, waker.clone()).unwrap_or_else(|e| {
            tracing::warn!("display change notifications unavailable: {e}");
            None
        });

        let loader = ImageLoader::spawn(waker)?;
        for path in startup_images {
            loader.request(path)?;
        }

        let state = AppState::new(settings, backend, StdRng::from_entropy());

        Ok(Self {
            state,
            loader,
            textures: TextureCache::new(),
            panel: ControlPanel::default(),
            display_events,
            _watcher: watcher,
            #[cfg(not(windows))]
            monitor,
            overlay_window: None,
        })
    }

    fn capture_overlay_handle(&mut self, frame: &eframe::Frame) {
        use raw_window_handle::{HasWindowHandle, RawWindowHandle};

        if self.overlay_window.is_some() {
            return;
        }
        if let Ok(handle) = frame.window_handle() {
            if let RawWindowHandle::Win32(win32) = handle.as_raw() {
                self.overlay_window = Some(win32.hwnd.get());
            }
        }
    }

    /// Raise a configuration change when the toolkit reports a new monitor
    /// size; there is no native watcher on this platform.
    #[cfg(not(windows))]
    fn track_monitor(&mut self, ctx: &egui::Context) {
        let (size, ppp) = ctx.input(|i| {
            let viewport = i.viewport();
            (viewport.monitor_size, viewport.native_pixels_per_point)
        });
        let Some(size) = size else {
            return;
        };
        let ppp = ppp.unwrap_or(1.0);
        let width = (size.x * ppp).round() as u32;
        let height = (size.y * ppp).round() as u32;
        if width > 0 && height > 0 && self.monitor.sync_primary(width, height, ppp as f64) {
            let placement = self
                .state
                .handle_display_event(DisplayEvent::ConfigurationChanged, self.overlay_window);
            move_with_toolkit(ctx, &placement);
        }
    }

    /// Rebuild the fog when the overlay's real size no longer matches it
    fn track_window_size(&mut self, ctx: &egui::Context) {
        let rect = ctx.input(|i| i.viewport().inner_rect).unwrap_or_else(|| ctx.screen_rect());
        let width = rect.width().round().max(0.0) as u32;
        let height = rect.height().round().max(0.0) as u32;
        self.state.window_resized(width, height);
    }

    fn request_loads(&mut self, paths: Vec<PathBuf>) {
        for path in paths {
            if let Err(e) = self.loader.request(path) {
                tracing::warn!("cannot queue image: {e}");
                self.state.set_status("Image loader stopped");
                return;
            }
        }
    }

    fn show_control_window(&mut self, ctx: &egui::Context) {
        let builder = egui::ViewportBuilder::default()
            .with_title("DMTool")
            .with_inner_size([440.0, 720.0])
            .with_min_inner_size([360.0, 480.0]);
        let window = self.overlay_window;

        let output = ctx.show_viewport_immediate(
            ViewportId::from_hash_of("dmtool-control"),
            builder,
            |ctx, _class| {
                let mut output = self.panel.show(ctx, &mut self.state, &mut self.textures, window);
                if ctx.input(|i| i.viewport().close_requested()) {
                    output.exit = true;
                }
                output
            },
        );

        if let Some(placement) = &output.moved {
            move_with_toolkit(ctx, placement);
        }
        self.request_loads(output.load);
        if output.exit {
            tracing::info!("exit requested from control window");
            self.state.save_settings();
            ctx.send_viewport_cmd_to(ViewportId::ROOT, ViewportCommand::Close);
        }
    }
}

/// Position the overlay through egui when the backend could not place it in
/// physical pixels.
fn move_with_toolkit(ctx: &egui::Context, placement: &OverlayPlacement) {
    if !placement.needs_toolkit_move() {
        return;
    }
    let (x, y) = placement.logical_position();
    let (width, height) = placement.logical_size();
    ctx.send_viewport_cmd_to(ViewportId::ROOT, ViewportCommand::OuterPosition(egui::pos2(x, y)));
    ctx.send_viewport_cmd_to(ViewportId::ROOT, ViewportCommand::InnerSize(egui::vec2(width, height)));
}

impl eframe::App for DmToolApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.capture_overlay_handle(frame);

        if self.state.take_placement_request() {
            let placement = self.state.place_overlay(self.overlay_window);
            move_with_toolkit(ctx, &placement);
        }

        #[cfg(not(windows))]
        self.track_monitor(ctx);

        while let Ok(event) = self.display_events.try_recv() {
            let placement = self.state.handle_display_event(event, self.overlay_window);
            move_with_toolkit(ctx, &placement);
        }

        for outcome in self.loader.drain() {
            self.state.handle_load(outcome);
        }
        self.textures.evict(self.state.take_evicted());

        let dropped = dropped_images(ctx);
        self.request_loads(dropped);

        self.track_window_size(ctx);
        overlay_view::show(ctx, &mut self.state, &mut self.textures);
        self.show_control_window(ctx);

        if self.state.placement_pending() {
            ctx.request_repaint();
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            self.state.save_settings();
        }

        self.state.save_settings_if_due(Instant::now());
        if self.state.settings().is_dirty() {
            ctx.request_repaint_after(SAVE_DELAY);
        }
    }
}

impl Drop for DmToolApp {
    fn drop(&mut self) {
        if self.state.settings().is_dirty() {
            self.state.save_settings();
        }
    }
}
