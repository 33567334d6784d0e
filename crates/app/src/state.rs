//! Application state for DMTool
//!
//! Owns the image collection, the fog engine and the overlay placement for
//! the lifetime of the program. The UI reads from it and routes every user
//! action through it.

use crate::events::{reactions_for, Reaction, SettingsEvent};
use crate::settings::Settings;
use display::{list_displays, DisplayBackend, DisplayEvent, DisplayInfo, RawWindow};
use gallery::{
    initial_scale, place_randomly, CollectionEvent, DecodedImage, ImageCollection, ImageId,
    ImageRecord, LoadOutcome,
};
use overlay::{resolve_target_display, FogEngine, OverlayController, OverlayPlacement};
use rand::rngs::StdRng;
use std::cell::{Cell, RefCell};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

/// Smallest value offered by the max-size slider
pub const MIN_SLIDER_IMAGE_SIZE: f32 = 100.0;

/// Largest slider value when no display is known
const FALLBACK_MAX_DIMENSION: f32 = 1920.0;

pub struct AppState {
    settings: Settings,
    backend: Arc<dyn DisplayBackend>,
    displays: Vec<DisplayInfo>,
    images: ImageCollection,
    fog: FogEngine,
    overlay: OverlayController,
    rng: StdRng,
    debug_text: String,
    debug_stale: Rc<Cell<bool>>,
    evicted: Rc<RefCell<Vec<ImageId>>>,
    /// Placement to run on the next frame
    placement_requested: bool,
    status: String,
}

impl AppState {
    pub fn new(settings: Settings, backend: Arc<dyn DisplayBackend>, rng: StdRng) -> Self {
        let displays = list_displays(backend.as_ref());
        let config = settings.config();
        let fog = FogEngine::new(0, 0, config.fog_reveal_size, config.enable_fog_of_war);

        let mut images = ImageCollection::new();
        let debug_stale = Rc::new(Cell::new(true));
        let stale = debug_stale.clone();
        images.subscribe(Box::new(move |_| stale.set(true)));

        let evicted = Rc::new(RefCell::new(Vec::new()));
        let queue = evicted.clone();
        let mut known: Vec<ImageId> = Vec::new();
        images.subscribe(Box::new(move |event| match event {
            CollectionEvent::Added(id) => known.push(*id),
            CollectionEvent::Removed(id) => {
                known.retain(|k| k != id);
                queue.borrow_mut().push(*id);
            }
            CollectionEvent::Cleared => queue.borrow_mut().append(&mut known),
            CollectionEvent::Updated(_) => {}
        }));

        let status = if displays.len() <= 1 {
            tracing::warn!("only one display found, the overlay covers the primary display");
            "Only one display found. The overlay is shown on the primary display.".to_string()
        } else {
            "Ready".to_string()
        };

        Self {
            settings,
            overlay: OverlayController::new(backend.clone()),
            backend,
            displays,
            images,
            fog,
            rng,
            debug_text: String::new(),
            debug_stale,
            evicted,
            placement_requested: true,
            status,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn displays(&self) -> &[DisplayInfo] {
        &self.displays
    }

    pub fn images(&self) -> &ImageCollection {
        &self.images
    }

    pub fn fog(&self) -> &FogEngine {
        &self.fog
    }

    pub fn fog_mut(&mut self) -> &mut FogEngine {
        &mut self.fog
    }

    pub fn placement(&self) -> Option<&OverlayPlacement> {
        self.overlay.current()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Move the overlay onto its target display and rebuild the fog for it.
    ///
    /// The first placement, and any placement that lands on a different
    /// scale factor, asks for one more pass: the toolkit resizes the window
    /// when it sees the DPI change and undoes the physical rectangle.
    pub fn place_overlay(&mut self, window: Option<RawWindow>) -> OverlayPlacement {
        let settings = self.settings.config().placement();
        let previous_scale = self.overlay.current().map(|p| p.scale_factor);
        let placement = self
            .overlay
            .place(window, &settings, &self.displays, &mut self.fog)
            .clone();

        if previous_scale != Some(placement.scale_factor) {
            tracing::debug!(
                from = ?previous_scale,
                to = placement.scale_factor,
                "scale factor changed, placing again next frame"
            );
            self.placement_requested = true;
        }
        self.debug_stale.set(true);
        placement
    }

    /// Whether a placement pass is waiting for the next frame
    pub fn placement_pending(&self) -> bool {
        self.placement_requested
    }

    /// Consume the pending placement request
    pub fn take_placement_request(&mut self) -> bool {
        std::mem::take(&mut self.placement_requested)
    }

    /// Follow the real size of the overlay window, in logical units.
    /// Returns whether the fog was rebuilt.
    pub fn window_resized(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width, height) == self.fog.size() {
            return false;
        }
        tracing::debug!(width, height, "overlay window resized");
        self.fog.resize(width, height);
        self.debug_stale.set(true);
        true
    }

    /// Re-enumerate displays after a configuration change and re-place the
    /// overlay.
    pub fn handle_display_event(
        &mut self,
        event: DisplayEvent,
        window: Option<RawWindow>,
    ) -> OverlayPlacement {
        tracing::info!(?event, "refreshing displays");
        self.displays = list_displays(self.backend.as_ref());

        let bound = *self.max_image_size_range().end();
        if self.settings.config().max_image_size > bound {
            self.change_settings(window, |s| s.set_max_image_size(bound));
        }

        self.place_overlay(window)
    }

    /// Apply a settings mutation and run its reactions. Returns the new
    /// overlay placement when the overlay moved.
    pub fn change_settings(
        &mut self,
        window: Option<RawWindow>,
        change: impl FnOnce(&mut Settings) -> Option<SettingsEvent>,
    ) -> Option<OverlayPlacement> {
        let event = change(&mut self.settings)?;
        self.apply(&event, window)
    }

    fn apply(&mut self, event: &SettingsEvent, window: Option<RawWindow>) -> Option<OverlayPlacement> {
        tracing::debug!(?event, "settings changed");
        let mut placement = None;

        for reaction in reactions_for(event) {
            match reaction {
                Reaction::RepositionOverlay => placement = Some(self.place_overlay(window)),
                Reaction::ResetFog => self.fog.reset(),
                Reaction::ToggleFog => {
                    self.fog.set_enabled(self.settings.config().enable_fog_of_war);
                }
                Reaction::UpdateRevealSize => {
                    self.fog.set_reveal_size(self.settings.config().fog_reveal_size);
                }
                Reaction::RefreshDebugInfo => self.debug_stale.set(true),
                Reaction::Persist => self.settings.mark_dirty(Instant::now()),
            }
        }

        placement
    }

    /// Restore full fog coverage on user request
    pub fn reset_fog(&mut self) {
        self.fog.reset();
        self.status = "Fog of war reset".to_string();
    }

    /// Slider bounds for the max image size: 100 up to the largest display
    /// dimension.
    pub fn max_image_size_range(&self) -> RangeInclusive<f32> {
        let largest = self
            .displays
            .iter()
            .map(|d| d.bounds.width.max(d.bounds.height) as f32)
            .fold(0.0, f32::max);
        let largest = if largest > 0.0 {
            largest
        } else {
            FALLBACK_MAX_DIMENSION
        };
        MIN_SLIDER_IMAGE_SIZE..=largest.max(MIN_SLIDER_IMAGE_SIZE)
    }

    /// Logical working-area size of the overlay display
    pub fn display_size(&self) -> (f32, f32) {
        if let Some(placement) = self.overlay.current() {
            return placement.logical_size();
        }
        let settings = self.settings.config().placement();
        let display = resolve_target_display(&settings, &self.displays)
            .cloned()
            .unwrap_or_else(DisplayInfo::fallback);
        let (w, h) = display.logical_work_size();
        (w as f32, h as f32)
    }

    /// Size, place and append a freshly decoded image
    pub fn add_decoded(&mut self, path: PathBuf, image: Arc<DecodedImage>) -> ImageId {
        let max_size = self.settings.config().max_image_size;
        let scale = initial_scale(max_size, image.width, image.height);
        let placement = place_randomly(
            image.width,
            image.height,
            self.display_size(),
            max_size,
            &mut self.rng,
        );

        let mut record = ImageRecord::new(path, image, scale);
        record.apply(&placement);
        self.status = format!("Added {}", record.file_name());
        tracing::info!(
            name = %record.file_name(),
            x = record.x,
            y = record.y,
            scale = record.scale,
            rotation = record.rotation,
            "image placed"
        );
        self.images.push(record)
    }

    /// Consume one loader result
    pub fn handle_load(&mut self, outcome: LoadOutcome) -> Option<ImageId> {
        match outcome {
            LoadOutcome::Loaded { path, image } => Some(self.add_decoded(path, image)),
            LoadOutcome::Failed { path, error } => {
                tracing::warn!("failed to load {}: {error}", path.display());
                self.status = format!("Could not load {}", path.display());
                None
            }
        }
    }

    /// Place `id` again from its original bitmap
    pub fn reposition(&mut self, id: ImageId) -> bool {
        let display_size = self.display_size();
        let max_size = self.settings.config().max_image_size;
        let rng = &mut self.rng;
        self.images.update(id, |record| {
            let (width, height) = (record.bitmap().width, record.bitmap().height);
            let placement = place_randomly(width, height, display_size, max_size, rng);
            record.apply(&placement);
        })
    }

    pub fn toggle_visibility(&mut self, id: ImageId) -> bool {
        self.images.update(id, |record| record.visible = !record.visible)
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        let changed = self.images.set_all_visible(visible);
        self.status = if visible {
            format!("Showing all images ({changed} changed)")
        } else {
            format!("Hiding all images ({changed} changed)")
        };
    }

    pub fn remove(&mut self, id: ImageId) -> bool {
        match self.images.remove(id) {
            Some(record) => {
                self.status = format!("Removed {}", record.file_name());
                true
            }
            None => false,
        }
    }

    pub fn remove_all(&mut self) {
        let count = self.images.len();
        self.images.clear();
        self.status = format!("Removed {count} images");
    }

    /// Images whose textures can be released
    pub fn take_evicted(&mut self) -> Vec<ImageId> {
        std::mem::take(&mut *self.evicted.borrow_mut())
    }

    /// Debug listing for the overlay, when enabled
    pub fn debug_text(&mut self) -> Option<&str> {
        if !self.settings.config().show_debug_info {
            return None;
        }
        if self.debug_stale.replace(false) {
            let mut text = self.images.debug_listing();
            if let Some(placement) = self.overlay.current() {
                let (w, h) = placement.logical_size();
                text.push_str(&format!(
                    "\n{} @ {:.0}% ({w:.0}x{h:.0})",
                    placement.display.label(),
                    placement.scale_factor * 100.0
                ));
            }
            self.debug_text = text;
        }
        Some(&self.debug_text)
    }

    pub fn save_settings(&mut self) {
        if let Err(e) = self.settings.save() {
            tracing::warn!("failed to save settings: {e}");
        }
    }

    pub fn save_settings_if_due(&mut self, now: Instant) {
        if let Err(e) = self.settings.save_if_due(now) {
            tracing::warn!("failed to save settings: {e}");
        }
    }
}
