//! Overlay window placement
//!
//! Picks the monitor the audience sees, computes the physical window
//! rectangle and moves the window there without going through the toolkit's
//! DPI conversion.

use crate::fog::FogEngine;
use display::{dpi, DisplayBackend, DisplayInfo, PlacementOutcome, RawWindow, Rect};
use std::sync::Arc;

/// The settings the controller reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementSettings {
    /// Index into the display list, -1 for automatic
    pub target_display_index: i32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            target_display_index: -1,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

/// Pick the overlay monitor: explicit index, else the first secondary
/// display, else the primary (or first) display.
pub fn resolve_target_display<'a>(
    settings: &PlacementSettings,
    displays: &'a [DisplayInfo],
) -> Option<&'a DisplayInfo> {
    if let Ok(index) = usize::try_from(settings.target_display_index) {
        if let Some(display) = displays.get(index) {
            return Some(display);
        }
    }

    displays
        .iter()
        .find(|d| !d.is_primary)
        .or_else(|| displays.iter().find(|d| d.is_primary))
        .or_else(|| displays.first())
}

/// Working area of `display` shifted by the configured offset.
///
/// The offset is not clamped, so large values can move the window off-screen.
pub fn compute_window_rect(display: &DisplayInfo, settings: &PlacementSettings) -> Rect {
    display.work_area.offset(settings.offset_x, settings.offset_y)
}

/// Result of the last placement
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPlacement {
    pub display: DisplayInfo,
    /// Window rectangle in physical pixels
    pub physical: Rect,
    /// Scale re-queried at placement time
    pub scale_factor: f64,
    pub outcome: PlacementOutcome,
}

impl OverlayPlacement {
    /// Window origin in logical units
    pub fn logical_position(&self) -> (f32, f32) {
        (
            dpi::physical_to_logical(self.physical.x, self.scale_factor) as f32,
            dpi::physical_to_logical(self.physical.y, self.scale_factor) as f32,
        )
    }

    /// Window size in logical units
    pub fn logical_size(&self) -> (f32, f32) {
        (
            dpi::physical_to_logical(self.physical.width as i32, self.scale_factor) as f32,
            dpi::physical_to_logical(self.physical.height as i32, self.scale_factor) as f32,
        )
    }

    /// Logical size rounded to whole fog cells
    pub fn fog_size(&self) -> (u32, u32) {
        let (w, h) = self.logical_size();
        (w.round().max(0.0) as u32, h.round().max(0.0) as u32)
    }

    /// Whether the caller has to move the window itself
    pub fn needs_toolkit_move(&self) -> bool {
        self.outcome == PlacementOutcome::PassThrough
    }
}

/// Positions the overlay window
pub struct OverlayController {
    backend: Arc<dyn DisplayBackend>,
    current: Option<OverlayPlacement>,
}

impl OverlayController {
    pub fn new(backend: Arc<dyn DisplayBackend>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&OverlayPlacement> {
        self.current.as_ref()
    }

    /// Resolve the target, move `window` onto it and re-derive the fog mask
    /// for the new logical size.
    pub fn place(
        &mut self,
        window: Option<RawWindow>,
        settings: &PlacementSettings,
        displays: &[DisplayInfo],
        fog: &mut FogEngine,
    ) -> &OverlayPlacement {
        let display = match resolve_target_display(settings, displays) {
            Some(display) => display.clone(),
            None => {
                tracing::warn!("no displays reported, using built-in 1920x1080 primary");
                DisplayInfo::fallback()
            }
        };

        let scale_factor = display::dpi_scale(self.backend.as_ref(), &display);
        let physical = compute_window_rect(&display, settings);
        let outcome = self.apply(window, physical);

        let placement = OverlayPlacement {
            display,
            physical,
            scale_factor,
            outcome,
        };

        let (fog_w, fog_h) = placement.fog_size();
        fog.resize(fog_w, fog_h);

        tracing::info!(
            display = %placement.display.name,
            x = physical.x,
            y = physical.y,
            width = physical.width,
            height = physical.height,
            scale = scale_factor,
            ?outcome,
            "overlay placed"
        );

        self.current.insert(placement)
    }

    fn apply(&self, window: Option<RawWindow>, rect: Rect) -> PlacementOutcome {
        let Some(window) = window else {
            tracing::debug!("overlay handle not known yet, deferring to toolkit placement");
            return PlacementOutcome::PassThrough;
        };

        match self.backend.set_physical_rect(window, rect) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("physical placement failed, falling back to toolkit placement: {e}");
                PlacementOutcome::PassThrough
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use display::{DisplayError, DisplayResult, StaticDisplays};
    use parking_lot::Mutex;

    fn display(index: usize, x: i32, width: u32, height: u32, primary: bool, scale: f64) -> DisplayInfo {
        let bounds = Rect::new(x, 0, width, height);
        DisplayInfo {
            index,
            name: format!("\\\\.\\DISPLAY{}", index + 1),
            bounds,
            work_area: Rect::new(x, 0, width, height - 40),
            is_primary: primary,
            scale_factor: scale,
        }
    }

    fn two_displays() -> Vec<DisplayInfo> {
        vec![
            display(0, 0, 1920, 1080, true, 1.0),
            display(1, 1920, 3840, 2160, false, 1.5),
        ]
    }

    fn settings(index: i32) -> PlacementSettings {
        PlacementSettings {
            target_display_index: index,
            ..Default::default()
        }
    }

    /// Records physical rects like the Win32 backend would apply them
    #[derive(Default)]
    struct RecordingBackend {
        displays: Vec<DisplayInfo>,
        applied: Mutex<Vec<(RawWindow, Rect)>>,
        fail: bool,
    }

    impl DisplayBackend for RecordingBackend {
        fn enumerate(&self) -> DisplayResult<Vec<DisplayInfo>> {
            Ok(self.displays.clone())
        }

        fn query_dpi_scale(&self, display: &DisplayInfo) -> DisplayResult<f64> {
            Ok(display.scale_factor)
        }

        fn set_physical_rect(&self, window: RawWindow, rect: Rect) -> DisplayResult<PlacementOutcome> {
            if self.fail {
                return Err(DisplayError::InvalidWindow);
            }
            self.applied.lock().push((window, rect));
            Ok(PlacementOutcome::Applied)
        }
    }

    #[test]
    fn out_of_range_index_falls_back_to_secondary() {
        let displays = two_displays();
        let target = resolve_target_display(&settings(2), &displays).unwrap();
        assert_eq!(target.index, 1);
        assert!(!target.is_primary);
    }

    #[test]
    fn explicit_index_wins() {
        let displays = two_displays();
        assert_eq!(resolve_target_display(&settings(0), &displays).unwrap().index, 0);
        assert_eq!(resolve_target_display(&settings(-1), &displays).unwrap().index, 1);
    }

    #[test]
    fn single_primary_gets_its_work_area() {
        let displays = vec![display(0, 0, 1920, 1080, true, 1.0)];
        let target = resolve_target_display(&settings(-1), &displays).unwrap();
        assert!(target.is_primary);
        assert_eq!(
            compute_window_rect(target, &settings(-1)),
            Rect::new(0, 0, 1920, 1040)
        );
    }

    #[test]
    fn unflagged_displays_use_first() {
        let mut displays = two_displays();
        for d in &mut displays {
            d.is_primary = true;
        }
        assert_eq!(resolve_target_display(&settings(-1), &displays).unwrap().index, 0);
        assert!(resolve_target_display(&settings(-1), &[]).is_none());
    }

    #[test]
    fn offset_shifts_without_clamping() {
        let target = display(1, 1920, 3840, 2160, false, 1.5);
        let s = PlacementSettings {
            target_display_index: 1,
            offset_x: -50,
            offset_y: 5000,
        };
        assert_eq!(compute_window_rect(&target, &s), Rect::new(1870, 5000, 3840, 2120));
    }

    #[test]
    fn placement_applies_physical_rect_and_resizes_fog() {
        let backend = Arc::new(RecordingBackend {
            displays: two_displays(),
            ..Default::default()
        });
        let mut controller = OverlayController::new(backend.clone());
        let mut fog = FogEngine::new(10, 10, 50.0, true);

        let placement = controller
            .place(Some(42), &settings(-1), &backend.displays, &mut fog)
            .clone();

        assert_eq!(placement.outcome, PlacementOutcome::Applied);
        assert_eq!(placement.physical, Rect::new(1920, 0, 3840, 2120));
        assert_eq!(placement.logical_position(), (1280.0, 0.0));
        assert_eq!(fog.size(), (2560, 1413));
        assert_eq!(fog.mask().area(), 2560 * 1413);
        assert_eq!(*backend.applied.lock(), vec![(42, Rect::new(1920, 0, 3840, 2120))]);
        assert_eq!(controller.current(), Some(&placement));
    }

    #[test]
    fn missing_handle_or_failure_passes_through() {
        let backend = Arc::new(RecordingBackend {
            displays: two_displays(),
            fail: true,
            ..Default::default()
        });
        let mut controller = OverlayController::new(backend.clone());
        let mut fog = FogEngine::new(10, 10, 50.0, false);

        let placement = controller.place(Some(7), &settings(0), &backend.displays, &mut fog);
        assert!(placement.needs_toolkit_move());

        let placement = controller.place(None, &settings(0), &backend.displays, &mut fog);
        assert!(placement.needs_toolkit_move());
        assert_eq!(fog.size(), (1920, 1040));
    }

    #[test]
    fn no_displays_uses_fallback() {
        let backend: Arc<dyn DisplayBackend> = Arc::new(StaticDisplays::default());
        let mut controller = OverlayController::new(backend);
        let mut fog = FogEngine::new(1, 1, 50.0, true);

        let placement = controller.place(None, &PlacementSettings::default(), &[], &mut fog);
        assert_eq!(placement.physical, Rect::new(0, 0, 1920, 1080));
        // Unknown to the static backend, so DPI degrades to 1.0
        assert_eq!(placement.scale_factor, 1.0);
        assert_eq!(fog.size(), (1920, 1080));
    }
}
