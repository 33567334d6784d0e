//! OS windowing boundary

use crate::{dpi, DisplayError, DisplayInfo, DisplayResult, RawWindow, Rect};
use parking_lot::Mutex;

/// How a physical placement request was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// The backend moved the window in physical pixels
    Applied,
    /// The backend has no physical/logical split; the caller positions the
    /// window through its toolkit
    PassThrough,
}

/// The three primitives the core needs from the platform.
pub trait DisplayBackend: Send + Sync {
    /// Connected displays in OS enumeration order
    fn enumerate(&self) -> DisplayResult<Vec<DisplayInfo>>;

    /// Physical pixels per logical unit for `display`
    fn query_dpi_scale(&self, display: &DisplayInfo) -> DisplayResult<f64>;

    /// Move and resize `window` in physical pixels, bypassing any DPI
    /// virtualization of the toolkit
    fn set_physical_rect(&self, window: RawWindow, rect: Rect) -> DisplayResult<PlacementOutcome>;
}

/// Enumerate displays, degrading to an empty list on failure.
pub fn list_displays(backend: &dyn DisplayBackend) -> Vec<DisplayInfo> {
    match backend.enumerate() {
        Ok(displays) => {
            tracing::debug!(count = displays.len(), "enumerated displays");
            displays
        }
        Err(e) => {
            tracing::warn!("display enumeration failed: {e}");
            Vec::new()
        }
    }
}

/// DPI scale for `display`, 1.0 when the query fails.
pub fn dpi_scale(backend: &dyn DisplayBackend, display: &DisplayInfo) -> f64 {
    match backend.query_dpi_scale(display) {
        Ok(scale) => dpi::sanitize_scale(scale),
        Err(e) => {
            let name = &display.name;
            tracing::warn!("DPI query for {name} failed, assuming 100%: {e}");
            1.0
        }
    }
}

/// In-memory backend.
///
/// Used by tests and on platforms where the toolkit already works in
/// physical pixels; placement requests are handed back to the caller.
#[derive(Debug, Default)]
pub struct StaticDisplays {
    displays: Mutex<Vec<DisplayInfo>>,
}

impl StaticDisplays {
    pub fn new(displays: Vec<DisplayInfo>) -> Self {
        Self {
            displays: Mutex::new(displays),
        }
    }

    /// Single primary display of the given physical size at the origin
    pub fn primary_only(width: u32, height: u32, scale_factor: f64) -> Self {
        Self::new(vec![primary_display(width, height, scale_factor)])
    }

    /// Replace the snapshot wholesale
    pub fn replace(&self, displays: Vec<DisplayInfo>) {
        *self.displays.lock() = displays;
    }

    /// Replace the snapshot with a single primary display. Returns whether
    /// anything changed.
    pub fn sync_primary(&self, width: u32, height: u32, scale_factor: f64) -> bool {
        let next = vec![primary_display(width, height, scale_factor)];
        let mut guard = self.displays.lock();
        if *guard == next {
            return false;
        }
        *guard = next;
        true
    }
}

fn primary_display(width: u32, height: u32, scale_factor: f64) -> DisplayInfo {
    let rect = Rect::new(0, 0, width, height);
    DisplayInfo {
        index: 0,
        name: "primary".to_string(),
        bounds: rect,
        work_area: rect,
        is_primary: true,
        scale_factor,
    }
}

impl DisplayBackend for StaticDisplays {
    fn enumerate(&self) -> DisplayResult<Vec<DisplayInfo>> {
        Ok(self.displays.lock().clone())
    }

    fn query_dpi_scale(&self, display: &DisplayInfo) -> DisplayResult<f64> {
        self.displays
            .lock()
            .iter()
            .find(|d| d.bounds == display.bounds)
            .map(|d| d.scale_factor)
            .ok_or_else(|| DisplayError::Query(format!("unknown display {}", display.name)))
    }

    fn set_physical_rect(&self, _window: RawWindow, _rect: Rect) -> DisplayResult<PlacementOutcome> {
        Ok(PlacementOutcome::PassThrough)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenBackend;

    impl DisplayBackend for BrokenBackend {
        fn enumerate(&self) -> DisplayResult<Vec<DisplayInfo>> {
            Err(DisplayError::Query("no display server".into()))
        }

        fn query_dpi_scale(&self, _display: &DisplayInfo) -> DisplayResult<f64> {
            Err(DisplayError::Query("GetDpiForMonitor failed".into()))
        }

        fn set_physical_rect(&self, _window: RawWindow, _rect: Rect) -> DisplayResult<PlacementOutcome> {
            Err(DisplayError::InvalidWindow)
        }
    }

    #[test]
    fn failures_degrade_to_safe_defaults() {
        let backend = BrokenBackend;
        assert!(list_displays(&backend).is_empty());
        assert_eq!(dpi_scale(&backend, &DisplayInfo::fallback()), 1.0);
    }

    #[test]
    fn static_backend_reports_scale_and_passes_placement_through() {
        let backend = StaticDisplays::primary_only(2560, 1440, 1.25);
        let displays = list_displays(&backend);
        assert_eq!(displays.len(), 1);
        assert!(displays[0].is_primary);
        assert_eq!(dpi_scale(&backend, &displays[0]), 1.25);
        assert_eq!(
            backend.set_physical_rect(0, Rect::new(0, 0, 10, 10)).unwrap(),
            PlacementOutcome::PassThrough
        );
    }

    #[test]
    fn sync_primary_detects_changes() {
        let backend = StaticDisplays::primary_only(1920, 1080, 1.0);
        assert!(!backend.sync_primary(1920, 1080, 1.0));
        assert!(backend.sync_primary(2560, 1440, 1.0));
        assert_eq!(list_displays(&backend)[0].bounds.width, 2560);
    }

    #[test]
    fn unusable_scale_is_sanitized() {
        let backend = StaticDisplays::primary_only(1920, 1080, 0.0);
        let display = list_displays(&backend).remove(0);
        assert_eq!(dpi_scale(&backend, &display), 1.0);
    }
}
