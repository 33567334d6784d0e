//! Display enumeration for DMTool
//!
//! Provides monitor geometry, per-monitor DPI and physical window placement.

pub mod backend;
pub mod dpi;
pub mod watcher;
#[cfg(windows)]
pub mod win32;

pub use backend::{dpi_scale, list_displays, DisplayBackend, PlacementOutcome, StaticDisplays};
pub use watcher::{DisplayEvent, DisplayWatcher};
#[cfg(windows)]
pub use win32::Win32Displays;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Windows(#[from] windows::core::Error),

    #[error("Display query failed: {0}")]
    Query(String),

    #[error("Invalid window handle")]
    InvalidWindow,

    #[error("Watcher error: {0}")]
    Watcher(String),
}

pub type DisplayResult<T> = Result<T, DisplayError>;

/// Native window handle (HWND on Windows)
pub type RawWindow = isize;

/// Rectangle in physical pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Same size, shifted by `(dx, dy)`.
    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Snapshot of one connected monitor.
///
/// Never mutated after enumeration; a configuration change produces a fresh
/// list.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayInfo {
    /// Position in OS enumeration order
    pub index: usize,
    /// Device name (`\\.\DISPLAY1` on Windows)
    pub name: String,
    /// Full monitor rectangle, physical pixels
    pub bounds: Rect,
    /// Monitor rectangle minus taskbars and docked bars, physical pixels
    pub work_area: Rect,
    pub is_primary: bool,
    /// Physical pixels per logical unit (1.0 = 96 DPI)
    pub scale_factor: f64,
}

impl DisplayInfo {
    /// Stand-in used when enumeration yields nothing.
    pub fn fallback() -> Self {
        let rect = Rect::new(0, 0, 1920, 1080);
        Self {
            index: 0,
            name: "fallback".to_string(),
            bounds: rect,
            work_area: rect,
            is_primary: true,
            scale_factor: 1.0,
        }
    }

    /// Working area size in logical units.
    pub fn logical_work_size(&self) -> (f64, f64) {
        (
            dpi::physical_to_logical(self.work_area.width as i32, self.scale_factor),
            dpi::physical_to_logical(self.work_area.height as i32, self.scale_factor),
        )
    }

    /// Label shown in the display selector.
    pub fn label(&self) -> String {
        let mut label = format!(
            "Display {}: {}x{}",
            self.index + 1,
            self.bounds.width,
            self.bounds.height
        );
        if self.is_primary {
            label.push_str(" (Primary)");
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_and_offset() {
        let rect = Rect::new(-1920, 0, 1920, 1080);
        assert_eq!(rect.right(), 0);
        assert_eq!(rect.bottom(), 1080);
        assert_eq!(rect.offset(20, -5), Rect::new(-1900, -5, 1920, 1080));
    }

    #[test]
    fn logical_size_divides_by_scale() {
        let display = DisplayInfo {
            index: 1,
            name: "secondary".into(),
            bounds: Rect::new(1920, 0, 3840, 2160),
            work_area: Rect::new(1920, 0, 3840, 2100),
            is_primary: false,
            scale_factor: 1.5,
        };
        assert_eq!(display.logical_work_size(), (2560.0, 1400.0));
        assert_eq!(display.label(), "Display 2: 3840x2160");
        assert_eq!(DisplayInfo::fallback().label(), "Display 1: 1920x1080 (Primary)");
    }
}
