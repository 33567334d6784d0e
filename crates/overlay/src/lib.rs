//! Overlay module for DMTool
//!
//! Places the audience-facing window on its monitor and maintains the
//! fog-of-war mask drawn over it.

pub mod fog;
pub mod placement;
pub mod render;

pub use fog::{stroke_points, DirtyRect, FogEngine, FogMask, FogState};
pub use placement::{
    compute_window_rect, resolve_target_display, OverlayController, OverlayPlacement,
    PlacementSettings,
};
pub use render::{FogPatch, FogTextureSync, FogUpload, FOG_COLOR};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Display error: {0}")]
    Display(#[from] display::DisplayError),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Point in window-local logical units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Point at fraction `t` of the way towards `other`
    pub fn lerp(&self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}
