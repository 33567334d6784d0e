//! Fog-of-war mask
//!
//! The opaque region is stored as a coverage mask with one cell per logical
//! unit of the overlay window. Erasing subtracts a disc; a cell belongs to the
//! disc when its centre does.

use crate::{OverlayError, OverlayResult, Point};

const OPAQUE: u8 = 255;
const CLEAR: u8 = 0;

/// Mask-local rectangle of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    fn union(self, other: DirtyRect) -> DirtyRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

/// Currently opaque fog area
#[derive(Debug, Clone)]
pub struct FogMask {
    width: u32,
    height: u32,
    cells: Vec<u8>,
    opaque: u64,
    dirty: Option<DirtyRect>,
}

impl PartialEq for FogMask {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }
}

impl FogMask {
    /// Mask covering the whole `width` x `height` window
    pub fn full(width: u32, height: u32) -> Self {
        let mut mask = Self {
            width,
            height,
            cells: Vec::new(),
            opaque: 0,
            dirty: None,
        };
        mask.reset();
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of opaque cells
    pub fn area(&self) -> u64 {
        self.opaque
    }

    /// Area of the window rectangle the mask was last reset to
    #[cfg(test)]
    fn window_area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[(y * self.width + x) as usize] == OPAQUE
    }

    /// Row-major cells, 255 = fog, 0 = revealed
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Make every cell opaque again
    pub fn reset(&mut self) {
        let len = self.width as usize * self.height as usize;
        self.cells.clear();
        self.cells.resize(len, OPAQUE);
        self.opaque = len as u64;
        self.dirty = if len > 0 {
            Some(DirtyRect {
                x: 0,
                y: 0,
                width: self.width,
                height: self.height,
            })
        } else {
            None
        };
    }

    /// Remove the disc of `diameter` centred at `center`. Returns the number
    /// of cells that turned clear.
    pub fn subtract_circle(&mut self, center: Point, diameter: f32) -> OverlayResult<u64> {
        if !center.is_finite() {
            return Err(OverlayError::DegenerateGeometry(format!(
                "non-finite erase point ({}, {})",
                center.x, center.y
            )));
        }
        if !diameter.is_finite() || diameter <= 0.0 {
            return Err(OverlayError::DegenerateGeometry(format!(
                "invalid reveal diameter {diameter}"
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Ok(0);
        }

        let radius = diameter / 2.0;
        let radius_sq = radius * radius;
        let x0 = (center.x - radius).floor().max(0.0) as u32;
        let y0 = (center.y - radius).floor().max(0.0) as u32;
        let x1 = ((center.x + radius).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((center.y + radius).ceil().max(0.0) as u32).min(self.height);

        let mut cleared = 0u64;
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in y0..y1 {
            let dy = y as f32 + 0.5 - center.y;
            let row = (y * self.width) as usize;
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - center.x;
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let cell = &mut self.cells[row + x as usize];
                if *cell == OPAQUE {
                    *cell = CLEAR;
                    cleared += 1;
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
                    });
                }
            }
        }

        if let Some((l, t, r, b)) = bounds {
            let changed = DirtyRect {
                x: l,
                y: t,
                width: r - l + 1,
                height: b - t + 1,
            };
            self.dirty = Some(match self.dirty {
                Some(d) => d.union(changed),
                None => changed,
            });
        }

        self.opaque -= cleared;
        Ok(cleared)
    }

    /// Cells changed since the last call
    pub fn take_dirty(&mut self) -> Option<DirtyRect> {
        self.dirty.take()
    }
}

/// Whether the fog layer is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogState {
    /// Feature disabled; nothing drawn, pointer input passes through
    Hidden,
    /// Mask drawn; pointer input erases
    Active,
}

/// Evenly spaced erase points from `from` (exclusive) to `to` (inclusive).
///
/// Empty unless the segment is longer than a quarter of the reveal diameter.
pub fn stroke_points(from: Point, to: Point, reveal_size: f32) -> Vec<Point> {
    let step = reveal_size / 4.0;
    if !step.is_finite() || step <= 0.0 || !from.is_finite() || !to.is_finite() {
        return Vec::new();
    }

    let distance = from.distance(to);
    if distance <= step {
        return Vec::new();
    }

    let steps = (distance / step).ceil() as usize;
    (1..=steps)
        .map(|i| from.lerp(to, i as f32 / steps as f32))
        .collect()
}

/// Fog state machine plus mask
#[derive(Debug, Clone)]
pub struct FogEngine {
    state: FogState,
    mask: FogMask,
    reveal_size: f32,
    last_point: Option<Point>,
    revision: u64,
}

impl FogEngine {
    pub fn new(width: u32, height: u32, reveal_size: f32, enabled: bool) -> Self {
        Self {
            state: if enabled {
                FogState::Active
            } else {
                FogState::Hidden
            },
            mask: FogMask::full(width, height),
            reveal_size,
            last_point: None,
            revision: 0,
        }
    }

    pub fn state(&self) -> FogState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == FogState::Active
    }

    /// Follow the enable-fog setting. Entering `Active` starts from full fog.
    pub fn set_enabled(&mut self, enabled: bool) {
        match (self.state, enabled) {
            (FogState::Hidden, true) => {
                self.state = FogState::Active;
                self.reset();
                tracing::info!("fog of war enabled");
            }
            (FogState::Active, false) => {
                self.state = FogState::Hidden;
                self.last_point = None;
                tracing::info!("fog of war disabled");
            }
            _ => {}
        }
    }

    pub fn reveal_size(&self) -> f32 {
        self.reveal_size
    }

    pub fn set_reveal_size(&mut self, reveal_size: f32) {
        self.reveal_size = reveal_size;
    }

    pub fn mask(&self) -> &FogMask {
        &self.mask
    }

    pub fn size(&self) -> (u32, u32) {
        (self.mask.width(), self.mask.height())
    }

    /// Bumped whenever the whole mask is rebuilt
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn take_dirty(&mut self) -> Option<DirtyRect> {
        self.mask.take_dirty()
    }

    /// Opaque region := the whole window
    pub fn reset(&mut self) {
        self.mask.reset();
        self.last_point = None;
        self.revision += 1;
        tracing::debug!(
            width = self.mask.width(),
            height = self.mask.height(),
            "fog reset"
        );
    }

    /// Adopt new window dimensions and reset
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != self.size() {
            self.mask = FogMask::full(width, height);
        }
        self.reset();
    }

    /// Reveal a disc at `point`. Returns whether any fog was removed.
    pub fn erase(&mut self, point: Point) -> bool {
        if !self.is_active() {
            return false;
        }

        match self.mask.subtract_circle(point, self.reveal_size) {
            Ok(cleared) => cleared > 0,
            Err(e) => {
                tracing::warn!("fog erase failed, resetting mask: {e}");
                self.reset();
                false
            }
        }
    }

    /// Pointer pressed: erase and remember the point
    pub fn begin_stroke(&mut self, point: Point) -> bool {
        if !self.is_active() {
            return false;
        }
        self.last_point = Some(point);
        self.erase(point)
    }

    /// Pointer dragged to `to`. Returns the number of erase calls made.
    pub fn stroke_to(&mut self, to: Point) -> usize {
        if !self.is_active() {
            return 0;
        }
        let Some(from) = self.last_point else {
            return 0;
        };

        let points = stroke_points(from, to, self.reveal_size);
        if points.is_empty() {
            return 0;
        }

        for point in &points {
            self.erase(*point);
        }
        self.last_point = Some(to);
        points.len()
    }

    /// Pointer released
    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }

    pub fn last_point(&self) -> Option<Point> {
        self.last_point
    }
}
