//! Random image placement
//!
//! Scales an image to the configured size, tilts it slightly (upright or
//! upside down) and drops it at a random spot that keeps the rotated image
//! on the display. Positions are the rotation anchor: the top-left corner of
//! the unrotated, scaled image.

use rand::Rng;

/// Fraction of the available space an image may fill
pub const FILL_FACTOR: f32 = 0.95;

/// Above this share of the display an image is shown straight and edge to edge
pub const FULL_SIZE_RATIO: f32 = 0.8;

/// Minimum distance from the display edge, logical units
pub const BASE_MARGIN: f32 = 20.0;

/// Maximum random tilt either way, degrees
pub const MAX_TILT: f32 = 10.0;

/// Long edge after an emergency rescale, as a share of the smaller display side
pub const EMERGENCY_FILL: f32 = 0.7;

/// Where and how an image is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    /// Degrees in [0, 360)
    pub rotation: f32,
    pub x: f32,
    pub y: f32,
    /// Edge margin the position range was computed with
    pub margin: f32,
}

/// Scale that brings the long edge to `max_size`
pub fn initial_scale(max_size: f32, width: u32, height: u32) -> f32 {
    let long_edge = width.max(height);
    if long_edge == 0 || !max_size.is_finite() || max_size <= 0.0 {
        return 1.0;
    }
    max_size / long_edge as f32
}

/// Axis-aligned bounds `(min_x, min_y, max_x, max_y)` of the image after
/// rotation about its anchor.
#[cfg(test)]
fn rotated_bounds(placement: &Placement, width: u32, height: u32) -> (f32, f32, f32, f32) {
    let w = width as f32 * placement.scale;
    let h = height as f32 * placement.scale;
    let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];

    let mut bounds = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
    for (cx, cy) in corners {
        let (rx, ry) = rotate(cx, cy, placement.rotation);
        let (x, y) = (placement.x + rx, placement.y + ry);
        bounds.0 = bounds.0.min(x);
        bounds.1 = bounds.1.min(y);
        bounds.2 = bounds.2.max(x);
        bounds.3 = bounds.3.max(y);
    }
    bounds
}

fn rotate(x: f32, y: f32, degrees: f32) -> (f32, f32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Scaled geometry of the image for one scale factor
struct Footprint {
    width: f32,
    height: f32,
    margin: f32,
}

impl Footprint {
    fn new(width: u32, height: u32, scale: f32, rotation: f32, upright: bool) -> Self {
        let w = width as f32 * scale;
        let h = height as f32 * scale;
        let margin = if upright {
            0.0
        } else {
            let diagonal = w.hypot(h);
            let half_long = w.max(h) / 2.0;
            BASE_MARGIN + (diagonal - half_long) * rotation.to_radians().sin().abs()
        };
        Self {
            width: w,
            height: h,
            margin,
        }
    }

    /// Anchor range on one axis; near 180 degrees the image hangs to the
    /// left of / above its anchor.
    fn range(&self, extent: f32, display: f32, flipped: bool) -> (f32, f32) {
        if flipped {
            (extent + self.margin, display - self.margin)
        } else {
            (self.margin, display - extent - self.margin)
        }
    }
}

/// Compute scale, rotation and a random position for a `width` x `height`
/// image on a display of `display_size` logical units.
pub fn place_randomly<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    display_size: (f32, f32),
    max_size: f32,
    rng: &mut R,
) -> Placement {
    let (dw, dh) = display_size;
    if width == 0 || height == 0 || !(dw > 0.0 && dh > 0.0 && dw.is_finite() && dh.is_finite()) {
        tracing::warn!(width, height, dw, dh, "cannot place image, using origin");
        return Placement {
            scale: initial_scale(max_size, width, height),
            rotation: 0.0,
            x: 0.0,
            y: 0.0,
            margin: 0.0,
        };
    }

    let long_edge = width.max(height) as f32;
    let mut scale = (max_size / long_edge)
        .min(dw / width as f32)
        .min(dh / height as f32)
        * FILL_FACTOR;
    if !scale.is_finite() || scale <= 0.0 {
        scale = (dw / width as f32).min(dh / height as f32) * FILL_FACTOR;
    }

    let size_ratio = (width as f32 * scale / dw).max(height as f32 * scale / dh);
    let upright = size_ratio > FULL_SIZE_RATIO;

    let rotation = if upright {
        0.0
    } else {
        let base = if rng.gen_bool(0.5) { 0.0 } else { 180.0 };
        let degrees = (base + rng.gen_range(-MAX_TILT..=MAX_TILT)).rem_euclid(360.0);
        // rem_euclid can round up to the modulus for tiny negative inputs
        if degrees >= 360.0 {
            0.0
        } else {
            degrees
        }
    };
    let flipped = rotation > 90.0 && rotation < 270.0;

    let mut footprint = Footprint::new(width, height, scale, rotation, upright);
    let mut x_range = footprint.range(footprint.width, dw, flipped);
    let mut y_range = footprint.range(footprint.height, dh, flipped);

    if x_range.0 > x_range.1 || y_range.0 > y_range.1 {
        let smaller = dw.min(dh);
        let diagonal = footprint.width.hypot(footprint.height);
        if diagonal > smaller {
            let shrunk = EMERGENCY_FILL * smaller / long_edge;
            if shrunk < scale {
                tracing::debug!(scale, shrunk, "image too large for display, shrinking");
                scale = shrunk;
                footprint = Footprint::new(width, height, scale, rotation, upright);
                x_range = footprint.range(footprint.width, dw, flipped);
                y_range = footprint.range(footprint.height, dh, flipped);
            }
        }
    }

    // Anchor that puts the rotated image's centre on the display centre
    let (cx, cy) = rotate(footprint.width / 2.0, footprint.height / 2.0, rotation);
    let x = pick(rng, x_range, dw / 2.0 - cx);
    let y = pick(rng, y_range, dh / 2.0 - cy);

    Placement {
        scale,
        rotation,
        x,
        y,
        margin: footprint.margin,
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f32, f32), centred: f32) -> f32 {
    if lo > hi {
        centred
    } else if lo == hi {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}
