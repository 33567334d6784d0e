//! Fog texture rendering
//!
//! Turns the fog mask into RGBA pixel data for the GPU texture, uploading
//! only the cells that changed since the previous frame.

use crate::fog::{DirtyRect, FogEngine, FogMask};

/// Colour of fogged cells (premultiplied, fully opaque black)
pub const FOG_COLOR: [u8; 4] = [0, 0, 0, 255];

const REVEALED: [u8; 4] = [0, 0, 0, 0];

/// RGBA pixels for a rectangle of the mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FogPatch {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl FogPatch {
    /// Extract `rect` from `mask`
    pub fn from_mask(mask: &FogMask, rect: DirtyRect) -> Self {
        let mut rgba = Vec::with_capacity(rect.width as usize * rect.height as usize * 4);
        let cells = mask.cells();
        let stride = mask.width() as usize;

        for y in rect.y..rect.y + rect.height {
            let row = y as usize * stride;
            let start = row + rect.x as usize;
            let end = start + rect.width as usize;
            for &cell in &cells[start..end] {
                let pixel = if cell > 0 { FOG_COLOR } else { REVEALED };
                rgba.extend_from_slice(&pixel);
            }
        }

        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            rgba,
        }
    }

    /// The whole mask
    pub fn full(mask: &FogMask) -> Self {
        Self::from_mask(
            mask,
            DirtyRect {
                x: 0,
                y: 0,
                width: mask.width(),
                height: mask.height(),
            },
        )
    }
}

/// What the texture needs this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FogUpload {
    /// Recreate the texture from scratch
    Full(FogPatch),
    /// Overwrite part of the existing texture
    Partial(FogPatch),
}

/// Tracks which mask revision the GPU texture holds
#[derive(Debug, Default)]
pub struct FogTextureSync {
    uploaded: Option<(u64, u32, u32)>,
}

impl FogTextureSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the uploaded state, e.g. after the texture was dropped
    pub fn invalidate(&mut self) {
        self.uploaded = None;
    }

    /// Drain the mask's dirty state into an upload, if anything changed.
    pub fn sync(&mut self, fog: &mut FogEngine) -> Option<FogUpload> {
        let (width, height) = fog.size();
        let dirty = fog.take_dirty();

        if width == 0 || height == 0 {
            self.uploaded = None;
            return None;
        }

        let current = (fog.revision(), width, height);
        if self.uploaded != Some(current) {
            self.uploaded = Some(current);
            tracing::debug!(width, height, revision = current.0, "full fog upload");
            return Some(FogUpload::Full(FogPatch::full(fog.mask())));
        }

        dirty.map(|rect| FogUpload::Partial(FogPatch::from_mask(fog.mask(), rect)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;

    #[test]
    fn first_sync_is_full_then_partial() {
        let mut fog = FogEngine::new(64, 32, 8.0, true);
        let mut sync = FogTextureSync::new();

        match sync.sync(&mut fog) {
            Some(FogUpload::Full(patch)) => {
                assert_eq!((patch.width, patch.height), (64, 32));
                assert_eq!(patch.rgba.len(), 64 * 32 * 4);
                assert!(patch.rgba.chunks(4).all(|p| p == FOG_COLOR));
            }
            other => panic!("expected full upload, got {other:?}"),
        }
        assert_eq!(sync.sync(&mut fog), None);

        fog.erase(Point::new(10.0, 10.0));
        match sync.sync(&mut fog) {
            Some(FogUpload::Partial(patch)) => {
                assert_eq!((patch.x, patch.y, patch.width, patch.height), (6, 6, 8, 8));
                assert_eq!(patch.rgba.len(), 8 * 8 * 4);
                // Centre of the disc is revealed, patch corner is not
                let centre = ((4 * 8 + 4) * 4) as usize;
                assert_eq!(&patch.rgba[centre..centre + 4], &REVEALED);
                assert_eq!(&patch.rgba[0..4], &FOG_COLOR);
            }
            other => panic!("expected partial upload, got {other:?}"),
        }
    }

    #[test]
    fn reset_and_resize_force_full_upload() {
        let mut fog = FogEngine::new(16, 16, 4.0, true);
        let mut sync = FogTextureSync::new();
        sync.sync(&mut fog);

        fog.reset();
        assert!(matches!(sync.sync(&mut fog), Some(FogUpload::Full(_))));

        fog.resize(8, 4);
        match sync.sync(&mut fog) {
            Some(FogUpload::Full(patch)) => assert_eq!((patch.width, patch.height), (8, 4)),
            other => panic!("expected full upload, got {other:?}"),
        }

        sync.invalidate();
        assert!(matches!(sync.sync(&mut fog), Some(FogUpload::Full(_))));
    }

    #[test]
    fn empty_mask_uploads_nothing() {
        let mut fog = FogEngine::new(0, 0, 4.0, true);
        let mut sync = FogTextureSync::new();
        assert_eq!(sync.sync(&mut fog), None);
    }
}
