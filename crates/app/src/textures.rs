//! GPU textures for images and the fog layer

use eframe::egui;
use gallery::{ImageId, ImageRecord};
use overlay::{FogEngine, FogPatch, FogTextureSync, FogUpload};
use std::collections::HashMap;

/// Texture handles keyed by image, plus the fog texture.
///
/// Handles are shared by both viewports; dropping one frees the texture.
#[derive(Default)]
pub struct TextureCache {
    images: HashMap<ImageId, egui::TextureHandle>,
    fog: Option<egui::TextureHandle>,
    fog_sync: FogTextureSync,
}

fn color_image(width: u32, height: u32, rgba: &[u8]) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied([width as usize, height as usize], rgba)
}

fn patch_image(patch: &FogPatch) -> egui::ColorImage {
    egui::ColorImage::from_rgba_premultiplied(
        [patch.width as usize, patch.height as usize],
        &patch.rgba,
    )
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture for `record`, uploaded on first use
    pub fn image(&mut self, ctx: &egui::Context, record: &ImageRecord) -> egui::TextureId {
        let handle = self.images.entry(record.id()).or_insert_with(|| {
            let bitmap = record.bitmap();
            let max_side = ctx.input(|i| i.max_texture_side) as u32;
            let image = match bitmap.fit_within(max_side) {
                Some(small) => color_image(small.width, small.height, &small.rgba),
                None => color_image(bitmap.width, bitmap.height, &bitmap.rgba),
            };
            tracing::debug!(name = %record.file_name(), "uploading image texture");
            ctx.load_texture(
                format!("image-{}", record.id()),
                image,
                egui::TextureOptions::LINEAR,
            )
        });
        handle.id()
    }

    pub fn evict(&mut self, ids: impl IntoIterator<Item = ImageId>) {
        for id in ids {
            if self.images.remove(&id).is_some() {
                tracing::debug!(%id, "released image texture");
            }
        }
    }

    /// Bring the fog texture up to date and return it
    pub fn fog(&mut self, ctx: &egui::Context, fog: &mut FogEngine) -> Option<egui::TextureId> {
        match self.fog_sync.sync(fog) {
            Some(FogUpload::Full(patch)) => {
                self.fog = Some(ctx.load_texture(
                    "fog-of-war",
                    patch_image(&patch),
                    egui::TextureOptions::NEAREST,
                ));
            }
            Some(FogUpload::Partial(patch)) => match self.fog.as_mut() {
                Some(handle) => handle.set_partial(
                    [patch.x as usize, patch.y as usize],
                    patch_image(&patch),
                    egui::TextureOptions::NEAREST,
                ),
                None => self.fog_sync.invalidate(),
            },
            None => {}
        }

        let (width, height) = fog.size();
        if width == 0 || height == 0 {
            self.fog = None;
        }
        self.fog.as_ref().map(|handle| handle.id())
    }
}
