//! Image gallery for DMTool
//!
//! Decodes images, keeps the ordered collection shown on both windows and
//! decides where each image lands on the overlay.

pub mod collection;
pub mod decode;
pub mod loader;
pub mod placement;

pub use collection::{CollectionEvent, ImageCollection, ImageRecord};
pub use decode::{has_supported_extension, is_supported_image, load_image, DecodedImage};
pub use loader::{ImageLoader, LoadOutcome};
pub use placement::{initial_scale, place_randomly, Placement};

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image has no pixels: {}", .0.display())]
    Empty(PathBuf),

    #[error("Pixel buffer does not match {width}x{height}")]
    BufferSize { width: u32, height: u32 },

    #[error("Image loader stopped")]
    LoaderClosed,
}

pub type GalleryResult<T> = Result<T, GalleryError>;

/// Stable identity of an image record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
