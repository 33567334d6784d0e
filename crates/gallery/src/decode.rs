//! Image decoding

use crate::{GalleryError, GalleryResult};
use image::imageops::FilterType;
use std::path::Path;

/// Extensions accepted for ingestion, compared case-insensitively
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

/// Decoded RGBA8 bitmap. Never modified after decoding.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl DecodedImage {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> GalleryResult<Self> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(GalleryError::BufferSize { width, height });
        }
        Ok(Self { width, height, rgba })
    }

    pub fn long_edge(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Copy shrunk so the long edge is at most `max_side`, or `None` when the
    /// image already fits. Used for GPU textures, which have a size limit.
    pub fn fit_within(&self, max_side: u32) -> Option<DecodedImage> {
        if max_side == 0 || self.long_edge() <= max_side {
            return None;
        }

        let factor = max_side as f64 / self.long_edge() as f64;
        let width = ((self.width as f64 * factor).round() as u32).clamp(1, max_side);
        let height = ((self.height as f64 * factor).round() as u32).clamp(1, max_side);

        let source = image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone())?;
        let resized = image::imageops::resize(&source, width, height, FilterType::Triangle);
        tracing::debug!(from = ?(self.width, self.height), to = ?(width, height), "downscaled texture");

        Some(DecodedImage {
            width,
            height,
            rgba: resized.into_raw(),
        })
    }
}

/// Whether `path` ends in one of the supported extensions
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Whether `path` is an existing file with a supported extension
pub fn is_supported_image(path: &Path) -> bool {
    path.is_file() && has_supported_extension(path)
}

/// Decode the file at `path` into RGBA8. The format is taken from the file
/// contents, so any format the codec knows is accepted whatever the name.
pub fn load_image(path: &Path) -> GalleryResult<DecodedImage> {
    let rgba = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(GalleryError::Empty(path.to_path_buf()));
    }

    tracing::debug!(path = %path.display(), width, height, "decoded image");
    DecodedImage::from_rgba(width, height, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn extensions_are_case_insensitive() {
        assert!(has_supported_extension(Path::new("map.PNG")));
        assert!(has_supported_extension(Path::new("dungeon.JpEg")));
        assert!(has_supported_extension(Path::new("a/b/c.gif")));
        assert!(!has_supported_extension(Path::new("notes.txt")));
        assert!(!has_supported_extension(Path::new("no_extension")));
        assert!(!is_supported_image(Path::new("/definitely/missing/map.png")));
    }

    #[test]
    fn decodes_png_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.png");
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(2, 1, Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        assert!(is_supported_image(&path));
        let decoded = load_image(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.long_edge(), 3);
        assert_eq!(&decoded.rgba[20..24], &[10, 20, 30, 255]);
    }

    #[test]
    fn corrupt_and_unreadable_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("broken.jpg");
        std::fs::write(&bad, b"not really a jpeg").unwrap();
        assert!(matches!(load_image(&bad), Err(GalleryError::Image(_))));

        let text = dir.path().join("readme.txt");
        std::fs::write(&text, b"hello").unwrap();
        assert!(matches!(load_image(&text), Err(GalleryError::Image(_))));

        let missing = dir.path().join("missing.png");
        assert!(matches!(load_image(&missing), Err(GalleryError::Io(_))));
    }

    #[test]
    fn format_comes_from_contents_not_name() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("token.png");
        RgbaImage::new(5, 4).save(&png).unwrap();
        let renamed = dir.path().join("token.dat");
        std::fs::rename(&png, &renamed).unwrap();

        assert!(!has_supported_extension(&renamed));
        let decoded = load_image(&renamed).unwrap();
        assert_eq!((decoded.width, decoded.height), (5, 4));
    }

    #[test]
    fn oversized_bitmaps_are_shrunk_for_textures() {
        let image = DecodedImage::from_rgba(400, 100, vec![255; 400 * 100 * 4]).unwrap();
        assert!(image.fit_within(400).is_none());

        let small = image.fit_within(200).unwrap();
        assert_eq!((small.width, small.height), (200, 50));
        assert_eq!(small.rgba.len(), 200 * 50 * 4);
        assert!(small.rgba.iter().all(|&b| b == 255));
    }

    #[test]
    fn buffer_must_match_dimensions() {
        assert!(DecodedImage::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            DecodedImage::from_rgba(2, 2, vec![0; 15]),
            Err(GalleryError::BufferSize { width: 2, height: 2 })
        ));
    }
}
