//! Image compositing for blended tiles.
//!
//! [`PngCompositor`] decodes layer PNGs, alpha-blends them bottom to top and
//! re-encodes the result. It also holds the pre-encoded transparent tile
//! served when a layer failure is substituted.

use std::io::Cursor;

use bytes::Bytes;
use image::{imageops, ImageFormat, RgbaImage};
use thiserror::Error;

/// Errors that can occur while compositing layer images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeError {
    /// Layer images do not share the same dimensions.
    #[error("Layer dimensions differ: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// A layer image could not be decoded.
    #[error("Failed to decode layer image: {0}")]
    Decode(String),

    /// The merged image could not be encoded.
    #[error("Failed to encode tile: {0}")]
    Encode(String),

    /// A layer produced data instead of an image.
    #[error("Layer output is not an image")]
    NotAnImage,
}

/// Combines layer images into a single tile.
pub trait ImageCompositor: Send + Sync {
    /// Pre-encoded transparent tile.
    fn blank_tile(&self) -> Bytes;

    /// Merges encoded images, first image at the bottom.
    ///
    /// # Errors
    ///
    /// Returns `CompositeError` if an input cannot be decoded, sizes differ,
    /// or the output cannot be encoded.
    fn merge(&self, layers: &[Bytes]) -> Result<Bytes, CompositeError>;
}

/// Encodes an RGBA image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Bytes, CompositeError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| CompositeError::Encode(e.to_string()))?;
    Ok(Bytes::from(buffer.into_inner()))
}

fn decode_png(bytes: &[u8]) -> Result<RgbaImage, CompositeError> {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map(|image| image.to_rgba8())
        .map_err(|e| CompositeError::Decode(e.to_string()))
}

/// PNG compositor backed by the `image` crate.
#[derive(Debug, Clone)]
pub struct PngCompositor {
    tile_size: u32,
    blank: Bytes,
}

impl PngCompositor {
    /// Creates a compositor for square tiles of `tile_size` pixels.
    ///
    /// # Errors
    ///
    /// Returns `CompositeError::Encode` if the blank tile cannot be encoded.
    pub fn new(tile_size: u32) -> Result<Self, CompositeError> {
        let blank = encode_png(&RgbaImage::new(tile_size, tile_size))?;
        Ok(Self { tile_size, blank })
    }

    /// Tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }
}

impl ImageCompositor for PngCompositor {
    fn blank_tile(&self) -> Bytes {
        self.blank.clone()
    }

    fn merge(&self, layers: &[Bytes]) -> Result<Bytes, CompositeError> {
        match layers {
            [] => return Ok(self.blank_tile()),
            [single] => return Ok(single.clone()),
            _ => {}
        }

        let mut base = decode_png(&layers[0])?;
        for layer in &layers[1..] {
            let top = decode_png(layer)?;
            if top.dimensions() != base.dimensions() {
                return Err(CompositeError::DimensionMismatch {
                    expected: base.dimensions(),
                    actual: top.dimensions(),
                });
            }
            imageops::overlay(&mut base, &top, 0, 0);
        }

        encode_png(&base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(size: u32, color: [u8; 4]) -> Bytes {
        encode_png(&RgbaImage::from_pixel(size, size, Rgba(color))).unwrap()
    }

    #[test]
    fn test_blank_tile_is_transparent() {
        let compositor = PngCompositor::new(256).unwrap();
        let blank = decode_png(&compositor.blank_tile()).unwrap();

        assert_eq!(blank.dimensions(), (256, 256));
        assert!(blank.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_single_layer_returned_unchanged() {
        let compositor = PngCompositor::new(4).unwrap();
        let layer = Bytes::from_static(b"not even a png");
        assert_eq!(compositor.merge(&[layer.clone()]).unwrap(), layer);
    }

    #[test]
    fn test_upper_layer_on_top() {
        let compositor = PngCompositor::new(4).unwrap();
        let merged = compositor
            .merge(&[solid(4, [255, 0, 0, 255]), solid(4, [0, 0, 255, 255])])
            .unwrap();

        let image = decode_png(&merged).unwrap();
        assert_eq!(image.get_pixel(2, 2), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_transparent_layer_keeps_lower() {
        let compositor = PngCompositor::new(4).unwrap();
        let merged = compositor
            .merge(&[solid(4, [255, 0, 0, 255]), solid(4, [0, 0, 0, 0])])
            .unwrap();

        let image = decode_png(&merged).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_dimension_mismatch() {
        let compositor = PngCompositor::new(4).unwrap();
        let err = compositor
            .merge(&[solid(4, [255, 0, 0, 255]), solid(8, [0, 0, 255, 255])])
            .unwrap_err();
        assert_eq!(
            err,
            CompositeError::DimensionMismatch {
                expected: (4, 4),
                actual: (8, 8)
            }
        );
    }

    #[test]
    fn test_undecodable_layer() {
        let compositor = PngCompositor::new(4).unwrap();
        let err = compositor
            .merge(&[solid(4, [255, 0, 0, 255]), Bytes::from_static(b"garbage")])
            .unwrap_err();
        assert!(matches!(err, CompositeError::Decode(_)));
    }
}
