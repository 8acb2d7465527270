//! Decode uploaded bytes into an in-memory raster.
//!
//! The container format is sniffed from the magic bytes, so the object name's
//! extension plays no part. PNG, JPEG, BMP, GIF, TIFF and WebP are
//! recognised; anything else is a decode error.

use crate::error::ResizeError;
use crate::output::Dimensions;
use image::DynamicImage;
use tracing::debug;

/// Decode `bytes` as an image. `name` is only used for error context.
pub fn decode(name: &str, bytes: &[u8]) -> Result<DynamicImage, ResizeError> {
    let img = image::load_from_memory(bytes).map_err(|source| ResizeError::Decode {
        name: name.to_string(),
        source,
    })?;
    debug!(
        "Decoded '{}' → {}x{} px ({:?})",
        name,
        img.width(),
        img.height(),
        img.color()
    );
    Ok(img)
}

/// Pixel dimensions of a decoded raster.
pub fn dimensions(img: &DynamicImage) -> Dimensions {
    Dimensions::new(img.width(), img.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 20, 30])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_png() {
        let img = decode("a.png", &png_bytes(40, 30)).expect("valid png");
        assert_eq!(dimensions(&img), Dimensions::new(40, 30));
    }

    fn encoded(w: u32, h: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([x as u8, y as u8, 90])
        }));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn decodes_bmp_gif_and_tiff() {
        for format in [ImageFormat::Bmp, ImageFormat::Gif, ImageFormat::Tiff] {
            let img = decode("upload", &encoded(24, 16, format))
                .unwrap_or_else(|e| panic!("{format:?}: {e}"));
            assert_eq!(dimensions(&img), Dimensions::new(24, 16), "{format:?}");
        }
    }

    #[test]
    fn decodes_regardless_of_extension() {
        let img = decode("misnamed.jpg", &png_bytes(3, 2)).expect("sniffed as png");
        assert_eq!(img.width(), 3);
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = decode("junk.bin", b"definitely not an image").unwrap_err();
        assert!(matches!(err, ResizeError::Decode { ref name, .. } if name == "junk.bin"));
    }

    #[test]
    fn empty_is_decode_error() {
        assert!(matches!(
            decode("empty", &[]),
            Err(ResizeError::Decode { .. })
        ));
    }
}
