//! Proportional downscaling into a square bounding box.
//!
//! The scale factor is `min(target / width, target / height)`. Both ratios
//! use the same target, so the result fits a `target × target` square rather
//! than only bounding the width. Images smaller than the box are scaled *up*
//! by the same rule.
//!
//! `min(t / w, t / h)` equals `t / max(w, h)`, so [`Scale`] is kept as an
//! exact fraction and target sizes are floored with integer arithmetic.
//! Float evaluation of `w * (t / w)` can land a hair below `t` and floor to
//! `t - 1`.

use crate::error::ResizeError;
use crate::output::Dimensions;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Resampling kernel. Triangle is bilinear interpolation.
pub const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// An exact scale factor `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    pub numerator: u32,
    pub denominator: u32,
}

impl Scale {
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// `floor(len * self)`.
    fn apply(&self, len: u32) -> u32 {
        // u64 cannot overflow for u32 operands.
        let scaled = u64::from(len) * u64::from(self.numerator) / u64::from(self.denominator);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }
}

/// Scale factor that fits `original` into a `target_width` square.
pub fn compute_scale(original: Dimensions, target_width: u32) -> Result<Scale, ResizeError> {
    if original.width == 0 || original.height == 0 || target_width == 0 {
        return Err(ResizeError::InvalidDimensions {
            width: original.width,
            height: original.height,
            target_width: 0,
            target_height: 0,
        });
    }
    Ok(Scale {
        numerator: target_width,
        denominator: original.width.max(original.height),
    })
}

/// Floor each side of `original` multiplied by `scale`.
///
/// Fails when either side floors to zero, e.g. a 1×100000 strip.
pub fn target_dimensions(original: Dimensions, scale: Scale) -> Result<Dimensions, ResizeError> {
    let target = Dimensions::new(scale.apply(original.width), scale.apply(original.height));
    if target.width == 0 || target.height == 0 {
        return Err(ResizeError::InvalidDimensions {
            width: original.width,
            height: original.height,
            target_width: target.width,
            target_height: target.height,
        });
    }
    Ok(target)
}

/// Resample `img` to exactly `target`.
pub fn resample(img: &DynamicImage, target: Dimensions) -> DynamicImage {
    if img.width() < target.width || img.height() < target.height {
        debug!(
            "Upscaling {}x{} → {} (source fits inside the box)",
            img.width(),
            img.height(),
            target
        );
    }
    img.resize_exact(target.width, target.height, RESAMPLE_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn dims(w: u32, h: u32) -> Dimensions {
        Dimensions::new(w, h)
    }

    fn target(w: u32, h: u32, t: u32) -> Dimensions {
        let scale = compute_scale(dims(w, h), t).unwrap();
        target_dimensions(dims(w, h), scale).unwrap()
    }

    #[test]
    fn landscape_4000x3000() {
        let scale = compute_scale(dims(4000, 3000), 500).unwrap();
        assert_eq!(scale.as_f64(), 0.125);
        assert_eq!(target(4000, 3000, 500), dims(500, 375));
    }

    #[test]
    fn tall_narrow_100x8000() {
        let scale = compute_scale(dims(100, 8000), 500).unwrap();
        assert_eq!(scale.as_f64(), 0.0625);
        assert_eq!(target(100, 8000, 500), dims(6, 500));
    }

    #[test]
    fn limiting_side_lands_exactly_on_target() {
        for &(w, h) in &[(3000, 7), (1234, 999), (7, 3001), (4999, 4999), (333, 1)] {
            let t = target(w, h, 500);
            assert_eq!(t.width.max(t.height), 500, "{w}x{h} → {t}");
        }
    }

    #[test]
    fn matches_float_formula_where_float_is_exact() {
        for &(w, h) in &[(4000u32, 3000u32), (1024, 768), (2000, 8000), (640, 480)] {
            let s = (500.0 / w as f64).min(500.0 / h as f64);
            let expected = dims((w as f64 * s).floor() as u32, (h as f64 * s).floor() as u32);
            assert_eq!(target(w, h, 500), expected);
        }
    }

    #[test]
    fn small_images_scale_up() {
        assert_eq!(target(100, 50, 500), dims(500, 250));
    }

    #[test]
    fn zero_sized_original_is_invalid() {
        assert!(matches!(
            compute_scale(dims(0, 100), 500),
            Err(ResizeError::InvalidDimensions { .. })
        ));
        assert!(compute_scale(dims(0, 0), 500).is_err());
    }

    #[test]
    fn side_flooring_to_zero_is_invalid() {
        let scale = compute_scale(dims(1, 100_000), 500).unwrap();
        let err = target_dimensions(dims(1, 100_000), scale).unwrap_err();
        assert!(matches!(
            err,
            ResizeError::InvalidDimensions {
                target_width: 0,
                target_height: 500,
                ..
            }
        ));
    }

    #[test]
    fn resample_produces_exact_size() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(80, 60, Rgba([1, 2, 3, 255])));
        let out = resample(&img, dims(20, 15));
        assert_eq!((out.width(), out.height()), (20, 15));
    }
}
