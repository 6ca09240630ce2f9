//! Crop strategies turning a baseline-split raster into placeable images.

use image::RgbaImage;

use crate::assemble::em::EmScale;
use crate::assemble::html::Placement;
use crate::foundation::error::{MathlineError, MathlineResult};
use crate::geometry::baseline::Geometry;

/// How the cropped raster is packaged for inline placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStrategy {
    /// One image, offset by the baseline fraction of its height.
    Single,
    /// Two images cut at the baseline row. Fragile under reflow; kept for compatibility.
    Split,
    /// One image padded so the baseline sits exactly at its vertical center.
    #[default]
    Symmetric,
}

/// Images produced by a [`CropStrategy`].
#[derive(Clone, Debug)]
pub enum RasterImages {
    /// The cropped image as-is.
    Single(RgbaImage),
    /// The rows above and below the baseline.
    Split {
        /// Rows above the baseline.
        top: RgbaImage,
        /// Rows below the baseline.
        bottom: RgbaImage,
    },
    /// The cropped image padded to equal heights above and below the baseline.
    Symmetric(RgbaImage),
}

impl RasterImages {
    /// All images in emission order (top before bottom for split output).
    pub fn images(&self) -> Vec<&RgbaImage> {
        match self {
            Self::Single(img) | Self::Symmetric(img) => vec![img],
            Self::Split { top, bottom } => vec![top, bottom],
        }
    }
}

/// Package `cropped` according to `strategy` and compute its placement.
///
/// Split output needs the baseline inside the image; the other strategies accept a baseline
/// anywhere on the page.
pub fn assemble(
    cropped: &RgbaImage,
    geometry: &Geometry,
    strategy: CropStrategy,
    em: &EmScale,
) -> MathlineResult<(RasterImages, Placement)> {
    let width_em = em.px(geometry.cropped_width);
    Ok(match strategy {
        CropStrategy::Single => {
            let height_em = em.px(geometry.cropped_height);
            (
                RasterImages::Single(cropped.clone()),
                Placement::Single {
                    width_em,
                    height_em,
                    vertical_align_em: -geometry.baseline_fraction * height_em,
                },
            )
        }
        CropStrategy::Split => {
            let (Ok(top_px), Ok(bottom_px)) = (
                u32::try_from(geometry.top_px),
                u32::try_from(geometry.bottom_px),
            ) else {
                return Err(MathlineError::validation(format!(
                    "split output needs the baseline inside the image (top {}px, bottom {}px)",
                    geometry.top_px, geometry.bottom_px
                )));
            };
            let (top, bottom) = split_at_baseline(cropped, top_px);
            (
                RasterImages::Split { top, bottom },
                Placement::Split {
                    width_em,
                    top_height_em: em.px(top_px),
                    bottom_height_em: em.px(bottom_px),
                },
            )
        }
        CropStrategy::Symmetric => {
            let half = symmetric_half(geometry.top_px, geometry.bottom_px)?;
            (
                RasterImages::Symmetric(pad_symmetric(cropped, geometry.top_px, half)),
                Placement::Symmetric {
                    width_em,
                    height_em: em.px(2 * half),
                    vertical_align_em: -em.px(half),
                },
            )
        }
    })
}

/// Cut `img` at row `top_px`.
///
/// An empty half is returned as a single transparent row so it stays encodable; its placement
/// height is still zero.
pub fn split_at_baseline(img: &RgbaImage, top_px: u32) -> (RgbaImage, RgbaImage) {
    let (w, h) = img.dimensions();
    let top_px = top_px.min(h);
    let slice = |y: u32, rows: u32| {
        if rows == 0 {
            RgbaImage::new(w, 1)
        } else {
            image::imageops::crop_imm(img, 0, y, w, rows).to_image()
        }
    };
    (slice(0, top_px), slice(top_px, h - top_px))
}

/// Half-height of the symmetric image: `max(|top_px|, |bottom_px|)`.
pub fn symmetric_half(top_px: i64, bottom_px: i64) -> MathlineResult<u32> {
    let half = top_px.unsigned_abs().max(bottom_px.unsigned_abs());
    u32::try_from(half)
        .ok()
        .filter(|h| h.checked_mul(2).is_some())
        .ok_or_else(|| {
            MathlineError::validation(format!("symmetric image half-height {half}px is too large"))
        })
}

/// Place `img` on a transparent canvas `2 * half` rows tall so the baseline, `top_px` rows below
/// the image's top edge, lands on row `half`.
///
/// `top_px` may be negative or exceed the image height when the ink does not reach the baseline.
pub fn pad_symmetric(img: &RgbaImage, top_px: i64, half: u32) -> RgbaImage {
    let mut out = RgbaImage::new(img.width(), 2 * half);
    image::imageops::replace(&mut out, img, 0, i64::from(half) - top_px);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/strategy.rs"]
mod tests;
