//! Baseline placement on the raster path.
//!
//! The typesetting engine reports where the baseline sits on the full page in points; the raster
//! is then trimmed to its ink. These functions carry the baseline through that trim and split the
//! cropped image into the pixel rows above and below it.

use image::{DynamicImage, RgbaImage};

use crate::foundation::core::PageMetrics;
use crate::foundation::error::{MathlineError, MathlineResult};
use crate::geometry::content_box::{ContentBox, find_content_box, ink_map};

/// Baseline geometry of one cropped formula raster.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    /// Whitespace trimmed from each edge of the page raster.
    pub content_box: ContentBox,
    /// Width of the uncropped page raster.
    pub page_width_px: u32,
    /// Height of the uncropped page raster.
    pub page_height_px: u32,
    /// Width of the cropped image.
    pub cropped_width: u32,
    /// Height of the cropped image.
    pub cropped_height: u32,
    /// Fraction of the cropped height lying below the baseline.
    ///
    /// Negative when all ink sits above the baseline (`-`, `=`, a lone superscript), above one
    /// when it all hangs below.
    pub baseline_fraction: f64,
    /// Rows from the cropped top edge down to the baseline; negative when the baseline lies above
    /// the ink.
    pub top_px: i64,
    /// Rows from the baseline down to the cropped bottom edge; negative when the baseline lies
    /// below the ink.
    pub bottom_px: i64,
}

impl Geometry {
    /// Return `true` when the baseline row lies inside the cropped image (edges included).
    pub fn baseline_within_crop(&self) -> bool {
        self.top_px >= 0 && self.bottom_px >= 0
    }
}

/// Fraction of the *cropped* image height below the baseline.
///
/// The crop follows the ink, not the typeset box, so glyphs that never reach the baseline give
/// values outside `[0, 1]`. Only a non-finite result is an error.
pub fn baseline_fraction(
    metrics: &PageMetrics,
    content: &ContentBox,
    image_height: u32,
) -> MathlineResult<f64> {
    let cropped_height = image_height.saturating_sub(content.top + content.bottom);
    if cropped_height == 0 {
        return Err(MathlineError::empty_content(
            "cropped raster has zero height",
        ));
    }

    let of_page = metrics.baseline_fraction_of_page();
    let top_frac = f64::from(content.top) / f64::from(image_height);
    let bottom_frac = f64::from(content.bottom) / f64::from(image_height);
    let raw = (of_page - bottom_frac) / (1.0 - top_frac - bottom_frac);

    if !raw.is_finite() {
        return Err(MathlineError::validation(format!(
            "metrics/crop mismatch: baseline fraction {raw} is not finite"
        )));
    }
    Ok(raw)
}

/// Split `cropped_height` rows at the baseline, returning `(top_px, bottom_px)`.
///
/// The bottom share is rounded half-up. Either side goes negative when the baseline lies outside
/// the crop; the two always sum to `cropped_height`.
pub fn split_pixels(cropped_height: u32, fraction: f64) -> (i64, i64) {
    let height = i64::from(cropped_height);
    let bottom = (f64::from(cropped_height) * fraction + 0.5).floor() as i64;
    (height - bottom, bottom)
}

/// Trim `page` to its ink and locate the baseline relative to the trimmed image.
#[tracing::instrument(skip(metrics, page), fields(w = page.width(), h = page.height()))]
pub fn compute_geometry(
    metrics: &PageMetrics,
    page: &DynamicImage,
) -> MathlineResult<(Geometry, RgbaImage)> {
    let (w, h) = (page.width(), page.height());
    let content_box = find_content_box(&ink_map(page))?;
    let fraction = baseline_fraction(metrics, &content_box, h)?;

    let (cw, ch) = content_box.cropped_size(w, h);
    let (top_px, bottom_px) = split_pixels(ch, fraction);

    // Metrics that agree with the page always put the baseline on it.
    let page_row = i64::from(content_box.top) + top_px;
    if !(0..=i64::from(h)).contains(&page_row) {
        return Err(MathlineError::validation(format!(
            "metrics/crop mismatch: baseline row {page_row} lies off the {w}x{h} page"
        )));
    }

    let rgba = page.to_rgba8();
    let cropped = image::imageops::crop_imm(&rgba, content_box.left, content_box.top, cw, ch)
        .to_image();

    let geometry = Geometry {
        content_box,
        page_width_px: w,
        page_height_px: h,
        cropped_width: cw,
        cropped_height: ch,
        baseline_fraction: fraction,
        top_px,
        bottom_px,
    };
    tracing::debug!(?geometry, "baseline geometry");
    Ok((geometry, cropped))
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/baseline.rs"]
mod tests;
