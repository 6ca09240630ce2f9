//! Integer-pixel page height for vector output.
//!
//! Consumers that rasterize the SVG on integer pixel boundaries show a seam when the page height
//! is fractional. The page is re-typeset once with the top and bottom margins grown by half the
//! shortfall. One pass is not guaranteed to land exactly on an integer (engine rounding can leave
//! a sub-pixel residue); the residue is reported, not iterated away.

use crate::foundation::core::{Margins, PageMetrics};
use crate::foundation::error::{MathlineError, MathlineResult};

/// Heights closer than this to an integer count as integral.
pub const INTEGRAL_EPSILON: f64 = 1e-4;

/// Distance from `height_px` up to the next integer, zero when already integral.
pub fn residue(height_px: f64) -> f64 {
    if (height_px - height_px.round()).abs() < INTEGRAL_EPSILON {
        0.0
    } else {
        height_px.ceil() - height_px
    }
}

/// Margins that round the page up to a whole number of pixels, or `None` when no correction is
/// needed.
///
/// `height_px` is the realized vector height for a page laid out with `metrics`; the point to
/// pixel scale is taken from their ratio.
pub fn corrected_margins(metrics: &PageMetrics, height_px: f64) -> MathlineResult<Option<Margins>> {
    let page_pt = metrics.page_height();
    if !height_px.is_finite() || height_px <= 0.0 || page_pt <= 0.0 {
        return Err(MathlineError::validation(format!(
            "cannot correct page height {height_px}px for a {page_pt}pt page"
        )));
    }

    let shortfall_px = residue(height_px);
    if shortfall_px == 0.0 {
        return Ok(None);
    }
    let px_per_pt = height_px / page_pt;
    let delta_pt = shortfall_px / 2.0 / px_per_pt;
    Ok(Some(metrics.margins.pad_vertical(delta_pt)))
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/page_height.rs"]
mod tests;
