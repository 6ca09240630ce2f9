use crate::foundation::error::{MathlineError, MathlineResult};

/// Converts raster pixels (or page points) into font-relative `em` lengths.
///
/// One em is `density / 8` pixels at `factor == 1`, i.e. 9pt of typeset page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmScale {
    density: u32,
    factor: f64,
}

impl EmScale {
    /// Scale for rasters produced at `density` pixels per inch, sized up by `factor`.
    pub fn new(density: u32, factor: f64) -> MathlineResult<Self> {
        if density == 0 {
            return Err(MathlineError::validation("density must be non-zero"));
        }
        if !factor.is_finite() || factor <= 0.0 {
            return Err(MathlineError::validation(format!(
                "factor must be finite and > 0 (got {factor})"
            )));
        }
        Ok(Self { density, factor })
    }

    /// Rasterization density in pixels per inch.
    pub fn density(&self) -> u32 {
        self.density
    }

    /// `pixels * 8 * factor / density`.
    pub fn px(&self, pixels: u32) -> f64 {
        f64::from(pixels) * 8.0 * self.factor / f64::from(self.density)
    }

    /// Em length of `points` of typeset page (independent of density).
    pub fn pt(&self, points: f64) -> f64 {
        points * 8.0 * self.factor / 72.0
    }

    /// Inverse of [`EmScale::px`], not rounded.
    pub fn to_px(&self, em: f64) -> f64 {
        em * f64::from(self.density) / (8.0 * self.factor)
    }
}

/// Round an em value to 4 decimal places for emitted styles.
pub fn round_em(v: f64) -> f64 {
    let r = (v * 10_000.0).round() / 10_000.0;
    // Avoid emitting "-0".
    if r == 0.0 { 0.0 } else { r }
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/em.rs"]
mod tests;
