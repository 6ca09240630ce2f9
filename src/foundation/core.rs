use crate::foundation::error::{MathlineError, MathlineResult};

/// Page margins in TeX points, one per edge.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Margins {
    /// Left margin (pt).
    pub left: f64,
    /// Top margin (pt).
    pub top: f64,
    /// Right margin (pt).
    pub right: f64,
    /// Bottom margin (pt).
    pub bottom: f64,
}

impl Margins {
    /// The same margin on all four edges.
    pub fn uniform(pt: f64) -> Self {
        Self {
            left: pt,
            top: pt,
            right: pt,
            bottom: pt,
        }
    }

    /// Return `true` when all four edges carry the same margin.
    pub fn is_uniform(&self) -> bool {
        self.left == self.top && self.top == self.right && self.right == self.bottom
    }

    /// Grow the top and bottom margins by `delta` points each.
    pub fn pad_vertical(self, delta: f64) -> Self {
        Self {
            top: self.top + delta,
            bottom: self.bottom + delta,
            ..self
        }
    }

    /// Reject negative or non-finite margins.
    pub fn validate(&self) -> MathlineResult<()> {
        for (name, v) in [
            ("left", self.left),
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(MathlineError::validation(format!(
                    "{name} margin must be finite and >= 0 (got {v})"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(4.0)
    }
}

/// How margins are configured: one symmetric value or four directional ones.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum MarginSpec {
    /// Same margin on every edge (pt).
    Uniform(f64),
    /// Independent margins per edge (pt).
    Directional(Margins),
}

impl MarginSpec {
    /// Expand into per-edge margins.
    pub fn resolve(self) -> Margins {
        match self {
            Self::Uniform(pt) => Margins::uniform(pt),
            Self::Directional(m) => m,
        }
    }
}

impl Default for MarginSpec {
    fn default() -> Self {
        Self::Uniform(4.0)
    }
}

/// Box metrics reported by the typesetting engine for one rendered page.
///
/// All lengths are TeX points. `snippet_height` is measured above the
/// baseline and `snippet_depth` below it.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    /// Natural width of the formula box.
    pub snippet_width: f64,
    /// Height of the formula box above the baseline.
    pub snippet_height: f64,
    /// Depth of the formula box below the baseline.
    pub snippet_depth: f64,
    /// Margins the page was actually laid out with.
    pub margins: Margins,
}

impl PageMetrics {
    /// Full page width: snippet plus left and right margins.
    pub fn page_width(&self) -> f64 {
        self.snippet_width + self.margins.left + self.margins.right
    }

    /// Full page height: snippet height and depth plus top and bottom margins.
    pub fn page_height(&self) -> f64 {
        self.snippet_height + self.snippet_depth + self.margins.top + self.margins.bottom
    }

    /// Fraction of the uncropped page height lying below the baseline.
    pub fn baseline_fraction_of_page(&self) -> f64 {
        (self.margins.bottom + self.snippet_depth) / self.page_height()
    }

    /// Check the non-negativity and non-degeneracy invariants.
    pub fn validate(&self) -> MathlineResult<()> {
        for (name, v) in [
            ("snippetWidth", self.snippet_width),
            ("snippetHeight", self.snippet_height),
            ("snippetDepth", self.snippet_depth),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(MathlineError::validation(format!(
                    "{name} must be finite and >= 0 (got {v})"
                )));
            }
        }
        self.margins.validate()?;

        let (w, h) = (self.page_width(), self.page_height());
        if w <= 0.0 || h <= 0.0 {
            return Err(MathlineError::validation(format!(
                "degenerate page {w}pt x {h}pt (formula has an empty bounding box)"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
