use std::time::Duration;

use crate::assemble::strategy::CropStrategy;
use crate::foundation::core::MarginSpec;
use crate::foundation::error::{MathlineError, MathlineResult};

/// What a render call produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// One cropped raster.
    Single,
    /// Two rasters cut at the baseline.
    Split,
    /// One raster padded symmetrically around the baseline.
    #[default]
    Symmetric,
    /// SVG markup of the full page.
    Vector,
}

impl OutputKind {
    /// Crop strategy for raster outputs, `None` for vector output.
    pub fn crop_strategy(self) -> Option<CropStrategy> {
        match self {
            Self::Single => Some(CropStrategy::Single),
            Self::Split => Some(CropStrategy::Split),
            Self::Symmetric => Some(CropStrategy::Symmetric),
            Self::Vector => None,
        }
    }
}

/// Which rasterizer backs raster outputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterBackend {
    /// ImageMagick `convert` on the PDF page.
    #[default]
    Magick,
    /// Vectorize, then render the SVG in-process with resvg.
    Resvg,
}

/// Program names (or paths) of the external toolchain.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Typesetting engine.
    pub latex: String,
    /// ImageMagick rasterizer.
    pub convert: String,
    /// PDF to SVG vectorizer.
    pub dvisvgm: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            latex: "pdflatex".to_string(),
            convert: "convert".to_string(),
            dvisvgm: "dvisvgm".to_string(),
        }
    }
}

/// Options for one render call.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOpts {
    /// Rasterization density in pixels per inch.
    pub density: u32,
    /// Font-size multiplier applied to every emitted em length.
    pub factor: f64,
    /// Limit on each external tool invocation.
    #[serde(with = "duration_secs")]
    pub process_timeout: Duration,
    /// Page margins around the formula.
    pub margin: MarginSpec,
    /// Output kind (raster strategy or vector).
    pub output: OutputKind,
    /// CSS class for emitted markup.
    pub class_name: Option<String>,
    /// Append the static object-fit style to symmetric images.
    pub include_static_style: bool,
    /// Rasterizer for raster outputs.
    pub rasterizer: RasterBackend,
    /// Re-typeset vector pages once so their pixel height is integral.
    pub correct_page_height: bool,
    /// External tool names.
    pub tools: ToolPaths,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            density: 512,
            factor: 1.0,
            process_timeout: Duration::from_secs(2),
            margin: MarginSpec::default(),
            output: OutputKind::default(),
            class_name: Some("latex".to_string()),
            include_static_style: true,
            rasterizer: RasterBackend::default(),
            correct_page_height: true,
            tools: ToolPaths::default(),
        }
    }
}

impl RenderOpts {
    /// Reject option values no render could succeed with.
    pub fn validate(&self) -> MathlineResult<()> {
        if self.density == 0 {
            return Err(MathlineError::validation("density must be non-zero"));
        }
        if !self.factor.is_finite() || self.factor <= 0.0 {
            return Err(MathlineError::validation(format!(
                "factor must be finite and > 0 (got {})",
                self.factor
            )));
        }
        if self.process_timeout.is_zero() {
            return Err(MathlineError::validation(
                "process timeout must be non-zero",
            ));
        }
        self.margin.resolve().validate()
    }

    /// Load options from a JSON file; missing fields take their defaults.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> MathlineResult<Self> {
        use anyhow::Context as _;
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .with_context(|| format!("open render options '{}'", path.display()))?;
        let opts: Self = serde_json::from_reader(std::io::BufReader::new(f))
            .map_err(|e| MathlineError::validation(format!("invalid render options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/opts.rs"]
mod tests;
