//! Rasterizers: turn a typeset page into pixels at a given density (pixels per inch).

use std::sync::Arc;
use std::time::Duration;

use crate::convert::process::{ToolCommand, ToolKind};
use crate::convert::vector::{Vectorizer, parse_svg};
use crate::foundation::error::{MathlineError, MathlineResult};
use crate::pipeline::scratch::Scratch;
use crate::typeset::engine::TypesetPage;

/// Anything that can rasterize a typeset page.
///
/// The returned image must have a background whose ink value is zero (transparent, or white when
/// the image carries no alpha channel).
pub trait Rasterizer: Send + Sync {
    /// Rasterize `page` at `density` pixels per inch.
    fn rasterize(
        &self,
        page: &TypesetPage,
        density: u32,
        scratch: &Scratch,
    ) -> MathlineResult<image::DynamicImage>;
}

/// ImageMagick `convert`-backed [`Rasterizer`].
#[derive(Clone, Debug)]
pub struct MagickRasterizer {
    program: String,
    timeout: Duration,
}

impl MagickRasterizer {
    /// Create a rasterizer invoking `program` (usually `convert`) with a per-run `timeout`.
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Rasterizer for MagickRasterizer {
    #[tracing::instrument(skip(self, page, scratch), fields(program = %self.program))]
    fn rasterize(
        &self,
        page: &TypesetPage,
        density: u32,
        scratch: &Scratch,
    ) -> MathlineResult<image::DynamicImage> {
        let png_path = scratch.artifact("png");
        let _ = std::fs::remove_file(&png_path);

        ToolCommand::new(&self.program, ToolKind::Conversion, self.timeout)
            .arg("-density")
            .arg(density.to_string())
            .arg(&page.pdf_path)
            .arg("-quality")
            .arg("100")
            .arg(&png_path)
            .current_dir(scratch.path())
            .run()?;

        image::open(&png_path).map_err(|e| {
            MathlineError::conversion(format!(
                "{} left no readable raster at '{}': {e}",
                self.program,
                png_path.display()
            ))
        })
    }
}

/// In-process rasterizer: vectorizes the page, then renders the SVG with `resvg`.
#[derive(Clone)]
pub struct SvgRasterizer {
    vectorizer: Arc<dyn Vectorizer>,
}

impl SvgRasterizer {
    /// Rasterize through `vectorizer`'s SVG output.
    pub fn new(vectorizer: Arc<dyn Vectorizer>) -> Self {
        Self { vectorizer }
    }
}

impl std::fmt::Debug for SvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgRasterizer").finish_non_exhaustive()
    }
}

impl Rasterizer for SvgRasterizer {
    #[tracing::instrument(skip(self, page, scratch))]
    fn rasterize(
        &self,
        page: &TypesetPage,
        density: u32,
        scratch: &Scratch,
    ) -> MathlineResult<image::DynamicImage> {
        let markup = self.vectorizer.vectorize(page, scratch)?;
        let tree = parse_svg(&markup)?;
        let rgba = rasterize_svg(&tree, density)?;
        Ok(image::DynamicImage::ImageRgba8(rgba))
    }
}

/// Render a `usvg` tree at `density` pixels per inch onto a transparent canvas.
pub fn rasterize_svg(tree: &usvg::Tree, density: u32) -> MathlineResult<image::RgbaImage> {
    if density == 0 {
        return Err(MathlineError::validation("density must be non-zero"));
    }
    // usvg sizes are CSS pixels at 96 per inch.
    let scale = density as f32 / 96.0;
    let size = tree.size();
    let to_px = |v: f32| -> MathlineResult<u32> {
        let px = (v * scale).ceil();
        if !px.is_finite() || px < 1.0 {
            return Err(MathlineError::conversion("svg has invalid width/height"));
        }
        Ok(px as u32)
    };
    let (w, h) = (to_px(size.width())?, to_px(size.height())?);

    const MAX_DIM: u32 = 16_384;
    if w > MAX_DIM || h > MAX_DIM {
        return Err(MathlineError::conversion(format!(
            "svg raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| MathlineError::conversion("failed to allocate svg pixmap"))?;
    let xform = resvg::tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(tree, xform, &mut pixmap.as_mut());

    let mut data = pixmap.take();
    demultiply_rgba8_in_place(&mut data);
    image::RgbaImage::from_raw(w, h, data)
        .ok_or_else(|| MathlineError::conversion("svg pixmap has unexpected size"))
}

fn demultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/convert/raster.rs"]
mod tests;
