//! The render pipeline: typeset, convert, locate the baseline, package.
//!
//! One configurable pipeline serves every output kind. Each call is independent: it owns a fresh
//! [`Scratch`] directory that is released on every exit path, so calls may run concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use rayon::prelude::*;

use crate::assemble::em::EmScale;
use crate::assemble::html::{HtmlOpts, Placement, fragment};
use crate::assemble::strategy::{CropStrategy, RasterImages, assemble};
use crate::assemble::vector::{VectorArtifact, package_vector};
use crate::convert::raster::{MagickRasterizer, Rasterizer, SvgRasterizer};
use crate::convert::vector::{DvisvgmVectorizer, Vectorizer, svg_height_px};
use crate::foundation::core::{Margins, PageMetrics};
use crate::foundation::error::{MathlineError, MathlineResult};
use crate::geometry::baseline::{Geometry, compute_geometry};
use crate::geometry::page_height::{corrected_margins, residue};
use crate::pipeline::opts::{RasterBackend, RenderOpts};
use crate::pipeline::scratch::Scratch;
use crate::typeset::engine::{LatexEngine, TypesetPage, Typesetter};
use crate::typeset::template::strip_delimiters;

/// Raster output: cropped image(s) plus everything needed to place them inline.
#[derive(Clone, Debug)]
pub struct RasterArtifact {
    /// Expression with `$` delimiters stripped.
    pub expression: String,
    /// Packaged image(s).
    pub images: RasterImages,
    /// Font-relative placement.
    pub placement: Placement,
    /// Baseline geometry of the cropped raster.
    pub geometry: Geometry,
    /// Metrics reported by the typesetting engine.
    pub metrics: PageMetrics,
    html_opts: HtmlOpts,
}

impl RasterArtifact {
    /// HTML fragment referencing `srcs` (one URL, or top and bottom URLs for split output).
    pub fn html(&self, srcs: &[&str]) -> String {
        fragment(&self.placement, srcs, &self.html_opts)
    }

    /// Write the image(s) next to `path`, returning the written paths in emission order.
    ///
    /// Split output is written to `<stem>-top.<ext>` and `<stem>-bottom.<ext>`.
    pub fn save(&self, path: impl AsRef<Path>) -> MathlineResult<Vec<PathBuf>> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        let targets = match &self.images {
            RasterImages::Single(_) | RasterImages::Symmetric(_) => vec![path.to_path_buf()],
            RasterImages::Split { .. } => vec![sibling(path, "top"), sibling(path, "bottom")],
        };
        for (img, target) in self.images.images().into_iter().zip(&targets) {
            img.save(target)
                .with_context(|| format!("write image '{}'", target.display()))?;
        }
        Ok(targets)
    }

    /// Write the image(s) and return a fragment referencing them by file name.
    pub fn save_with_html(&self, path: impl AsRef<Path>) -> MathlineResult<String> {
        let written = self.save(path)?;
        let names: Vec<String> = written
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        let srcs: Vec<&str> = names.iter().map(String::as_str).collect();
        Ok(self.html(&srcs))
    }
}

/// Result of one render call.
#[derive(Clone, Debug)]
pub enum Artifact {
    /// Cropped raster image(s).
    Raster(RasterArtifact),
    /// SVG markup of the full page.
    Vector(VectorArtifact),
}

impl Artifact {
    /// Metrics of the page the artifact was produced from.
    pub fn metrics(&self) -> &PageMetrics {
        match self {
            Self::Raster(r) => &r.metrics,
            Self::Vector(v) => &v.metrics,
        }
    }

    /// Font-relative placement of the artifact.
    pub fn placement(&self) -> &Placement {
        match self {
            Self::Raster(r) => &r.placement,
            Self::Vector(v) => &v.placement,
        }
    }
}

/// Configured render pipeline.
#[derive(Clone)]
pub struct Pipeline {
    opts: RenderOpts,
    typesetter: Arc<dyn Typesetter>,
    rasterizer: Arc<dyn Rasterizer>,
    vectorizer: Arc<dyn Vectorizer>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline backed by the external toolchain named in `opts.tools`.
    pub fn new(opts: RenderOpts) -> MathlineResult<Self> {
        let timeout = opts.process_timeout;
        let typesetter = Arc::new(LatexEngine::new(opts.tools.latex.clone(), timeout));
        let vectorizer: Arc<dyn Vectorizer> =
            Arc::new(DvisvgmVectorizer::new(opts.tools.dvisvgm.clone(), timeout));
        let rasterizer: Arc<dyn Rasterizer> = match opts.rasterizer {
            RasterBackend::Magick => {
                Arc::new(MagickRasterizer::new(opts.tools.convert.clone(), timeout))
            }
            RasterBackend::Resvg => Arc::new(SvgRasterizer::new(vectorizer.clone())),
        };
        Self::with_tools(opts, typesetter, rasterizer, vectorizer)
    }

    /// Pipeline with caller-supplied collaborators.
    pub fn with_tools(
        opts: RenderOpts,
        typesetter: Arc<dyn Typesetter>,
        rasterizer: Arc<dyn Rasterizer>,
        vectorizer: Arc<dyn Vectorizer>,
    ) -> MathlineResult<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            typesetter,
            rasterizer,
            vectorizer,
        })
    }

    /// Options this pipeline renders with.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Typeset `expression` and return its metrics without converting the page.
    pub fn measure(&self, expression: &str) -> MathlineResult<PageMetrics> {
        let scratch = Scratch::new()?;
        let page = self.typesetter.typeset(
            strip_delimiters(expression),
            &self.opts.margin.resolve(),
            &scratch,
        )?;
        Ok(page.metrics)
    }

    /// Render one expression. All-or-nothing: any failure aborts with no partial artifact.
    #[tracing::instrument(skip(self), fields(output = ?self.opts.output))]
    pub fn render(&self, expression: &str) -> MathlineResult<Artifact> {
        let expression = strip_delimiters(expression);
        let em = EmScale::new(self.opts.density, self.opts.factor)?;
        let margins = self.opts.margin.resolve();
        let scratch = Scratch::new()?;

        let page = self.typesetter.typeset(expression, &margins, &scratch)?;
        match self.opts.output.crop_strategy() {
            Some(strategy) => self
                .render_raster(expression, &page, strategy, &em, &scratch)
                .map(Artifact::Raster),
            None => self
                .render_vector(expression, page, &em, &scratch)
                .map(Artifact::Vector),
        }
    }

    /// Render independent expressions concurrently on a dedicated pool.
    ///
    /// Results come back in input order; each succeeds or fails on its own.
    pub fn render_many<S: AsRef<str> + Sync>(
        &self,
        expressions: &[S],
        threads: Option<usize>,
    ) -> MathlineResult<Vec<MathlineResult<Artifact>>> {
        let pool = build_thread_pool(threads)?;
        Ok(pool.install(|| {
            expressions
                .par_iter()
                .map(|e| self.render(e.as_ref()))
                .collect()
        }))
    }

    fn render_raster(
        &self,
        expression: &str,
        page: &TypesetPage,
        strategy: CropStrategy,
        em: &EmScale,
        scratch: &Scratch,
    ) -> MathlineResult<RasterArtifact> {
        let raster = self
            .rasterizer
            .rasterize(page, self.opts.density, scratch)?;
        let (geometry, cropped) = compute_geometry(&page.metrics, &raster)?;
        let (images, placement) = assemble(&cropped, &geometry, strategy, em)?;

        Ok(RasterArtifact {
            expression: expression.to_string(),
            images,
            placement,
            geometry,
            metrics: page.metrics,
            html_opts: HtmlOpts {
                class_name: self.opts.class_name.clone(),
                include_static_style: self.opts.include_static_style,
                alt: Some(expression.to_string()),
            },
        })
    }

    fn render_vector(
        &self,
        expression: &str,
        page: TypesetPage,
        em: &EmScale,
        scratch: &Scratch,
    ) -> MathlineResult<VectorArtifact> {
        let mut markup = self.vectorizer.vectorize(&page, scratch)?;
        let mut height_px = svg_height_px(&markup)?;
        let mut metrics = page.metrics;

        if self.opts.correct_page_height
            && let Some(margins) = corrected_margins(&metrics, height_px)?
        {
            tracing::debug!(height_px, ?margins, "re-typesetting for integral page height");
            let (m, corrected_markup, corrected_px) =
                self.typeset_vector(expression, &margins, scratch)?;
            metrics = m;
            markup = corrected_markup;
            height_px = corrected_px;

            let left = residue(height_px);
            if left > 0.0 {
                tracing::warn!(
                    height_px,
                    residue = left,
                    "page height still fractional after one correction pass"
                );
            }
        }

        Ok(package_vector(&markup, metrics, height_px, em))
    }

    fn typeset_vector(
        &self,
        expression: &str,
        margins: &Margins,
        scratch: &Scratch,
    ) -> MathlineResult<(PageMetrics, String, f64)> {
        let page = self.typesetter.typeset(expression, margins, scratch)?;
        let markup = self.vectorizer.vectorize(&page, scratch)?;
        let height_px = svg_height_px(&markup)?;
        Ok((page.metrics, markup, height_px))
    }
}

/// Render `expression` with a pipeline built from `opts`.
pub fn render(expression: &str, opts: &RenderOpts) -> MathlineResult<Artifact> {
    Pipeline::new(opts.clone())?.render(expression)
}

/// Render a raster to `path` and return the HTML fragment referencing it by file name.
pub fn render_to_path(
    expression: &str,
    path: impl AsRef<Path>,
    opts: &RenderOpts,
) -> MathlineResult<String> {
    match render(expression, opts)? {
        Artifact::Raster(r) => r.save_with_html(path),
        Artifact::Vector(_) => Err(MathlineError::validation(
            "render_to_path needs a raster output kind",
        )),
    }
}

fn build_thread_pool(threads: Option<usize>) -> MathlineResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MathlineError::validation(
            "render_many 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MathlineError::validation(format!("failed to build rayon thread pool: {e}")))
}

fn ensure_parent_dir(path: &Path) -> MathlineResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "formula".to_string());
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    path.with_file_name(format!("{stem}-{suffix}.{ext}"))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/render.rs"]
mod tests;
