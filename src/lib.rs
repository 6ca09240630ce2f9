//! mathline renders LaTeX math into images whose baseline lines up with surrounding HTML text.
//!
//! A render call typesets the expression onto a tightly sized page, converts the page to a raster
//! or SVG, works out where the formula's baseline falls inside the trimmed image, and packages the
//! result with font-relative placement:
//!
//! - Build [`RenderOpts`] (or load them from JSON)
//! - Call [`render`] or create a [`Pipeline`] for repeated / batched renders
//! - Save the [`Artifact`] and embed the returned HTML fragment
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Image assembly and placement markup.
pub mod assemble;
/// Rasterizers, vectorizers and external tool plumbing.
pub mod convert;
/// Baseline geometry.
pub mod geometry;
/// The render pipeline and its options.
pub mod pipeline;
/// Typesetting engine integration.
pub mod typeset;

pub use crate::foundation::core::{MarginSpec, Margins, PageMetrics};
pub use crate::foundation::error::{MathlineError, MathlineResult};

pub use crate::assemble::em::EmScale;
pub use crate::assemble::html::{HtmlOpts, Placement};
pub use crate::assemble::strategy::{CropStrategy, RasterImages};
pub use crate::assemble::vector::VectorArtifact;
pub use crate::geometry::baseline::Geometry;
pub use crate::geometry::content_box::ContentBox;
pub use crate::pipeline::opts::{OutputKind, RasterBackend, RenderOpts, ToolPaths};
pub use crate::pipeline::render::{Artifact, Pipeline, RasterArtifact, render, render_to_path};
pub use crate::pipeline::scratch::Scratch;
pub use crate::typeset::engine::{LatexEngine, TypesetPage, Typesetter};
