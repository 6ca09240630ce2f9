//! Vectorizer: converts a typeset PDF page into SVG markup.

use std::time::Duration;

use anyhow::Context as _;

use crate::convert::process::{ToolCommand, ToolKind};
use crate::foundation::error::{MathlineError, MathlineResult};
use crate::pipeline::scratch::Scratch;
use crate::typeset::engine::TypesetPage;

/// Anything that can turn a typeset page into SVG markup.
pub trait Vectorizer: Send + Sync {
    /// Convert `page` into a full SVG document (including any XML declaration).
    fn vectorize(&self, page: &TypesetPage, scratch: &Scratch) -> MathlineResult<String>;
}

/// `dvisvgm --pdf`-backed [`Vectorizer`].
///
/// Glyphs are emitted as paths (`--no-fonts`) and the SVG viewport is the full page
/// (`--bbox=papersize`) so margins survive conversion.
#[derive(Clone, Debug)]
pub struct DvisvgmVectorizer {
    program: String,
    timeout: Duration,
}

impl DvisvgmVectorizer {
    /// Create a vectorizer invoking `program` with a per-run `timeout`.
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Vectorizer for DvisvgmVectorizer {
    #[tracing::instrument(skip_all, fields(program = %self.program))]
    fn vectorize(&self, page: &TypesetPage, scratch: &Scratch) -> MathlineResult<String> {
        let svg_path = scratch.artifact("svg");
        let _ = std::fs::remove_file(&svg_path);

        let mut output = std::ffi::OsString::from("--output=");
        output.push(&svg_path);
        ToolCommand::new(&self.program, ToolKind::Conversion, self.timeout)
            .arg("--pdf")
            .arg("--bbox=papersize")
            .arg("--no-fonts")
            .arg(output)
            .arg(&page.pdf_path)
            .current_dir(scratch.path())
            .run()?;

        if !svg_path.is_file() {
            return Err(MathlineError::conversion(format!(
                "{} produced no svg for '{}'",
                self.program,
                page.pdf_path.display()
            )));
        }
        let markup = std::fs::read_to_string(&svg_path)
            .with_context(|| format!("read svg '{}'", svg_path.display()))?;
        Ok(markup)
    }
}

/// Parse SVG markup into a `usvg` tree.
pub fn parse_svg(markup: &str) -> MathlineResult<usvg::Tree> {
    let opts = usvg::Options::default();
    usvg::Tree::from_str(markup, &opts)
        .map_err(|e| MathlineError::conversion(format!("invalid svg from vectorizer: {e}")))
}

/// Declared height of an SVG document in CSS pixels (96 per inch).
pub fn svg_height_px(markup: &str) -> MathlineResult<f64> {
    let tree = parse_svg(markup)?;
    let h = f64::from(tree.size().height());
    if !h.is_finite() || h <= 0.0 {
        return Err(MathlineError::conversion("svg has invalid height"));
    }
    Ok(h)
}

/// Drop a leading XML declaration line; the embedding document supplies its own.
pub fn strip_xml_declaration(markup: &str) -> &str {
    let trimmed = markup.trim_start();
    if trimmed.starts_with("<?xml") {
        match trimmed.split_once('\n') {
            Some((_, rest)) => rest,
            None => "",
        }
    } else {
        markup
    }
}

#[cfg(test)]
#[path = "../../tests/unit/convert/vector.rs"]
mod tests;
