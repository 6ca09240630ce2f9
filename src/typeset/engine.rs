//! The metrics provider: typesets a formula onto a tightly sized page and reads back its box
//! metrics.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;

use crate::convert::process::{ToolCommand, ToolKind};
use crate::foundation::core::{Margins, PageMetrics};
use crate::foundation::error::{MathlineError, MathlineResult};
use crate::pipeline::scratch::Scratch;
use crate::typeset::metrics::read_metrics;
use crate::typeset::template::{JOB_NAME, engine_command_line, render_template};

/// A typeset page: the PDF containing only the formula plus its side-channel metrics.
#[derive(Clone, Debug)]
pub struct TypesetPage {
    /// Path of the one-page PDF inside the scratch directory.
    pub pdf_path: PathBuf,
    /// Box metrics and the margins actually used.
    pub metrics: PageMetrics,
}

/// Anything that can typeset an expression onto a page with the requested margins.
pub trait Typesetter: Send + Sync {
    /// Typeset `expression` (already stripped of `$` delimiters) into `scratch`.
    fn typeset(
        &self,
        expression: &str,
        margins: &Margins,
        scratch: &Scratch,
    ) -> MathlineResult<TypesetPage>;
}

/// `pdflatex`-backed [`Typesetter`].
#[derive(Clone, Debug)]
pub struct LatexEngine {
    program: String,
    timeout: Duration,
}

impl LatexEngine {
    /// Create an engine invoking `program` (usually `pdflatex`) with a per-run `timeout`.
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Typesetter for LatexEngine {
    #[tracing::instrument(skip(self, scratch), fields(program = %self.program))]
    fn typeset(
        &self,
        expression: &str,
        margins: &Margins,
        scratch: &Scratch,
    ) -> MathlineResult<TypesetPage> {
        let tex_path = scratch.artifact("tex");
        std::fs::write(&tex_path, render_template(margins))
            .with_context(|| format!("write driver document '{}'", tex_path.display()))?;

        // Stale outputs from an earlier pass in the same scratch must not be mistaken for fresh ones.
        for ext in ["pdf", "json"] {
            let _ = std::fs::remove_file(scratch.artifact(ext));
        }

        let mut output_dir = std::ffi::OsString::from("-output-directory=");
        output_dir.push(scratch.path());
        ToolCommand::new(&self.program, ToolKind::Typesetting, self.timeout)
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(format!("-jobname={JOB_NAME}"))
            .arg(output_dir)
            .arg(engine_command_line(expression, &tex_path))
            .current_dir(scratch.path())
            .run()?;

        let pdf_path = scratch.artifact("pdf");
        if !pdf_path.is_file() {
            return Err(MathlineError::typesetting(format!(
                "{} produced no page for '{expression}'",
                self.program
            )));
        }

        let metrics = read_metrics(&scratch.artifact("json"))?;
        metrics.validate()?;
        tracing::debug!(
            width = metrics.snippet_width,
            height = metrics.snippet_height,
            depth = metrics.snippet_depth,
            "typeset metrics"
        );

        Ok(TypesetPage { pdf_path, metrics })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/typeset/engine.rs"]
mod tests;
