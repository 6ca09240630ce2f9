use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::MathlineResult;
use crate::typeset::template::JOB_NAME;

/// Per-render scratch directory.
///
/// Every render call owns a fresh, uniquely named directory; it is removed when the value is
/// dropped, on success and on every error path.
#[derive(Debug)]
pub struct Scratch {
    dir: tempfile::TempDir,
}

impl Scratch {
    /// Create a fresh scratch directory under the system temp dir.
    pub fn new() -> MathlineResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("mathline-")
            .tempdir()
            .context("create scratch directory")?;
        tracing::trace!(path = %dir.path().display(), "scratch directory created");
        Ok(Self { dir })
    }

    /// Root of the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the job artifact with extension `ext` (`formula.pdf`, `formula.json`, ...).
    pub fn artifact(&self, ext: &str) -> PathBuf {
        self.dir.path().join(format!("{JOB_NAME}.{ext}"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/scratch.rs"]
mod tests;
