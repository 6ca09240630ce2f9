//! Timeout-bounded invocation of external tools (`pdflatex`, `convert`, `dvisvgm`).

use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::foundation::error::{MathlineError, MathlineResult};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Which pipeline stage a tool belongs to; selects the error kind on failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolKind {
    /// The typesetting engine.
    Typesetting,
    /// A rasterizer or vectorizer.
    Conversion,
}

impl ToolKind {
    fn error(self, msg: String) -> MathlineError {
        match self {
            Self::Typesetting => MathlineError::typesetting(msg),
            Self::Conversion => MathlineError::conversion(msg),
        }
    }
}

/// Captured result of a successful tool run.
#[derive(Clone, Debug)]
pub struct ToolOutput {
    /// Raw stdout bytes.
    pub stdout: Vec<u8>,
    /// Raw stderr bytes.
    pub stderr: Vec<u8>,
    /// Wall time the tool ran for.
    pub elapsed: Duration,
}

/// One external tool invocation.
#[derive(Clone, Debug)]
pub struct ToolCommand<'a> {
    /// Program name or path.
    pub program: &'a str,
    /// Arguments, passed verbatim.
    pub args: Vec<std::ffi::OsString>,
    /// Working directory for the child.
    pub cwd: Option<&'a Path>,
    /// Hard limit on wall time; expiry kills the child.
    pub timeout: Duration,
    /// Stage the tool belongs to.
    pub kind: ToolKind,
}

impl<'a> ToolCommand<'a> {
    /// Start building an invocation of `program`.
    pub fn new(program: &'a str, kind: ToolKind, timeout: Duration) -> Self {
        Self {
            program,
            args: Vec::new(),
            cwd: None,
            timeout,
            kind,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Run the child in `dir`.
    pub fn current_dir(mut self, dir: &'a Path) -> Self {
        self.cwd = Some(dir);
        self
    }

    /// Spawn the tool and wait for it, killing it if the timeout expires.
    ///
    /// Non-zero exit, spawn failure and timeout all map to the error kind of [`ToolKind`], with the
    /// tool's combined output attached verbatim.
    #[tracing::instrument(skip(self), fields(program = self.program, kind = ?self.kind))]
    pub fn run(self) -> MathlineResult<ToolOutput> {
        let mut cmd = Command::new(self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = self.cwd {
            cmd.current_dir(dir);
        }

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            self.kind.error(format!(
                "failed to spawn {} (is it installed and on PATH?): {e}",
                self.program
            ))
        })?;

        // Drain both pipes on threads so a chatty tool cannot block on a full pipe.
        let stdout_drain = child.stdout.take().map(drain);
        let stderr_drain = child.stderr.take().map(drain);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    // Grandchildren may still hold the pipes open; leave the drains detached.
                    tracing::debug!(timeout = ?self.timeout, "tool timed out");
                    return Err(self.kind.error(format!(
                        "{} timed out after {:.3}s",
                        self.program,
                        self.timeout.as_secs_f64()
                    )));
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(self
                        .kind
                        .error(format!("failed to wait for {}: {e}", self.program)));
                }
            }
        };

        let stdout = join(stdout_drain);
        let stderr = join(stderr_drain);
        let elapsed = started.elapsed();

        if !status.success() {
            return Err(self.kind.error(failure_message(
                self.program,
                status,
                &stdout,
                &stderr,
            )));
        }

        tracing::debug!(elapsed = ?elapsed, "tool finished");
        Ok(ToolOutput {
            stdout,
            stderr,
            elapsed,
        })
    }
}

/// Return `true` when `program` can be spawned (probe with `--version`).
pub fn is_tool_on_path(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join(handle: Option<std::thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn failure_message(program: &str, status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> String {
    let code = status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "<signal>".to_string());
    let out = String::from_utf8_lossy(stdout);
    let err = String::from_utf8_lossy(stderr);
    let combined = format!("{}\n{}", out.trim(), err.trim());
    let combined = combined.trim();
    if combined.is_empty() {
        format!("{program} failed (exit code {code})")
    } else {
        format!("{program} failed (exit code {code}): {combined}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/convert/process.rs"]
mod tests;
