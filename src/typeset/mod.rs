//! Metrics provider: the LaTeX driver document, engine invocation, and metrics parsing.

/// `pdflatex` invocation and the [`engine::Typesetter`] seam.
pub mod engine;
/// Side-channel metrics record parsing.
pub mod metrics;
/// Driver document rendering.
pub mod template;
