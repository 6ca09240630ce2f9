/// Convenience result type used across mathline.
pub type MathlineResult<T> = Result<T, MathlineError>;

/// Top-level error taxonomy used by the render pipeline.
///
/// Every kind aborts the render; no partial artifact is ever returned.
#[derive(thiserror::Error, Debug)]
pub enum MathlineError {
    /// The typesetting engine failed, timed out, or rejected the expression.
    #[error("typesetting error: {0}")]
    Typesetting(String),

    /// The rasterizer or vectorizer failed or timed out.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// The rendered page contains no ink in at least one scan direction.
    #[error("empty content error: {0}")]
    EmptyContent(String),

    /// The side-channel metrics record is missing or malformed.
    #[error("metrics parse error: {0}")]
    MetricsParse(String),

    /// Invalid options, or geometry that cannot belong to a real formula.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MathlineError {
    /// Build a [`MathlineError::Typesetting`] value.
    pub fn typesetting(msg: impl Into<String>) -> Self {
        Self::Typesetting(msg.into())
    }

    /// Build a [`MathlineError::Conversion`] value.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Build a [`MathlineError::EmptyContent`] value.
    pub fn empty_content(msg: impl Into<String>) -> Self {
        Self::EmptyContent(msg.into())
    }

    /// Build a [`MathlineError::MetricsParse`] value.
    pub fn metrics_parse(msg: impl Into<String>) -> Self {
        Self::MetricsParse(msg.into())
    }

    /// Build a [`MathlineError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
