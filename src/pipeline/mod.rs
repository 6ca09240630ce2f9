/// Render options.
pub mod opts;
/// The render pipeline.
pub mod render;
/// Per-call scratch directories.
pub mod scratch;
