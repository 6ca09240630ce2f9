//! Baseline geometry: content detection, baseline fraction, integer page height.

/// Baseline fraction and pixel split on the raster path.
pub mod baseline;
/// Ink bounding box detection.
pub mod content_box;
/// One-pass integer-pixel page height correction for vector output.
pub mod page_height;
