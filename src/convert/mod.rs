//! Rasterizers and vectorizers, and the timeout-bounded process runner they share.

/// External tool invocation.
pub mod process;
/// Page rasterization (ImageMagick or resvg).
pub mod raster;
/// Page vectorization (dvisvgm).
pub mod vector;
