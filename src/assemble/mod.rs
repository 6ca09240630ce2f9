//! Image assembly: crop strategies, em sizing and placement markup.

/// Pixel to em conversion.
pub mod em;
/// Placement values and HTML fragments.
pub mod html;
/// Single, split and symmetric crops.
pub mod strategy;
/// Vector markup packaging.
pub mod vector;
