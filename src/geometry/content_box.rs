use image::{DynamicImage, GrayImage};

use crate::foundation::error::{MathlineError, MathlineResult};

/// Tightest box around non-background pixels, as offsets from each raster edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContentBox {
    /// Empty columns before the first inked column.
    pub left: u32,
    /// Empty rows before the first inked row.
    pub top: u32,
    /// Empty columns after the last inked column.
    pub right: u32,
    /// Empty rows after the last inked row.
    pub bottom: u32,
}

impl ContentBox {
    /// Size of the cropped region inside a `width x height` raster.
    pub fn cropped_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            width.saturating_sub(self.left + self.right),
            height.saturating_sub(self.top + self.bottom),
        )
    }
}

/// Per-pixel ink coverage: alpha when the raster has an alpha channel, inverted luma otherwise.
pub fn ink_map(img: &DynamicImage) -> GrayImage {
    if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            image::Luma([rgba.get_pixel(x, y).0[3]])
        })
    } else {
        let mut luma = img.to_luma8();
        for p in luma.pixels_mut() {
            p.0[0] = 255 - p.0[0];
        }
        luma
    }
}

/// Scan row and column sums from all four edges for the first inked line.
///
/// A raster with no ink at all has no content box; that is an error, never a zero-area crop.
pub fn find_content_box(ink: &GrayImage) -> MathlineResult<ContentBox> {
    let (w, h) = ink.dimensions();
    let mut col_sums = vec![0u64; w as usize];
    let mut row_sums = vec![0u64; h as usize];
    for (x, y, p) in ink.enumerate_pixels() {
        let v = u64::from(p.0[0]);
        col_sums[x as usize] += v;
        row_sums[y as usize] += v;
    }

    let empty = |edge: &str| {
        MathlineError::empty_content(format!(
            "no content found scanning from the {edge} edge of a {w}x{h} raster"
        ))
    };

    Ok(ContentBox {
        left: leading_zero_count(col_sums.iter().copied()).ok_or_else(|| empty("left"))?,
        top: leading_zero_count(row_sums.iter().copied()).ok_or_else(|| empty("top"))?,
        right: leading_zero_count(col_sums.iter().rev().copied())
            .ok_or_else(|| empty("right"))?,
        bottom: leading_zero_count(row_sums.iter().rev().copied())
            .ok_or_else(|| empty("bottom"))?,
    })
}

/// Number of zero sums before the first non-zero one, or `None` when every sum is zero.
fn leading_zero_count(sums: impl Iterator<Item = u64>) -> Option<u32> {
    let mut n = 0u32;
    for s in sums {
        if s != 0 {
            return Some(n);
        }
        n += 1;
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/content_box.rs"]
mod tests;
