//! Placement metadata and the HTML fragments built from it.

use crate::assemble::em::round_em;

/// Static style that keeps browser-side scaling anchored to the top-left of a symmetric image.
pub const STATIC_STYLE: &str = "object-fit:cover;object-position:0 0;";

/// Font-relative sizing for one emitted artifact. All values are in `em`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Placement {
    /// One image shifted down by its below-baseline share.
    #[serde(rename_all = "camelCase")]
    Single {
        /// Image width.
        width_em: f64,
        /// Image height.
        height_em: f64,
        /// Negative shift of the image bottom below the text baseline.
        vertical_align_em: f64,
    },
    /// Top image on the baseline, bottom image hanging below it.
    #[serde(rename_all = "camelCase")]
    Split {
        /// Width of both images.
        width_em: f64,
        /// Height of the above-baseline image.
        top_height_em: f64,
        /// Height of the below-baseline image.
        bottom_height_em: f64,
    },
    /// One image whose baseline sits at its vertical center.
    #[serde(rename_all = "camelCase")]
    Symmetric {
        /// Image width.
        width_em: f64,
        /// Padded image height.
        height_em: f64,
        /// Negative shift: half the padded height.
        vertical_align_em: f64,
    },
}

impl Placement {
    /// Inline style for the outermost element.
    pub fn style(&self, include_static_style: bool) -> String {
        match *self {
            Self::Single {
                height_em,
                vertical_align_em,
                ..
            } => format!(
                "height:{}em;vertical-align:{}em",
                round_em(height_em),
                round_em(vertical_align_em)
            ),
            Self::Split {
                width_em,
                top_height_em,
                bottom_height_em,
            } => format!(
                "position:relative;display:inline-block;width:{}em;height:{}em;margin-bottom:{}em;vertical-align:{}em;",
                round_em(width_em),
                round_em(top_height_em),
                round_em(bottom_height_em),
                round_em(-bottom_height_em)
            ),
            Self::Symmetric {
                width_em,
                height_em,
                vertical_align_em,
            } => format!(
                "width:{}em;height:{}em;vertical-align:{}em;{}",
                round_em(width_em),
                round_em(height_em),
                round_em(vertical_align_em),
                if include_static_style { STATIC_STYLE } else { "" }
            ),
        }
    }
}

/// Markup options for emitted fragments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HtmlOpts {
    /// CSS class placed on the outermost element.
    pub class_name: Option<String>,
    /// Append [`STATIC_STYLE`] to symmetric images.
    pub include_static_style: bool,
    /// Alternative text (usually the source expression).
    pub alt: Option<String>,
}

/// Build the fragment for `placement`.
///
/// `srcs` holds one image URL, or two (top, bottom) for split placements.
pub fn fragment(placement: &Placement, srcs: &[&str], opts: &HtmlOpts) -> String {
    let class = opts
        .class_name
        .as_deref()
        .map(|c| format!(r#" class="{}""#, escape_html(c)))
        .unwrap_or_default();
    let alt = opts
        .alt
        .as_deref()
        .map(|a| format!(r#" alt="{}""#, escape_html(a)))
        .unwrap_or_default();
    let src = |i: usize| escape_html(srcs.get(i).copied().unwrap_or_default());
    let style = placement.style(opts.include_static_style);

    match placement {
        Placement::Single { .. } | Placement::Symmetric { .. } => {
            format!(r#"<img{class}{alt} style="{style}" src="{}"/>"#, src(0))
        }
        Placement::Split {
            bottom_height_em, ..
        } => format!(
            concat!(
                r#"<span{class} style="{style}">"#,
                r#"<img{alt} style="position:absolute;top:0;left:0;width:100%;margin:0;padding:0;border-style:none;border:0;height:100%;" src="{top}"/>"#,
                r#"<img style="position:absolute;top:100%;left:0;width:100%;margin:0;padding:0;border-style:none;border:0;height:{bottom_h}em;" src="{bottom}"/>"#,
                "</span>"
            ),
            class = class,
            style = style,
            alt = alt,
            top = src(0),
            bottom = src(1),
            bottom_h = round_em(*bottom_height_em),
        ),
    }
}

/// Escape HTML entities for safe embedding in attribute values.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/html.rs"]
mod tests;
