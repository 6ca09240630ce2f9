use crate::assemble::em::EmScale;
use crate::assemble::html::Placement;
use crate::convert::vector::strip_xml_declaration;
use crate::foundation::core::PageMetrics;

/// Vector output: embeddable SVG markup plus the metrics it was laid out with.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorArtifact {
    /// SVG markup without its XML declaration line.
    pub markup: String,
    /// Metrics of the final (possibly height-corrected) page.
    pub metrics: PageMetrics,
    /// Fraction of the full page height below the baseline.
    pub baseline_fraction: f64,
    /// Realized SVG height in CSS pixels.
    pub height_px: f64,
    /// Font-relative placement of the whole page.
    pub placement: Placement,
}

/// Package vectorizer output; the page is not trimmed, so the baseline comes from the metrics
/// alone.
pub fn package_vector(
    markup: &str,
    metrics: PageMetrics,
    height_px: f64,
    em: &EmScale,
) -> VectorArtifact {
    let baseline_fraction = metrics.baseline_fraction_of_page();
    let height_em = em.pt(metrics.page_height());
    VectorArtifact {
        markup: strip_xml_declaration(markup).to_string(),
        metrics,
        baseline_fraction,
        height_px,
        placement: Placement::Single {
            width_em: em.pt(metrics.page_width()),
            height_em,
            vertical_align_em: -baseline_fraction * height_em,
        },
    }
}
