//! Parsing of the side-channel metrics record written by the driver document.
//!
//! The record is a flat JSON object of TeX lengths such as `"snippetDepth": "1.94397pt"`. Keys
//! are matched case-insensitively so both `snippetDepth` and `snippetdepth` spellings work.

use std::collections::BTreeMap;

use crate::foundation::core::{Margins, PageMetrics};
use crate::foundation::error::{MathlineError, MathlineResult};

/// Reported page sizes may differ from the derived ones by TeX's scaled-point rounding.
const PAGE_SIZE_TOLERANCE_PT: f64 = 0.01;

/// Parse a metrics record into [`PageMetrics`].
pub fn parse_metrics(json: &str) -> MathlineResult<PageMetrics> {
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| MathlineError::metrics_parse(format!("invalid metrics JSON: {e}")))?;
    let fields: BTreeMap<String, serde_json::Value> = raw
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect();

    let get = |key: &str| -> MathlineResult<Option<f64>> {
        fields
            .get(&key.to_ascii_lowercase())
            .map(|v| parse_length(key, v))
            .transpose()
    };
    let require = |key: &str| -> MathlineResult<f64> {
        get(key)?.ok_or_else(|| MathlineError::metrics_parse(format!("missing field '{key}'")))
    };

    let margins = match get("pageMargin")? {
        Some(m) => Margins::uniform(m),
        None => Margins {
            left: require("pageLMargin")?,
            top: require("pageTMargin")?,
            right: require("pageRMargin")?,
            bottom: require("pageBMargin")?,
        },
    };

    let metrics = PageMetrics {
        snippet_width: require("snippetWidth")?,
        snippet_height: require("snippetHeight")?,
        snippet_depth: require("snippetDepth")?,
        margins,
    };

    for (key, derived) in [
        ("pageWidth", metrics.page_width()),
        ("pageHeight", metrics.page_height()),
    ] {
        if let Some(reported) = get(key)?
            && (reported - derived).abs() > PAGE_SIZE_TOLERANCE_PT
        {
            return Err(MathlineError::metrics_parse(format!(
                "{key} {reported}pt disagrees with snippet + margins ({derived}pt)"
            )));
        }
    }

    Ok(metrics)
}

/// Read and parse a metrics record from disk.
pub fn read_metrics(path: &std::path::Path) -> MathlineResult<PageMetrics> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        MathlineError::metrics_parse(format!(
            "failed to read metrics record '{}': {e}",
            path.display()
        ))
    })?;
    parse_metrics(&json)
}

fn parse_length(key: &str, v: &serde_json::Value) -> MathlineResult<f64> {
    let n = match v {
        serde_json::Value::String(s) => {
            let s = s.trim();
            let digits = s.strip_suffix("pt").unwrap_or(s).trim();
            digits.parse::<f64>().map_err(|_| {
                MathlineError::metrics_parse(format!("field '{key}' is not a length: '{s}'"))
            })?
        }
        serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| {
            MathlineError::metrics_parse(format!("field '{key}' is out of range"))
        })?,
        other => {
            return Err(MathlineError::metrics_parse(format!(
                "field '{key}' has unexpected type: {other}"
            )));
        }
    };
    if !n.is_finite() {
        return Err(MathlineError::metrics_parse(format!(
            "field '{key}' is not finite"
        )));
    }
    Ok(n)
}

#[cfg(test)]
#[path = "../../tests/unit/typeset/metrics.rs"]
mod tests;
