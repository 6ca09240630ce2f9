//! LaTeX driver document for measuring and typesetting a single formula.
//!
//! The document boxes `\formula` (defined on the engine command line), measures it, writes the
//! measurements to `\jobname.json`, then sizes the page so the box sits exactly inside the
//! requested margins.

use std::fmt::Write as _;

use crate::foundation::core::Margins;

/// Job name used for every typesetting run; outputs land at `<scratch>/<JOB_NAME>.{pdf,json}`.
pub const JOB_NAME: &str = "formula";

/// Render the driver document for the given margins.
pub fn render_template(margins: &Margins) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str(
        r"\documentclass[10pt]{article}
\pagestyle{empty}
\setlength{\topskip}{0pt}
\setlength{\parindent}{0pt}
\setlength{\abovedisplayskip}{0pt}
\setlength{\belowdisplayskip}{0pt}

\usepackage{geometry}
\usepackage{amsmath}

\newsavebox{\snippetbox}
\newlength{\snippetwidth}
\newlength{\snippetheight}
\newlength{\snippetdepth}
\newlength{\pagewidth}
\newlength{\pageheight}
\newlength{\pagelmargin}
\newlength{\pagetmargin}
\newlength{\pagermargin}
\newlength{\pagebmargin}

\begin{lrbox}{\snippetbox}
$ {\formula} $
\end{lrbox}

\settowidth{\snippetwidth}{\usebox{\snippetbox}}
\settoheight{\snippetheight}{\usebox{\snippetbox}}
\settodepth{\snippetdepth}{\usebox{\snippetbox}}

",
    );

    for (name, pt) in [
        ("pagelmargin", margins.left),
        ("pagetmargin", margins.top),
        ("pagermargin", margins.right),
        ("pagebmargin", margins.bottom),
    ] {
        let _ = writeln!(out, r"\setlength\{name}{{{}}}", tex_pt(pt));
    }

    out.push_str(
        r"
\setlength\pagewidth\snippetwidth
\addtolength\pagewidth\pagelmargin
\addtolength\pagewidth\pagermargin

\setlength\pageheight\snippetheight
\addtolength\pageheight\snippetdepth
\addtolength\pageheight\pagetmargin
\addtolength\pageheight\pagebmargin

\newwrite\metricsout
\immediate\openout\metricsout=\jobname.json
\begingroup
  \catcode`\[ = 1\relax
  \catcode`\] = 2\relax
  \catcode`\{ = 12\relax
  \catcode`\} = 12\relax
  \gdef\OpenBrace[{]
  \gdef\CloseBrace[}]
\endgroup
\immediate\write\metricsout{\OpenBrace}
",
    );

    let mut fields: Vec<(&str, &str)> = vec![
        ("snippetDepth", "snippetdepth"),
        ("snippetHeight", "snippetheight"),
        ("snippetWidth", "snippetwidth"),
        ("pageWidth", "pagewidth"),
        ("pageHeight", "pageheight"),
    ];
    if margins.is_uniform() {
        fields.push(("pageMargin", "pagetmargin"));
    } else {
        fields.extend([
            ("pageLMargin", "pagelmargin"),
            ("pageTMargin", "pagetmargin"),
            ("pageRMargin", "pagermargin"),
            ("pageBMargin", "pagebmargin"),
        ]);
    }
    let last = fields.len() - 1;
    for (i, (key, length)) in fields.iter().enumerate() {
        let sep = if i == last { "" } else { "," };
        let _ = writeln!(
            out,
            r#"\immediate\write\metricsout{{  "{key}": "\the\{length}"{sep}}}"#
        );
    }

    out.push_str(
        r"\immediate\write\metricsout{\CloseBrace}
\closeout\metricsout

\geometry{paperwidth=\pagewidth,paperheight=\pageheight,left=\pagelmargin,top=\pagetmargin,right=\pagermargin,bottom=\pagebmargin}

\begin{document}
\usebox{\snippetbox}
\end{document}
",
    );
    out
}

/// Engine command line: defines `\formula` and inputs the driver document.
pub fn engine_command_line(expression: &str, template_path: &std::path::Path) -> String {
    // TeX wants forward slashes even on Windows.
    let path = template_path.display().to_string().replace('\\', "/");
    format!(r"\def\formula{{{expression}}}\input{{{path}}}")
}

/// Strip `$` delimiters from both ends of an expression.
pub fn strip_delimiters(expression: &str) -> &str {
    expression.trim_matches('$')
}

fn tex_pt(pt: f64) -> String {
    // f64 Display never uses exponent notation, which TeX could not parse.
    format!("{pt}pt")
}

#[cfg(test)]
#[path = "../../tests/unit/typeset/template.rs"]
mod tests;
