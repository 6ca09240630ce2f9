use super::*;

fn opts() -> HtmlOpts {
    HtmlOpts {
        class_name: Some("latex".to_string()),
        include_static_style: true,
        alt: Some("x^2 < y".to_string()),
    }
}

#[test]
fn single_fragment_has_height_and_vertical_align() {
    let p = Placement::Single {
        width_em: 1.0,
        height_em: 1.234567,
        vertical_align_em: -0.25,
    };
    assert_eq!(
        fragment(&p, &["f.png"], &opts()),
        r#"<img class="latex" alt="x^2 &lt; y" style="height:1.2346em;vertical-align:-0.25em" src="f.png"/>"#
    );
}

#[test]
fn symmetric_fragment_carries_optional_static_style() {
    let p = Placement::Symmetric {
        width_em: 2.0,
        height_em: 1.5,
        vertical_align_em: -0.75,
    };
    let with = fragment(&p, &["f.png"], &opts());
    assert!(with.contains("width:2em;height:1.5em;vertical-align:-0.75em;object-fit:cover;object-position:0 0;"));

    let without = fragment(
        &p,
        &["f.png"],
        &HtmlOpts {
            include_static_style: false,
            class_name: None,
            alt: None,
        },
    );
    assert_eq!(
        without,
        r#"<img style="width:2em;height:1.5em;vertical-align:-0.75em;" src="f.png"/>"#
    );
}

#[test]
fn split_fragment_references_both_images() {
    let p = Placement::Split {
        width_em: 2.0,
        top_height_em: 1.0,
        bottom_height_em: 0.5,
    };
    let html = fragment(&p, &["f-top.png", "f-bottom.png"], &opts());
    assert!(html.starts_with(r#"<span class="latex" style="position:relative;display:inline-block;width:2em;height:1em;margin-bottom:0.5em;vertical-align:-0.5em;">"#));
    assert!(html.contains(r#"src="f-top.png""#));
    assert!(html.contains(r#"height:0.5em;" src="f-bottom.png""#));
    assert!(html.ends_with("</span>"));
}

#[test]
fn placement_serializes_with_kind_tag() {
    let p = Placement::Symmetric {
        width_em: 1.0,
        height_em: 2.0,
        vertical_align_em: -1.0,
    };
    let v = serde_json::to_value(p).unwrap();
    assert_eq!(v["kind"], "symmetric");
    assert_eq!(v["verticalAlignEm"], -1.0);
}

#[test]
fn escaping_covers_attribute_breakers() {
    assert_eq!(escape_html(r#"a&b"c'<>"#), "a&amp;b&quot;c&#39;&lt;&gt;");
}
