use super::*;

#[test]
fn defaults_match_documented_values() {
    let o = RenderOpts::default();
    assert_eq!(o.density, 512);
    assert_eq!(o.factor, 1.0);
    assert_eq!(o.process_timeout, Duration::from_secs(2));
    assert_eq!(o.margin, MarginSpec::Uniform(4.0));
    assert_eq!(o.output, OutputKind::Symmetric);
    assert_eq!(o.class_name.as_deref(), Some("latex"));
    assert!(o.include_static_style);
    assert_eq!(o.tools.latex, "pdflatex");
    o.validate().unwrap();
}

#[test]
fn partial_json_fills_in_defaults() {
    let o: RenderOpts = serde_json::from_str(
        r#"{"density": 300, "processTimeout": 2.5, "output": "vector", "margin": {"left":1,"top":2,"right":3,"bottom":4}}"#,
    )
    .unwrap();
    assert_eq!(o.density, 300);
    assert_eq!(o.process_timeout, Duration::from_millis(2500));
    assert_eq!(o.output, OutputKind::Vector);
    assert_eq!(o.output.crop_strategy(), None);
    assert_eq!(o.margin.resolve().bottom, 4.0);
    assert_eq!(o.factor, 1.0);
    assert_eq!(o.tools.dvisvgm, "dvisvgm");
}

#[test]
fn validation_rejects_unusable_values() {
    let bad = [
        RenderOpts {
            density: 0,
            ..Default::default()
        },
        RenderOpts {
            factor: -1.0,
            ..Default::default()
        },
        RenderOpts {
            process_timeout: Duration::ZERO,
            ..Default::default()
        },
        RenderOpts {
            margin: MarginSpec::Uniform(-2.0),
            ..Default::default()
        },
    ];
    for o in bad {
        assert!(matches!(o.validate(), Err(MathlineError::Validation(_))), "{o:?}");
    }
}

#[test]
fn options_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("opts.json");
    std::fs::write(&path, r#"{"factor": 1.25, "output": "split"}"#).unwrap();
    let o = RenderOpts::from_path(&path).unwrap();
    assert_eq!(o.factor, 1.25);
    assert_eq!(o.output.crop_strategy(), Some(CropStrategy::Split));

    std::fs::write(&path, r#"{"density": 0}"#).unwrap();
    assert!(RenderOpts::from_path(&path).is_err());
}
