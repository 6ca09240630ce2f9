use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::pipeline::opts::OutputKind;

/// Typesetter reporting fixed snippet metrics with whatever margins it is asked for.
#[derive(Default)]
struct FakeTypesetter {
    height: f64,
    depth: f64,
    calls: AtomicUsize,
    scratch_dirs: Mutex<Vec<PathBuf>>,
    fail: bool,
}

impl FakeTypesetter {
    fn new(height: f64, depth: f64) -> Self {
        Self {
            height,
            depth,
            ..Default::default()
        }
    }
}

impl Typesetter for FakeTypesetter {
    fn typeset(
        &self,
        expression: &str,
        margins: &Margins,
        scratch: &Scratch,
    ) -> MathlineResult<TypesetPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scratch_dirs
            .lock()
            .unwrap()
            .push(scratch.path().to_path_buf());
        if self.fail || expression.contains("\\undefined") {
            return Err(MathlineError::typesetting("Undefined control sequence"));
        }
        Ok(TypesetPage {
            pdf_path: scratch.artifact("pdf"),
            metrics: PageMetrics {
                snippet_width: 20.0,
                snippet_height: self.height,
                snippet_depth: self.depth,
                margins: *margins,
            },
        })
    }
}

/// Rasterizer inking the snippet box exactly, at `density / 72` pixels per point.
struct BoxRasterizer;

impl Rasterizer for BoxRasterizer {
    fn rasterize(
        &self,
        page: &TypesetPage,
        density: u32,
        _scratch: &Scratch,
    ) -> MathlineResult<image::DynamicImage> {
        let s = f64::from(density) / 72.0;
        let m = &page.metrics;
        let px = |pt: f64| (pt * s).round() as u32;
        let (x0, y0) = (px(m.margins.left), px(m.margins.top));
        let (x1, y1) = (
            px(m.margins.left + m.snippet_width),
            px(m.margins.top + m.snippet_height + m.snippet_depth),
        );
        Ok(image::DynamicImage::ImageRgba8(image::RgbaImage::from_fn(
            px(m.page_width()),
            px(m.page_height()),
            |x, y| {
                if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                    image::Rgba([0, 0, 0, 255])
                } else {
                    image::Rgba([0, 0, 0, 0])
                }
            },
        )))
    }
}

/// Rasterizer inking only a horizontal bar `above..below` pt around the baseline, the way an
/// axis-centered glyph such as a minus sign renders.
struct BarRasterizer {
    top_above_baseline: f64,
    bottom_above_baseline: f64,
}

impl Rasterizer for BarRasterizer {
    fn rasterize(
        &self,
        page: &TypesetPage,
        density: u32,
        _scratch: &Scratch,
    ) -> MathlineResult<image::DynamicImage> {
        let s = f64::from(density) / 72.0;
        let m = &page.metrics;
        let px = |pt: f64| (pt * s).round() as u32;
        let baseline = m.margins.top + m.snippet_height;
        let (y0, y1) = (
            px(baseline - self.top_above_baseline),
            px(baseline - self.bottom_above_baseline),
        );
        let (x0, x1) = (px(m.margins.left), px(m.margins.left + m.snippet_width));
        Ok(image::DynamicImage::ImageRgba8(image::RgbaImage::from_fn(
            px(m.page_width()),
            px(m.page_height()),
            |x, y| {
                if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                    image::Rgba([0, 0, 0, 255])
                } else {
                    image::Rgba([0, 0, 0, 0])
                }
            },
        )))
    }
}

/// Vectorizer declaring the page size in points.
struct PageSvg;

impl Vectorizer for PageSvg {
    fn vectorize(&self, page: &TypesetPage, _scratch: &Scratch) -> MathlineResult<String> {
        let m = &page.metrics;
        Ok(format!(
            "<?xml version='1.0' encoding='UTF-8'?>\n<svg xmlns='http://www.w3.org/2000/svg' width='{w}pt' height='{h}pt' viewBox='0 0 {w} {h}'><path d='M1 1H2V2H1Z'/></svg>",
            w = m.page_width(),
            h = m.page_height()
        ))
    }
}

fn pipeline(opts: RenderOpts, typesetter: Arc<FakeTypesetter>) -> Pipeline {
    Pipeline::with_tools(opts, typesetter, Arc::new(BoxRasterizer), Arc::new(PageSvg)).unwrap()
}

fn raster_opts(output: OutputKind) -> RenderOpts {
    RenderOpts {
        density: 72,
        output,
        ..Default::default()
    }
}

#[test]
fn symmetric_render_pads_around_the_baseline() {
    let ts = Arc::new(FakeTypesetter::new(10.0, 5.0));
    let artifact = pipeline(raster_opts(OutputKind::Symmetric), ts)
        .render("$x_2$")
        .unwrap();
    let Artifact::Raster(r) = artifact else {
        panic!("expected raster");
    };
    assert_eq!(r.expression, "x_2");
    assert_eq!((r.geometry.top_px, r.geometry.bottom_px), (10, 5));
    let RasterImages::Symmetric(img) = &r.images else {
        panic!("expected symmetric image");
    };
    assert_eq!(img.dimensions(), (20, 20));

    let html = r.html(&["x.png"]);
    assert!(html.contains(r#"alt="x_2""#));
    assert!(html.contains(r#"class="latex""#));
    // 72 px/in: 9 px per em.
    assert!(html.contains("height:2.2222em;vertical-align:-1.1111em;"));
}

#[test]
fn glyph_above_the_baseline_renders_lifted() {
    // Box 6pt over 1pt, ink a bar 2pt to 3pt above the baseline.
    let ts = Arc::new(FakeTypesetter::new(6.0, 1.0));
    let bar = Arc::new(BarRasterizer {
        top_above_baseline: 3.0,
        bottom_above_baseline: 2.0,
    });
    let render = |output| {
        Pipeline::with_tools(raster_opts(output), ts.clone(), bar.clone(), Arc::new(PageSvg))
            .unwrap()
            .render("-")
    };

    let Artifact::Raster(single) = render(OutputKind::Single).unwrap() else {
        panic!("expected raster");
    };
    assert_eq!((single.geometry.top_px, single.geometry.bottom_px), (3, -2));
    // 72 px/in: 9 px per em; the 1px bar is lifted 2px.
    assert!(single.html(&["m.png"]).contains("height:0.1111em;vertical-align:0.2222em"));

    let Artifact::Raster(sym) = render(OutputKind::Symmetric).unwrap() else {
        panic!("expected raster");
    };
    let RasterImages::Symmetric(img) = &sym.images else {
        panic!("expected symmetric image");
    };
    assert_eq!(img.height(), 6);
    assert_eq!(img.get_pixel(0, 0).0[3], 255);
    assert!((1..6).all(|y| img.get_pixel(0, y).0[3] == 0));

    assert!(matches!(
        render(OutputKind::Split),
        Err(MathlineError::Validation(_))
    ));
}

#[test]
fn vector_render_corrects_fractional_page_height_once() {
    // 4.3 + 0 + 4 + 4 = 12.3pt => 16.4px, corrected to 17px.
    let ts = Arc::new(FakeTypesetter::new(4.3, 0.0));
    let opts = RenderOpts {
        output: OutputKind::Vector,
        ..Default::default()
    };
    let artifact = pipeline(opts, ts.clone()).render("A").unwrap();
    let Artifact::Vector(v) = artifact else {
        panic!("expected vector");
    };
    assert_eq!(ts.calls.load(Ordering::SeqCst), 2);
    assert!((v.height_px - 17.0).abs() < 1e-3, "{}", v.height_px);
    assert!(v.markup.starts_with("<svg"));
    assert!((v.metrics.margins.top - 4.225).abs() < 1e-4);
    assert_eq!(v.metrics.margins.left, 4.0);
}

#[test]
fn vector_render_skips_correction_when_integral_or_disabled() {
    // 4 + 0 + 4 + 4 = 12pt => 16px.
    let ts = Arc::new(FakeTypesetter::new(4.0, 0.0));
    let opts = RenderOpts {
        output: OutputKind::Vector,
        ..Default::default()
    };
    pipeline(opts.clone(), ts.clone()).render("A").unwrap();
    assert_eq!(ts.calls.load(Ordering::SeqCst), 1);

    let ts = Arc::new(FakeTypesetter::new(4.3, 0.0));
    let opts = RenderOpts {
        correct_page_height: false,
        ..opts
    };
    pipeline(opts, ts.clone()).render("A").unwrap();
    assert_eq!(ts.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn failures_release_scratch_and_keep_their_kind() {
    let ts = Arc::new(FakeTypesetter {
        fail: true,
        ..FakeTypesetter::new(10.0, 5.0)
    });
    let err = pipeline(raster_opts(OutputKind::Single), ts.clone())
        .render("x")
        .unwrap_err();
    assert!(matches!(err, MathlineError::Typesetting(_)));
    let dirs = ts.scratch_dirs.lock().unwrap();
    assert_eq!(dirs.len(), 1);
    assert!(!dirs[0].exists());
}

#[test]
fn render_many_keeps_input_order_and_isolates_failures() {
    let ts = Arc::new(FakeTypesetter::new(10.0, 5.0));
    let p = pipeline(raster_opts(OutputKind::Single), ts.clone());
    let exprs = ["a", "\\undefined", "c", "d"];
    let results = p.render_many(&exprs[..], Some(2)).unwrap();
    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(MathlineError::Typesetting(_))));
    let Ok(Artifact::Raster(r)) = &results[2] else {
        panic!("expected raster");
    };
    assert_eq!(r.expression, "c");

    let dirs = ts.scratch_dirs.lock().unwrap();
    let mut unique = dirs.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 4);
    assert!(dirs.iter().all(|d| !d.exists()));

    assert!(p.render_many(&exprs[..], Some(0)).is_err());
}

#[test]
fn split_render_writes_top_and_bottom_files() {
    let ts = Arc::new(FakeTypesetter::new(10.0, 5.0));
    let Artifact::Raster(r) = pipeline(raster_opts(OutputKind::Split), ts)
        .render("x")
        .unwrap()
    else {
        panic!("expected raster");
    };
    let dir = tempfile::tempdir().unwrap();
    let html = r.save_with_html(dir.path().join("out/f.png")).unwrap();
    let top = image::open(dir.path().join("out/f-top.png")).unwrap();
    let bottom = image::open(dir.path().join("out/f-bottom.png")).unwrap();
    assert_eq!(top.height(), 10);
    assert_eq!(bottom.height(), 5);
    assert!(html.contains(r#"src="f-top.png""#));
    assert!(html.contains(r#"src="f-bottom.png""#));
}

#[test]
fn measure_returns_metrics_only() {
    let ts = Arc::new(FakeTypesetter::new(10.0, 5.0));
    let m = pipeline(raster_opts(OutputKind::Single), ts)
        .measure("$x$")
        .unwrap();
    assert_eq!(m.snippet_depth, 5.0);
    assert_eq!(m.margins, Margins::uniform(4.0));
}

#[test]
fn invalid_options_are_rejected_up_front() {
    let ts = Arc::new(FakeTypesetter::new(10.0, 5.0));
    let opts = RenderOpts {
        density: 0,
        ..Default::default()
    };
    assert!(matches!(
        Pipeline::with_tools(opts, ts, Arc::new(BoxRasterizer), Arc::new(PageSvg)),
        Err(MathlineError::Validation(_))
    ));
}

#[test]
fn sibling_paths_keep_extension() {
    assert_eq!(
        sibling(Path::new("/a/b/f.png"), "top"),
        PathBuf::from("/a/b/f-top.png")
    );
    assert_eq!(sibling(Path::new("f"), "bottom"), PathBuf::from("f-bottom.png"));
}
