use super::*;

#[test]
fn rasterize_svg_scales_by_density_and_keeps_background_transparent() {
    // 72pt x 36pt page = 1in x 0.5in; at 96 per inch CSS pixels map 1:1.
    let svg = "<svg xmlns='http://www.w3.org/2000/svg' width='72pt' height='36pt' viewBox='0 0 72 36'>\
               <rect x='18' y='9' width='36' height='18' fill='black'/></svg>";
    let tree = parse_svg(svg).unwrap();
    let img = rasterize_svg(&tree, 96).unwrap();
    assert_eq!(img.dimensions(), (96, 48));

    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(img.get_pixel(48, 24).0[3], 255);
    assert_eq!(img.get_pixel(95, 47).0[3], 0);
}

#[test]
fn rasterize_svg_rejects_zero_density() {
    let svg = "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'/>";
    let tree = parse_svg(svg).unwrap();
    assert!(matches!(
        rasterize_svg(&tree, 0),
        Err(MathlineError::Validation(_))
    ));
}

#[test]
fn demultiply_restores_straight_color() {
    let mut px = vec![64u8, 0, 128, 128, 10, 20, 30, 0];
    demultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![128, 0, 255, 128, 10, 20, 30, 0]);
}

#[cfg(unix)]
fn fake_convert(dir: &std::path::Path, body: &str) -> MagickRasterizer {
    use std::os::unix::fs::PermissionsExt as _;
    let path = dir.join("fake-convert");
    std::fs::write(&path, format!("#!/bin/sh\nfor last; do :; done\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    MagickRasterizer::new(path.to_string_lossy(), Duration::from_secs(10))
}

#[cfg(unix)]
fn page(scratch: &Scratch) -> TypesetPage {
    TypesetPage {
        pdf_path: scratch.artifact("pdf"),
        metrics: crate::PageMetrics {
            snippet_width: 10.0,
            snippet_height: 5.0,
            snippet_depth: 1.0,
            margins: crate::Margins::uniform(4.0),
        },
    }
}

#[cfg(unix)]
#[test]
fn undecodable_raster_is_a_conversion_error() {
    let bin = tempfile::tempdir().unwrap();
    let magick = fake_convert(bin.path(), "printf 'not a png' > \"$last\"");
    let scratch = Scratch::new().unwrap();

    let err = magick.rasterize(&page(&scratch), 72, &scratch).unwrap_err();
    assert!(matches!(err, MathlineError::Conversion(_)), "{err}");
    assert!(err.to_string().contains("no readable raster"));
}

#[cfg(unix)]
#[test]
fn missing_raster_is_a_conversion_error() {
    let bin = tempfile::tempdir().unwrap();
    let magick = fake_convert(bin.path(), "exit 0");
    let scratch = Scratch::new().unwrap();

    let err = magick.rasterize(&page(&scratch), 72, &scratch).unwrap_err();
    assert!(matches!(err, MathlineError::Conversion(_)), "{err}");
}

#[cfg(unix)]
#[test]
fn magick_output_is_decoded() {
    let bin = tempfile::tempdir().unwrap();
    let fixture = bin.path().join("page.png");
    image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 0, 0, 255]))
        .save(&fixture)
        .unwrap();
    let magick = fake_convert(bin.path(), &format!("cp '{}' \"$last\"", fixture.display()));
    let scratch = Scratch::new().unwrap();

    let img = magick.rasterize(&page(&scratch), 72, &scratch).unwrap();
    assert_eq!((img.width(), img.height()), (3, 2));
}
