use std::path::PathBuf;

use super::*;

fn cell(x: u32, y: u32, width: u32, height: u32) -> CellRect {
    CellRect {
        x,
        y,
        width,
        height,
    }
}

fn within(inner: Rect, outer: Rect) -> bool {
    const EPS: f64 = 1e-9;
    inner.x0 >= outer.x0 - EPS
        && inner.y0 >= outer.y0 - EPS
        && inner.x1 <= outer.x1 + EPS
        && inner.y1 <= outer.y1 + EPS
}

fn temp_png(name: &str, w: u32, h: u32) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "photowall_fit_{name}_{}_{}.png",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]))
        .save(&path)
        .unwrap();
    path
}

#[test]
fn contain_letterboxes_wide_photo() {
    let p = place(FitMode::Contain, (400, 100), cell(0, 0, 200, 200));
    assert_eq!(p.scale, 0.5);
    assert_eq!(p.offset, Vec2::new(0.0, 75.0));
    assert_eq!(p.source, Rect::new(0.0, 0.0, 400.0, 100.0));
    assert_eq!(p.dest, Rect::new(0.0, 75.0, 200.0, 125.0));
}

#[test]
fn contain_pillarboxes_tall_photo_inside_offset_cell() {
    let p = place(FitMode::Contain, (100, 300), cell(400, 300, 400, 300));
    assert_eq!(p.scale, 1.0);
    assert_eq!(p.offset, Vec2::new(150.0, 0.0));
    assert_eq!(p.dest, Rect::new(550.0, 300.0, 650.0, 600.0));
}

#[test]
fn contain_upscales_small_photos() {
    let p = place(FitMode::Contain, (10, 10), cell(0, 0, 100, 50));
    assert_eq!(p.scale, 5.0);
    assert_eq!(p.dest, Rect::new(25.0, 0.0, 75.0, 50.0));
}

#[test]
fn cover_crops_center_and_fills_cell() {
    let c = cell(10, 20, 200, 100);
    let p = place(FitMode::Cover, (400, 400), c);
    assert_eq!(p.scale, 0.5);
    assert_eq!(p.dest, c.to_rect());
    assert_eq!(p.source, Rect::new(0.0, 100.0, 400.0, 300.0));
    assert_eq!(p.offset, Vec2::new(0.0, -50.0));
}

#[test]
fn placements_never_leave_their_cell() {
    let cells = [
        cell(0, 0, 1, 1),
        cell(3, 7, 333, 17),
        cell(100, 0, 17, 333),
        cell(0, 0, 1920, 1080),
    ];
    let photos = [(1, 1), (4000, 3000), (3000, 4000), (7, 1), (1, 7), (641, 479)];
    for mode in [FitMode::Contain, FitMode::Cover] {
        for c in cells {
            for dims in photos {
                let p = place(mode, dims, c);
                assert!(p.scale > 0.0);
                assert!(
                    within(p.dest, c.to_rect()),
                    "{mode:?} {dims:?} in {c:?} -> {:?}",
                    p.dest
                );
                let photo_rect = Rect::new(0.0, 0.0, f64::from(dims.0), f64::from(dims.1));
                assert!(within(p.source, photo_rect));
            }
        }
    }
}

#[test]
fn fit_decodes_and_keeps_reference() {
    let path = temp_png("ok", 64, 32);
    let fitter = ImageFitter::new(FitMode::Contain);
    let placed = fitter
        .fit(PhotoRef::new(&path), cell(0, 0, 32, 32))
        .unwrap();
    assert_eq!(placed.photo.path(), path.as_path());
    assert!(placed.photo.pixels().is_some());
    assert_eq!(placed.scale, 0.5);
    assert_eq!(placed.dest, Rect::new(0.0, 8.0, 32.0, 24.0));
    std::fs::remove_file(&path).ok();
}

#[test]
fn fit_reports_corrupt_image() {
    let path = std::env::temp_dir().join(format!("photowall_fit_bad_{}.jpg", std::process::id()));
    std::fs::write(&path, b"\xff\xd8 truncated").unwrap();
    let err = ImageFitter::default()
        .fit(PhotoRef::new(&path), cell(0, 0, 10, 10))
        .unwrap_err();
    assert!(matches!(err, PhotowallError::CorruptImage { .. }));
    std::fs::remove_file(&path).ok();
}

#[test]
fn fit_rejects_empty_cell() {
    let err = ImageFitter::default()
        .fit(PhotoRef::new("unused.png"), cell(0, 0, 0, 10))
        .unwrap_err();
    assert!(matches!(err, PhotowallError::InvalidCanvas(_)));
}

#[test]
fn fit_mode_parses_aliases() {
    assert_eq!("contain".parse::<FitMode>().unwrap(), FitMode::Contain);
    assert_eq!(" Cover ".parse::<FitMode>().unwrap(), FitMode::Cover);
    assert_eq!("crop".parse::<FitMode>().unwrap(), FitMode::Cover);
    assert!("stretch".parse::<FitMode>().is_err());
}
