use super::*;

fn frame(w: u32, h: u32, rgba: [u8; 4]) -> Arc<CollageFrame> {
    Arc::new(CollageFrame {
        width: w,
        height: h,
        data: rgba.repeat((w * h) as usize),
        premultiplied: true,
    })
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "photowall_display_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn png_surface_overwrites_single_file() {
    let dir = temp_dir("png");
    let out = dir.join("nested").join("latest.png");
    let small = CanvasSpec::new(4, 3).unwrap();
    let mut s = PngSurface::new(&out, small, CanvasSpec::new(8, 6).unwrap());

    s.present(&frame(4, 3, [255, 0, 0, 255])).unwrap();
    s.present(&frame(4, 3, [0, 0, 255, 255])).unwrap();

    let img = image::open(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (4, 3));
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255, 255]);

    let entries: Vec<_> = std::fs::read_dir(out.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries.len(), 1, "{entries:?}");

    s.release().unwrap();
    assert!(matches!(
        s.present(&frame(4, 3, [0; 4])),
        Err(PhotowallError::DisplayUnavailable(_))
    ));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn fullscreen_toggle_switches_canvas() {
    let windowed = CanvasSpec::new(800, 600).unwrap();
    let full = CanvasSpec::new(1920, 1080).unwrap();
    let mut s = PngSurface::new("unused.png", windowed, full);
    assert_eq!(s.canvas(), windowed);
    assert_eq!(s.set_fullscreen(true).unwrap(), full);
    assert!(s.is_fullscreen());
    assert_eq!(s.set_fullscreen(false).unwrap(), windowed);

    let s = PngSurface::new("unused.png", windowed, full).with_fullscreen(true);
    assert_eq!(s.canvas(), full);
}

#[test]
fn unwritable_target_is_display_unavailable() {
    let dir = temp_dir("blocked");
    let blocker = dir.join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let canvas = CanvasSpec::new(2, 2).unwrap();
    let mut s = PngSurface::new(blocker.join("out.png"), canvas, canvas);
    let err = s.present(&frame(2, 2, [0, 0, 0, 255])).unwrap_err();
    assert!(matches!(err, PhotowallError::DisplayUnavailable(_)));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn in_memory_surface_records_and_fails_on_demand() {
    let canvas = CanvasSpec::new(2, 2).unwrap();
    let mut s = InMemorySurface::new(canvas).failing_after(1);
    s.present(&frame(2, 2, [1, 2, 3, 255])).unwrap();
    assert_eq!(s.frames().len(), 1);
    assert!(s.present(&frame(2, 2, [1, 2, 3, 255])).is_err());
    s.release().unwrap();
    assert!(s.is_released());
}
