use super::*;

#[test]
fn canvas_rejects_empty_and_oversized_edges() {
    assert!(matches!(
        CanvasSpec::new(0, 10),
        Err(PhotowallError::InvalidCanvas(_))
    ));
    assert!(matches!(
        CanvasSpec::new(10, 0),
        Err(PhotowallError::InvalidCanvas(_))
    ));
    assert!(matches!(
        CanvasSpec::new(MAX_CANVAS_EDGE + 1, 10),
        Err(PhotowallError::InvalidCanvas(_))
    ));
    assert!(matches!(
        CanvasSpec::from_signed(-800, 600),
        Err(PhotowallError::InvalidCanvas(_))
    ));

    let c = CanvasSpec::from_signed(800, 600).unwrap();
    assert_eq!((c.width(), c.height()), (800, 600));
    assert_eq!(c.area(), 480_000);
    assert!(c.is_landscape());
    assert!(!CanvasSpec::new(600, 800).unwrap().is_landscape());
}

#[test]
fn photo_count_rejects_zero_and_negative() {
    assert!(matches!(
        PhotoCount::new(0),
        Err(PhotowallError::InvalidCount(_))
    ));
    assert!(matches!(
        PhotoCount::from_signed(-3),
        Err(PhotowallError::InvalidCount(_))
    ));
    assert_eq!(PhotoCount::new(6).unwrap().get(), 6);
}

#[test]
fn photo_count_has_an_upper_bound() {
    assert_eq!(
        PhotoCount::new(MAX_PHOTO_COUNT).unwrap().get(),
        MAX_PHOTO_COUNT
    );
    for n in [MAX_PHOTO_COUNT + 1, u32::MAX] {
        assert!(matches!(
            PhotoCount::new(n),
            Err(PhotowallError::InvalidCount(_))
        ));
    }
    assert!(matches!(
        PhotoCount::from_signed(i64::from(u32::MAX)),
        Err(PhotowallError::InvalidCount(_))
    ));
}

#[test]
fn cell_overlap_is_half_open() {
    let a = CellRect {
        x: 0,
        y: 0,
        width: 10,
        height: 10,
    };
    let right = CellRect { x: 10, ..a };
    let below = CellRect { y: 10, ..a };
    let shifted = CellRect { x: 9, y: 9, ..a };
    assert!(!a.overlaps(right));
    assert!(!a.overlaps(below));
    assert!(a.overlaps(shifted));
    assert!(a.is_inside(CanvasSpec::new(10, 10).unwrap()));
    assert!(!shifted.is_inside(CanvasSpec::new(10, 10).unwrap()));
}

#[test]
fn hex_colors_parse_and_premultiply() {
    assert_eq!(Rgba8::parse_hex("#ffffff").unwrap(), Rgba8::WHITE);
    assert_eq!(
        Rgba8::parse_hex("10203080").unwrap(),
        Rgba8 {
            r: 0x10,
            g: 0x20,
            b: 0x30,
            a: 0x80
        }
    );
    assert!(Rgba8::parse_hex("#fff").is_err());
    assert!(Rgba8::parse_hex("#gggggg").is_err());

    assert_eq!(Rgba8::WHITE.premultiplied(), [255, 255, 255, 255]);
    let half = Rgba8 {
        r: 200,
        g: 100,
        b: 0,
        a: 128,
    };
    assert_eq!(half.premultiplied(), [100, 50, 0, 128]);
    assert_eq!(half.to_hex(), "#c8640080");
}
