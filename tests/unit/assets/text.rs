use super::*;

#[test]
fn missing_font_file_is_an_error() {
    let path = std::env::temp_dir().join("photowall_no_such_font.ttf");
    assert!(OverlayFont::from_file(&path).is_err());
    assert!(OverlayFont::resolve(Some(&path)).is_err());
}

#[test]
fn garbage_font_bytes_are_config_errors() {
    let err = OverlayFont::from_bytes(b"definitely not a font".to_vec(), 0, "test").unwrap_err();
    assert!(matches!(err, PhotowallError::Config(_)), "{err}");

    let path = std::env::temp_dir().join(format!("photowall_garbage_{}.ttf", std::process::id()));
    std::fs::write(&path, b"\0\x01\0\0 not really a font").unwrap();
    assert!(matches!(
        OverlayFont::from_file(&path),
        Err(PhotowallError::Config(_))
    ));
    std::fs::remove_file(&path).ok();
}

#[test]
fn face_index_past_the_collection_is_rejected() {
    let Some(font) = OverlayFont::system_sans_serif() else {
        return;
    };
    let bytes = font.bytes.as_ref().clone();
    assert!(OverlayFont::from_bytes(bytes, 4096, "test").is_err());
}

#[test]
fn collection_face_is_shaped_with_its_own_index() {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    let family_count = |name: &str| {
        db.faces()
            .filter(|f| f.families.first().is_some_and(|(n, _)| n == name))
            .count()
    };
    // A later face of a collection whose family no other installed face shares.
    let Some(face) = db.faces().find(|f| {
        f.index > 0 && f.families.first().is_some_and(|(n, _)| family_count(n) == 1)
    }) else {
        return;
    };
    let Some(bytes) = db.with_face_data(face.id, |data, _| data.to_vec()) else {
        return;
    };

    let font = OverlayFont::from_bytes(bytes, face.index, "collection").unwrap();
    assert_eq!(font.family, face.families[0].0);

    let mut engine = TextLayoutEngine::new();
    let layout = engine
        .layout_plain("Hi", &font, 24.0, TextBrushRgba8::from(Rgba8::WHITE), None)
        .unwrap();
    let mut indices = Vec::new();
    for line in layout.lines() {
        for item in line.items() {
            if let parley::layout::PositionedLayoutItem::GlyphRun(run) = item {
                indices.push(run.run().font().index);
            }
        }
    }
    assert!(indices.contains(&face.index), "{indices:?} for {font:?}");
}

#[test]
fn brush_keeps_straight_channels() {
    let b = TextBrushRgba8::from(Rgba8 {
        r: 1,
        g: 2,
        b: 3,
        a: 4,
    });
    assert_eq!((b.r, b.g, b.b, b.a), (1, 2, 3, 4));
}

#[test]
fn layout_with_system_font_has_extent() {
    let Some(font) = OverlayFont::system_sans_serif() else {
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let brush = TextBrushRgba8::from(Rgba8::WHITE);

    assert!(engine.layout_plain("x", &font, 0.0, brush, None).is_err());

    let short = engine.layout_plain("Hi", &font, 24.0, brush, None).unwrap();
    let long = engine
        .layout_plain("Happy anniversary", &font, 24.0, brush, None)
        .unwrap();
    let (sw, sh) = layout_extent(&short);
    let (lw, lh) = layout_extent(&long);
    assert!(sw > 0.0 && sh > 0.0);
    assert!(lw > sw);
    assert!((lh - sh).abs() < 1e-6);

    // Narrow width wraps onto more lines.
    let wrapped = engine
        .layout_plain("Happy anniversary", &font, 24.0, brush, Some((lw * 0.5) as f32))
        .unwrap();
    assert!(layout_extent(&wrapped).1 > lh);
}
