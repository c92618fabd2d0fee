use super::*;

fn frame(v: u8) -> Arc<CollageFrame> {
    Arc::new(CollageFrame {
        width: 1,
        height: 1,
        data: vec![v, v, v, 255],
        premultiplied: true,
    })
}

#[test]
fn starts_empty_and_swaps_whole_frames() {
    let mut slot = FrameSlot::new();
    let reader = slot.reader();
    assert!(reader.current().is_none());

    let a = frame(1);
    assert!(slot.publish(Arc::clone(&a)).is_none());
    assert!(Arc::ptr_eq(&reader.current().unwrap(), &a));

    let held = reader.current().unwrap();
    let prev = slot.publish(frame(2)).unwrap();
    assert!(Arc::ptr_eq(&prev, &a));
    // Earlier handles keep their frame alive and unchanged.
    assert_eq!(held.data[0], 1);
    assert_eq!(reader.current().unwrap().data[0], 2);
}

#[test]
fn clear_empties_all_readers() {
    let mut slot = FrameSlot::new();
    let r1 = slot.reader();
    let r2 = r1.clone();
    slot.publish(frame(3));
    assert!(slot.clear().is_some());
    assert!(r1.current().is_none());
    assert!(r2.current().is_none());
    assert!(slot.current().is_none());
}

#[test]
fn readers_work_across_threads() {
    let mut slot = FrameSlot::new();
    let reader = slot.reader();
    slot.publish(frame(9));
    let seen = std::thread::spawn(move || reader.current().map(|f| f.data[0]))
        .join()
        .unwrap();
    assert_eq!(seen, Some(9));
}
