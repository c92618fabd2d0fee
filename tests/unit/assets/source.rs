use std::collections::HashSet;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "photowall_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn touch(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"x").unwrap();
}

fn dir_with(name: &str, files: &[&str]) -> PathBuf {
    let dir = temp_dir(name);
    std::fs::create_dir_all(&dir).unwrap();
    for f in files {
        touch(&dir, f);
    }
    dir
}

#[test]
fn scan_filters_extensions_case_insensitively() {
    let dir = dir_with(
        "scan_ext",
        &["a.jpg", "b.JPEG", "c.png", "notes.txt", "d.WebP", ".hidden.png", "noext"],
    );
    let found = scan_photos(&dir, false).unwrap();
    let names = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["a.jpg", "b.JPEG", "c.png", "d.WebP"]);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn scan_is_non_recursive_unless_requested() {
    let dir = dir_with("scan_rec", &["top.png"]);
    let sub = dir.join("nested");
    std::fs::create_dir_all(&sub).unwrap();
    touch(&sub, "deep.jpg");

    assert_eq!(scan_photos(&dir, false).unwrap().len(), 1);
    assert_eq!(scan_photos(&dir, true).unwrap().len(), 2);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn empty_or_missing_directory_is_empty_directory() {
    let dir = dir_with("empty", &["readme.md"]);
    let mut src = ImageSource::seeded(&dir, SamplePolicy::Lenient, 1);
    assert!(matches!(
        src.sample(3),
        Err(PhotowallError::EmptyDirectory(_))
    ));
    std::fs::remove_dir_all(&dir).ok();

    let mut missing = ImageSource::seeded(temp_dir("missing"), SamplePolicy::Lenient, 1);
    assert!(matches!(
        missing.sample(1),
        Err(PhotowallError::EmptyDirectory(_))
    ));
}

#[test]
fn sample_has_no_duplicates() {
    let names = (0..20).map(|i| format!("p{i:02}.jpg")).collect::<Vec<_>>();
    let refs = names.iter().map(String::as_str).collect::<Vec<_>>();
    let dir = dir_with("no_dupes", &refs);
    let mut src = ImageSource::seeded(&dir, SamplePolicy::Strict, 7);

    for n in 1..=20 {
        let picked = src.sample(n).unwrap();
        assert_eq!(picked.len(), n);
        let uniq = picked.iter().collect::<HashSet<_>>();
        assert_eq!(uniq.len(), n, "duplicate photo for n={n}");
        assert_eq!(src.reserve_len(), 20 - n);
    }
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn more_requested_than_available_follows_policy() {
    let dir = dir_with("policy", &["one.png", "two.png"]);

    let mut strict = ImageSource::seeded(&dir, SamplePolicy::Strict, 3);
    match strict.sample(5) {
        Err(PhotowallError::InsufficientPhotos {
            requested,
            available,
        }) => {
            assert_eq!(requested, 5);
            assert_eq!(available, 2);
        }
        other => panic!("expected InsufficientPhotos, got {other:?}"),
    }

    let mut lenient = ImageSource::seeded(&dir, SamplePolicy::Lenient, 3);
    let picked = lenient.sample(5).unwrap();
    assert_eq!(picked.len(), 2);
    let uniq = picked.iter().collect::<HashSet<_>>();
    assert_eq!(uniq.len(), 2);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn seeded_sampling_is_reproducible() {
    let names = (0..12).map(|i| format!("img{i}.png")).collect::<Vec<_>>();
    let refs = names.iter().map(String::as_str).collect::<Vec<_>>();
    let dir = dir_with("seeded", &refs);

    let mut a = ImageSource::seeded(&dir, SamplePolicy::Lenient, 42);
    let mut b = ImageSource::seeded(&dir, SamplePolicy::Lenient, 42);
    for _ in 0..3 {
        assert_eq!(a.sample(4).unwrap(), b.sample(4).unwrap());
    }
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn replacements_are_unused_photos_from_the_same_scan() {
    let dir = dir_with("replace", &["a.png", "b.png", "c.png", "d.png"]);
    let mut src = ImageSource::seeded(&dir, SamplePolicy::Lenient, 9);

    let picked = src.sample(2).unwrap();
    let mut seen = picked.iter().cloned().collect::<HashSet<_>>();
    while let Some(r) = src.replacement() {
        assert!(seen.insert(r), "replacement repeated a photo");
    }
    assert_eq!(seen.len(), 4);
    assert!(src.replacement().is_none());

    // A new sample refills the reserve.
    src.sample(1).unwrap();
    assert_eq!(src.reserve_len(), 3);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn photo_ref_load_reports_corrupt_files() {
    let dir = dir_with("corrupt_ref", &["broken.png"]);
    let mut photo = PhotoRef::new(dir.join("broken.png"));
    assert!(photo.pixels().is_none());
    assert!(matches!(
        photo.load(),
        Err(PhotowallError::CorruptImage { .. })
    ));
    std::fs::remove_dir_all(&dir).ok();
}
