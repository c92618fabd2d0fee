use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PhotowallError::EmptyDirectory(PathBuf::from("photos"))
            .to_string()
            .contains("empty directory:")
    );
    assert!(
        PhotowallError::invalid_canvas("x")
            .to_string()
            .contains("invalid canvas:")
    );
    assert!(
        PhotowallError::invalid_count("x")
            .to_string()
            .contains("invalid count:")
    );
    assert!(
        PhotowallError::corrupt_image("a.png", "bad header")
            .to_string()
            .contains("corrupt image 'a.png': bad header")
    );
    assert!(
        PhotowallError::display_unavailable("x")
            .to_string()
            .contains("display unavailable:")
    );
    assert!(PhotowallError::config("x").to_string().contains("config error:"));
}

#[test]
fn insufficient_photos_reports_both_counts() {
    let err = PhotowallError::InsufficientPhotos {
        requested: 5,
        available: 2,
    };
    let msg = err.to_string();
    assert!(msg.contains("requested 5"));
    assert!(msg.contains("only 2 available"));
}

#[test]
fn cycle_local_classification() {
    assert!(PhotowallError::EmptyDirectory(PathBuf::from("p")).is_cycle_local());
    assert!(PhotowallError::corrupt_image("a.png", "x").is_cycle_local());
    assert!(!PhotowallError::invalid_canvas("x").is_cycle_local());
    assert!(!PhotowallError::invalid_count("x").is_cycle_local());
    assert!(!PhotowallError::display_unavailable("x").is_cycle_local());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PhotowallError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
