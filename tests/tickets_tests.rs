use anyhow::Result;
use chrono::Utc;
use std::collections::HashSet;

use lumamap::tickets::{generate_codes, render_qr, render_qr_batch};

#[test]
fn test_codes_are_distinct_within_a_batch() {
    let issued_at = Utc::now();
    let codes = generate_codes(42, "6d4c0b2e", 5, issued_at);

    assert_eq!(codes.len(), 5);
    let unique: HashSet<&String> = codes.iter().collect();
    assert_eq!(unique.len(), 5);
}

#[test]
fn test_codes_embed_buyer_event_index_and_stamp() {
    let issued_at = Utc::now();
    let stamp = issued_at.timestamp_micros();
    let codes = generate_codes(42, "6d4c0b2e", 2, issued_at);

    assert_eq!(codes[0], format!("42_6d4c0b2e_1_{stamp}"));
    assert_eq!(codes[1], format!("42_6d4c0b2e_2_{stamp}"));
}

#[test]
fn test_batches_issued_at_different_times_never_collide() {
    let first = Utc::now();
    let second = first + chrono::Duration::microseconds(1);

    let a = generate_codes(42, "6d4c0b2e", 1, first);
    let b = generate_codes(42, "6d4c0b2e", 1, second);
    assert_ne!(a[0], b[0]);
}

#[test]
fn test_qr_render_writes_a_png_named_after_the_code() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let path = render_qr("42_6d4c0b2e_1_1700000000000000", dir.path())?;

    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("42_6d4c0b2e_1_1700000000000000.png")
    );
    let metadata = std::fs::metadata(&path)?;
    assert!(metadata.len() > 0);

    // The file must actually decode as an image.
    assert!(image::open(&path).is_ok());

    Ok(())
}

#[test]
fn test_qr_render_creates_the_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let nested = dir.path().join("tickets");

    let path = render_qr("code", &nested)?;
    assert!(path.exists());

    Ok(())
}

#[tokio::test]
async fn test_qr_batch_renders_one_png_per_code() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let codes = generate_codes(42, "6d4c0b2e", 3, Utc::now());

    let paths = render_qr_batch(codes.clone(), dir.path().join("tickets")).await?;

    assert_eq!(paths.len(), 3);
    for (code, path) in codes.iter().zip(&paths) {
        let expected = format!("{code}.png");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(expected.as_str())
        );
        assert!(path.exists());
    }

    Ok(())
}
