mod common;

use common::*;
use image::{imageops, RgbaImage};

#[test]
fn test_rectified_size_matches_edge_lengths() -> anyhow::Result<()> {
    let rect = Pipeline::new().extract_rectangle(&rgba(standard_pattern()))?;

    assert_eq!(rect.corners.top_left, (100.0, 100.0));
    assert_eq!(rect.corners.bottom_right, (699.0, 499.0));

    let (w, h) = rect.corners.target_size();
    assert_eq!((w, h), (FRAME_WIDTH - 1, FRAME_HEIGHT - 1));
    assert_eq!((rect.image.width(), rect.image.height()), (w, h));
    Ok(())
}

#[test]
fn test_rotations_resolve_to_canonical_corners() -> anyhow::Result<()> {
    let photo = standard_pattern();
    let pipeline = Pipeline::new();

    let cases = [
        (imageops::rotate90(&photo), (FRAME_HEIGHT - 1, FRAME_WIDTH - 1)),
        (imageops::rotate180(&photo), (FRAME_WIDTH - 1, FRAME_HEIGHT - 1)),
        (imageops::rotate270(&photo), (FRAME_HEIGHT - 1, FRAME_WIDTH - 1)),
    ];

    for (rotated, expected_size) in cases {
        let rect = pipeline.extract_rectangle(&rgba(rotated))?;
        let c = rect.corners;

        assert!(c.top_left.0 < c.top_right.0);
        assert!(c.bottom_left.0 < c.bottom_right.0);
        assert!(c.top_left.1 < c.bottom_left.1);
        assert!(c.top_right.1 < c.bottom_right.1);
        assert_eq!((rect.image.width(), rect.image.height()), expected_size);
    }
    Ok(())
}

/// Pixels whose foreground membership differs, ignoring the resampled edges
fn alpha_mismatches(a: &RgbaImage, b: &RgbaImage) -> usize {
    let (w, h) = a.dimensions();
    let mut mismatched = 0;
    for y in 2..h - 2 {
        for x in 2..w - 2 {
            if (a.get_pixel(x, y)[3] > 0) != (b.get_pixel(x, y)[3] > 0) {
                mismatched += 1;
            }
        }
    }
    mismatched
}

#[test]
fn test_turned_photos_give_equivalent_content() -> anyhow::Result<()> {
    let pipeline = Pipeline::new();
    let photo = standard_pattern();
    let upright = pipeline.extract_rectangle(&rgba(photo.clone()))?.image.to_rgba8();
    let (w, h) = upright.dimensions();

    for degrees in [90, 180, 270] {
        let turned = match degrees {
            90 => imageops::rotate90(&photo),
            180 => imageops::rotate180(&photo),
            _ => imageops::rotate270(&photo),
        };
        let rectified = pipeline.extract_rectangle(&rgba(turned))?.image.to_rgba8();
        let restored = match degrees {
            90 => imageops::rotate270(&rectified),
            180 => imageops::rotate180(&rectified),
            _ => imageops::rotate90(&rectified),
        };

        assert_eq!(restored.dimensions(), (w, h), "{degrees}°");
        let mismatched = alpha_mismatches(&upright, &restored);
        assert!(
            mismatched < (w * h / 100) as usize,
            "{degrees}°: {mismatched} pixels differ"
        );
    }
    Ok(())
}

#[test]
fn test_transparent_photo_has_no_rectangle() {
    let photo = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, CLEAR);
    let err = Pipeline::new().extract_rectangle(&rgba(photo)).unwrap_err();
    assert!(matches!(err, AnalysisError::GeometryDetection { .. }));
    assert!(err.is_reacquirable());
}
