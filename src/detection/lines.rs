use image::{DynamicImage, GrayImage};
use tracing::{debug, instrument};

use crate::config::{CleanupConfig, LineConfig};
use crate::detection::{contours, preprocessing};
use crate::error::{AnalysisError, Result};
use crate::models::{Contour, LineGroup};

const STAGE: &str = "line grouping";

/// Line groups found inside the cropped rectified image
#[derive(Debug, Clone)]
pub struct LineLayout {
    /// Bottom line first, matching the order the pattern is printed in
    pub groups: Vec<LineGroup>,
    /// Cleaned mask of the cropped area
    pub mask: GrayImage,
}

impl LineLayout {
    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }
}

/// Extract line blobs from a rectified image and cluster them into lines
#[instrument(skip_all)]
pub fn group_lines(
    rectified: &DynamicImage,
    cleanup: &CleanupConfig,
    config: &LineConfig,
) -> Result<LineLayout> {
    if !rectified.color().has_alpha() {
        return Err(AnalysisError::missing_alpha(STAGE));
    }

    let rgba = rectified.to_rgba8();
    let cropped = preprocessing::crop_border(&rgba, config.border_margin).ok_or_else(|| {
        AnalysisError::empty(format!(
            "{}x{} image leaves nothing after a {} px border crop",
            rgba.width(),
            rgba.height(),
            config.border_margin
        ))
    })?;

    let raw_mask = preprocessing::rgba_alpha_mask(&cropped);
    let mask =
        preprocessing::clean_mask(&raw_mask, cleanup.kernel_radius, cleanup.line_iterations)?;

    let blobs: Vec<Contour> = contours::find_external_contours(&mask)
        .into_iter()
        .filter(|c| c.area() >= config.min_blob_area)
        .collect();
    debug!(blobs = blobs.len(), "Line blobs after area filter");

    if blobs.is_empty() {
        return Err(AnalysisError::empty(format!(
            "no blob reaches the minimum area of {} px²",
            config.min_blob_area
        )));
    }

    let max_gap = mask.height() as f64 * config.line_gap_ratio;
    let groups = cluster_by_centroid(blobs, max_gap);
    debug!(lines = groups.len(), max_gap, "Grouped blobs into lines");

    Ok(LineLayout { groups, mask })
}

/// Sort blobs by vertical centroid and cut wherever consecutive centroids
/// are more than `max_gap` apart. The result is reversed so the bottom
/// line comes first.
pub fn cluster_by_centroid(blobs: Vec<Contour>, max_gap: f64) -> Vec<LineGroup> {
    let mut keyed: Vec<(f64, Contour)> = blobs.into_iter().map(|c| (c.centroid_y(), c)).collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups: Vec<LineGroup> = Vec::new();
    let mut current: Vec<Contour> = Vec::new();
    let mut previous: Option<f64> = None;

    for (cy, contour) in keyed {
        if let Some(prev) = previous {
            if (cy - prev).abs() > max_gap {
                groups.push(LineGroup {
                    contours: std::mem::take(&mut current),
                });
            }
        }
        current.push(contour);
        previous = Some(cy);
    }
    if !current.is_empty() {
        groups.push(LineGroup { contours: current });
    }

    groups.reverse();
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    const INK: Rgba<u8> = Rgba([20, 20, 20, 255]);

    fn config(margin: u32) -> LineConfig {
        LineConfig {
            border_margin: margin,
            ..LineConfig::default()
        }
    }

    fn centroid_ys(layout: &LineLayout) -> Vec<f64> {
        layout
            .groups
            .iter()
            .map(|g| g.contours[0].centroid_y())
            .collect()
    }

    #[test]
    fn test_separate_lines_are_reported_bottom_first() {
        // 320 px crop height, gap threshold 6.4 px
        let mut img = RgbaImage::new(420, 340);
        for y in [40, 100, 160, 220] {
            draw_filled_rect_mut(&mut img, Rect::at(40, y).of_size(300, 14), INK);
        }

        let layout = group_lines(
            &DynamicImage::ImageRgba8(img),
            &CleanupConfig::default(),
            &config(10),
        )
        .unwrap();

        assert_eq!(layout.width(), 400);
        assert_eq!(layout.height(), 320);
        assert_eq!(layout.groups.len(), 4);
        assert!(layout.groups.iter().all(|g| g.contours.len() == 1));

        let ys = centroid_ys(&layout);
        assert!(ys.windows(2).all(|w| w[0] > w[1]));
        assert!((ys[0] - (220.0 - 10.0 + 6.5)).abs() < 0.01);
    }

    #[test]
    fn test_broken_line_stays_one_group() {
        let mut img = RgbaImage::new(420, 340);
        draw_filled_rect_mut(&mut img, Rect::at(40, 100).of_size(120, 14), INK);
        draw_filled_rect_mut(&mut img, Rect::at(200, 101).of_size(140, 14), INK);
        draw_filled_rect_mut(&mut img, Rect::at(40, 200).of_size(300, 14), INK);

        let layout = group_lines(
            &DynamicImage::ImageRgba8(img),
            &CleanupConfig::default(),
            &config(10),
        )
        .unwrap();

        assert_eq!(layout.groups.len(), 2);
        assert_eq!(layout.groups[0].contours.len(), 1);
        assert_eq!(layout.groups[1].contours.len(), 2);
    }

    #[test]
    fn test_small_blobs_are_dropped() {
        let mut img = RgbaImage::new(300, 300);
        draw_filled_rect_mut(&mut img, Rect::at(40, 60).of_size(200, 14), INK);
        // survives cleanup but encloses only 9*9 = 81 px²
        draw_filled_rect_mut(&mut img, Rect::at(40, 200).of_size(10, 10), INK);

        let layout = group_lines(
            &DynamicImage::ImageRgba8(img),
            &CleanupConfig::default(),
            &config(0),
        )
        .unwrap();
        assert_eq!(layout.groups.len(), 1);
    }

    #[test]
    fn test_border_is_cropped_before_detection() {
        let mut img = RgbaImage::new(300, 300);
        // outline that lies entirely inside the default 50 px margin
        draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(300, 30), INK);
        draw_filled_rect_mut(&mut img, Rect::at(80, 140).of_size(140, 14), INK);

        let layout = group_lines(
            &DynamicImage::ImageRgba8(img),
            &CleanupConfig::default(),
            &LineConfig::default(),
        )
        .unwrap();
        assert_eq!(layout.groups.len(), 1);
        assert_eq!(layout.width(), 200);
    }

    #[test]
    fn test_empty_image_is_empty_input_error() {
        let img = RgbaImage::new(300, 300);
        let err = group_lines(
            &DynamicImage::ImageRgba8(img),
            &CleanupConfig::default(),
            &LineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput { .. }));
    }

    #[test]
    fn test_missing_alpha_is_contract_error() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(300, 300));
        let err = group_lines(&img, &CleanupConfig::default(), &LineConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InputContract { .. }));
    }

    #[test]
    fn test_cluster_threshold() {
        use imageproc::point::Point;
        let blob = |y: i32| {
            Contour::new(vec![
                Point::new(0, y),
                Point::new(10, y),
                Point::new(10, y + 4),
                Point::new(0, y + 4),
            ])
        };

        // centroids 2, 7, 20: the first two are within 5 px
        let groups = cluster_by_centroid(vec![blob(18), blob(0), blob(5)], 5.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].contours.len(), 1);
        assert_eq!(groups[1].contours.len(), 2);

        let groups = cluster_by_centroid(vec![blob(18), blob(0), blob(5)], 4.9);
        assert_eq!(groups.len(), 3);
    }
}
