//! Locate the printed calibration rectangle and rectify it.
//!
//! The rectangle is the largest outer blob of the cleaned alpha mask. Its
//! outline is reduced to a polygon with progressively coarser tolerances; the
//! first tolerance that yields exactly four vertices wins. Outlines that never
//! reduce to a quadrilateral fall back to their minimum-area bounding
//! rectangle.

use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::geometry::{approximate_polygon_dp, arc_length, min_area_rect};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::{CleanupConfig, RectangleConfig};
use crate::detection::{contours, preprocessing};
use crate::error::{AnalysisError, Result};
use crate::models::{Contour, CornerSet};

const STAGE: &str = "rectangle extraction";

/// How the four corners were obtained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CornerSource {
    /// Polygon approximation succeeded at this fraction of the perimeter
    Polygon { tolerance: f64 },
    /// No tolerance gave four vertices
    MinAreaRect,
}

/// Output of rectangle extraction
#[derive(Debug, Clone)]
pub struct RectifiedRectangle {
    /// Perspective-corrected RGBA image
    pub image: DynamicImage,
    pub corners: CornerSet,
    pub source: CornerSource,
    /// Cleaned mask the corners were detected on
    pub mask: GrayImage,
}

/// Detect the rectangle in a masked photograph and warp it upright
#[instrument(skip_all, fields(width = img.width(), height = img.height()))]
pub fn extract_rectangle(
    img: &DynamicImage,
    cleanup: &CleanupConfig,
    config: &RectangleConfig,
) -> Result<RectifiedRectangle> {
    let raw_mask = preprocessing::alpha_mask(img, STAGE)?;
    let mask = preprocessing::clean_mask(
        &raw_mask,
        cleanup.kernel_radius,
        cleanup.rectangle_iterations,
    )?;

    let candidate = largest_contour(&mask, config.min_contour_area)?;
    debug!(
        area = candidate.area(),
        points = candidate.points.len(),
        "Selected rectangle candidate"
    );

    let (raw_corners, source) = detect_corners(&candidate, &config.approx_tolerances)?;
    let corners = CornerSet::from_unordered(raw_corners);
    debug!(?corners, ?source, "Corners ordered");

    let image = warp_to_rectangle(&img.to_rgba8(), &corners)?;

    Ok(RectifiedRectangle {
        image: DynamicImage::ImageRgba8(image),
        corners,
        source,
        mask,
    })
}

/// Largest outer contour strictly above `min_area`; the first one wins ties
fn largest_contour(mask: &GrayImage, min_area: f64) -> Result<Contour> {
    let all = contours::find_external_contours(mask);
    let total = all.len();

    let mut best: Option<Contour> = None;
    for contour in all.into_iter().filter(|c| c.area() > min_area) {
        let better = best.as_ref().is_none_or(|b| contour.area() > b.area());
        if better {
            best = Some(contour);
        }
    }

    debug!(contours = total, "Found external contours");

    best.ok_or_else(|| {
        AnalysisError::geometry(format!(
            "none of {total} contours exceeds the minimum area of {min_area} px²"
        ))
    })
}

/// Four corners of the candidate outline, unordered.
///
/// Only a successful four-vertex approximation or the explicit fallback is
/// ever returned; results from failed tolerances are discarded.
pub fn detect_corners(
    contour: &Contour,
    tolerances: &[f64],
) -> Result<([(f32, f32); 4], CornerSource)> {
    let points = &contour.points;
    let perimeter = arc_length(points.as_slice(), true);

    for &tolerance in tolerances {
        let epsilon = tolerance * perimeter;
        if !(epsilon > 0.0) {
            continue;
        }
        let polygon = approximate_closed_polygon(points, epsilon);
        debug!(tolerance, vertices = polygon.len(), "Polygon approximation");
        if let &[a, b, c, d] = polygon.as_slice() {
            return Ok((
                [to_f32(a), to_f32(b), to_f32(c), to_f32(d)],
                CornerSource::Polygon { tolerance },
            ));
        }
    }

    warn!("No tolerance produced four corners, using minimum-area rectangle");
    if points.len() < 3 {
        return Err(AnalysisError::geometry(format!(
            "outline with {} points cannot span a rectangle",
            points.len()
        )));
    }
    let boxed = min_area_rect(points.as_slice()).map(to_f32);
    if quad_area(&boxed) < 1.0 {
        return Err(AnalysisError::geometry("minimum-area rectangle is degenerate"));
    }
    Ok((boxed, CornerSource::MinAreaRect))
}

/// Douglas-Peucker on a closed outline.
///
/// The outline is anchored at its point farthest from the centroid and split
/// at the point farthest from that anchor, so both anchors are likely true
/// corners. Each half is simplified as an open curve.
fn approximate_closed_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let (cx, cy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    let (cx, cy) = (cx / n as f64, cy / n as f64);
    let start = farthest_from(points, (cx, cy));

    let rotated: Vec<Point<i32>> = points[start..]
        .iter()
        .chain(&points[..start])
        .copied()
        .collect();
    let anchor = (rotated[0].x as f64, rotated[0].y as f64);
    let split = farthest_from(&rotated, anchor);
    if split == 0 {
        return vec![rotated[0]];
    }

    let first = approximate_polygon_dp(&rotated[..=split], epsilon, false);
    let mut closing: Vec<Point<i32>> = rotated[split..].to_vec();
    closing.push(rotated[0]);
    let second = approximate_polygon_dp(closing.as_slice(), epsilon, false);

    let mut polygon = first;
    if second.len() > 2 {
        polygon.extend_from_slice(&second[1..second.len() - 1]);
    }
    polygon
}

/// Index of the first point with maximum distance from `origin`
fn farthest_from(points: &[Point<i32>], origin: (f64, f64)) -> usize {
    let mut best = 0;
    let mut best_dist = -1.0;
    for (i, p) in points.iter().enumerate() {
        let d = (p.x as f64 - origin.0).powi(2) + (p.y as f64 - origin.1).powi(2);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

fn to_f32(p: Point<i32>) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

fn quad_area(corners: &[(f32, f32); 4]) -> f32 {
    let mut sum = 0.0;
    for i in 0..4 {
        let (x0, y0) = corners[i];
        let (x1, y1) = corners[(i + 1) % 4];
        sum += x0 * y1 - x1 * y0;
    }
    (sum / 2.0).abs()
}

/// Warp the quadrilateral onto an axis-aligned image of `corners.target_size()`
pub fn warp_to_rectangle(img: &RgbaImage, corners: &CornerSet) -> Result<RgbaImage> {
    let (width, height) = corners.target_size();
    if width < 2 || height < 2 {
        return Err(AnalysisError::geometry(format!(
            "rectified size {width}x{height} is too small"
        )));
    }

    let (right, bottom) = ((width - 1) as f32, (height - 1) as f32);
    let dest = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];
    let projection = Projection::from_control_points(corners.as_array(), dest)
        .ok_or_else(|| AnalysisError::geometry("corners do not define a projective transform"))?;

    let mut output = RgbaImage::new(width, height);
    warp_into(img, &projection, Interpolation::Bilinear, Rgba([0, 0, 0, 0]), &mut output);
    debug!(width, height, "Perspective correction applied");
    Ok(output)
}
