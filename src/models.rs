use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Closed outline of one connected foreground blob
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
    area: f64,
    centroid: Option<(f64, f64)>,
}

impl Contour {
    /// Build a contour and derive its polygon moments
    pub fn new(points: Vec<Point<i32>>) -> Self {
        let n = points.len();
        let (mut m00, mut m10, mut m01) = (0.0f64, 0.0f64, 0.0f64);

        for i in 0..n {
            let p = points[i];
            let q = points[(i + 1) % n];
            let (x0, y0, x1, y1) = (p.x as f64, p.y as f64, q.x as f64, q.y as f64);
            let cross = x0 * y1 - x1 * y0;
            m00 += cross;
            m10 += cross * (x0 + x1);
            m01 += cross * (y0 + y1);
        }

        m00 /= 2.0;
        m10 /= 6.0;
        m01 /= 6.0;

        let centroid = if m00 != 0.0 {
            Some((m10 / m00, m01 / m00))
        } else {
            None
        };

        Self {
            points,
            area: m00.abs(),
            centroid,
        }
    }

    /// Enclosed polygon area (px²)
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Area-weighted centroid, `None` when the outline encloses no area
    pub fn centroid(&self) -> Option<(f64, f64)> {
        self.centroid
    }

    /// Vertical centroid, falling back to the first point for degenerate outlines
    pub fn centroid_y(&self) -> f64 {
        match self.centroid {
            Some((_, cy)) => cy,
            None => self.points.first().map(|p| p.y as f64).unwrap_or(0.0),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let min_x = self.points.iter().map(|p| p.x).min().unwrap_or(0);
        let max_x = self.points.iter().map(|p| p.x).max().unwrap_or(0);
        let min_y = self.points.iter().map(|p| p.y).min().unwrap_or(0);
        let max_y = self.points.iter().map(|p| p.y).max().unwrap_or(0);
        BoundingBox {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        }
    }

    /// Export-friendly summary including the raw outline
    pub fn summary(&self) -> ContourSummary {
        ContourSummary {
            area: self.area,
            centroid: self.centroid,
            bbox: self.bounding_box(),
            outline: self.points.iter().map(|p| (p.x, p.y)).collect(),
        }
    }
}

/// Plain-value view of a [`Contour`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourSummary {
    pub area: f64,
    pub centroid: Option<(f64, f64)>,
    pub bbox: BoundingBox,
    pub outline: Vec<(i32, i32)>,
}

/// The four rectangle corners in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerSet {
    pub top_left: (f32, f32),
    pub top_right: (f32, f32),
    pub bottom_right: (f32, f32),
    pub bottom_left: (f32, f32),
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

impl CornerSet {
    /// Order arbitrary corners as (top-left, top-right, bottom-right, bottom-left).
    ///
    /// Corners are sorted by y, split into a top and bottom pair, and each
    /// pair is sorted by x. Both sorts are stable so ties keep input order.
    pub fn from_unordered(mut corners: [(f32, f32); 4]) -> Self {
        corners.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (top, bottom) = corners.split_at_mut(2);
        top.sort_by(|a, b| a.0.total_cmp(&b.0));
        bottom.sort_by(|a, b| a.0.total_cmp(&b.0));

        Self {
            top_left: top[0],
            top_right: top[1],
            bottom_right: bottom[1],
            bottom_left: bottom[0],
        }
    }

    pub fn as_array(&self) -> [(f32, f32); 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Output size of the rectified image: the longer of each pair of
    /// opposite edges, each floored before comparison
    pub fn target_size(&self) -> (u32, u32) {
        let width_top = distance(self.top_left, self.top_right) as u32;
        let width_bottom = distance(self.bottom_left, self.bottom_right) as u32;
        let height_left = distance(self.top_left, self.bottom_left) as u32;
        let height_right = distance(self.top_right, self.bottom_right) as u32;
        (width_top.max(width_bottom), height_left.max(height_right))
    }
}

/// Contours judged to belong to one printed test line
#[derive(Debug, Clone)]
pub struct LineGroup {
    pub contours: Vec<Contour>,
}

/// A line with its per-column thickness profile attached
#[derive(Debug, Clone)]
pub struct ProfiledLine {
    pub contours: Vec<Contour>,
    /// One entry per column of the cropped image, 0 where the line is absent
    pub thickness: Vec<u32>,
}

/// A fully analysed line
#[derive(Debug, Clone)]
pub struct ScoredLine {
    pub contours: Vec<Contour>,
    pub thickness: Vec<u32>,
    /// S1: smoothness over the whole line
    pub global_score: f64,
    /// S2: smoothness within the problematic regions
    pub regional_score: f64,
}

/// Half-open column range `[start, end)` where lines disagree the most
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblematicRegion {
    pub start: usize,
    pub end: usize,
    /// Column of maximum cross-line thickness deviation
    pub peak: usize,
}

impl ProblematicRegion {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, column: usize) -> bool {
        column >= self.start && column < self.end
    }
}

/// One entry of the ranked result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedLine {
    /// 1-based line number in drawing order
    pub line_number: usize,
    pub global_score: f64,
    pub regional_score: f64,
}
