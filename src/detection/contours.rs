use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::detection::preprocessing::FOREGROUND;
use crate::models::Contour;

/// Outer borders of all top-level foreground blobs.
///
/// Contours nested inside holes of other blobs are not returned.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour::new(c.points))
        .collect()
}

/// Rasterize the given contours, interiors filled, onto an empty mask
pub fn fill_contours<'a, I>(contours: I, width: u32, height: u32) -> GrayImage
where
    I: IntoIterator<Item = &'a Contour>,
{
    let mut canvas = GrayImage::new(width, height);
    for contour in contours {
        fill_contour(&mut canvas, contour);
    }
    canvas
}

fn fill_contour(canvas: &mut GrayImage, contour: &Contour) {
    let color = Luma([FOREGROUND]);
    let mut points: Vec<Point<i32>> = contour.points.clone();
    // polygon drawing rejects an explicitly closed outline
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    match points.len() {
        0 => {}
        1 => {
            let p = points[0];
            if p.x >= 0
                && p.y >= 0
                && (p.x as u32) < canvas.width()
                && (p.y as u32) < canvas.height()
            {
                canvas.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        2 => draw_line_segment_mut(
            canvas,
            (points[0].x as f32, points[0].y as f32),
            (points[1].x as f32, points[1].y as f32),
            color,
        ),
        _ => draw_polygon_mut(canvas, &points, color),
    }
}
