use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

pub const INK: Rgba<u8> = Rgba([35, 35, 35, 255]);
pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 600;

/// Outer box of the printed frame: x 100..=699, y 100..=499
pub const FRAME_X: i32 = 100;
pub const FRAME_Y: i32 = 100;
pub const FRAME_WIDTH: u32 = 600;
pub const FRAME_HEIGHT: u32 = 400;
pub const FRAME_THICKNESS: u32 = 24;

pub const LINE_X: i32 = 200;
pub const LINE_LENGTH: u32 = 400;
pub const LINE_THICKNESS: u32 = 14;
pub const FIRST_LINE_Y: i32 = 180;
pub const LINE_SPACING: i32 = 50;

/// Columns `[x, x + width)` of a line left unprinted
#[derive(Debug, Clone, Copy)]
pub struct Gap {
    pub x: i32,
    pub width: u32,
}

/// Masked photograph of an axis-aligned calibration pattern.
///
/// `lines` is listed top to bottom; each entry holds the gaps of that line.
pub fn calibration_photo(lines: &[Vec<Gap>]) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, CLEAR);

    draw_filled_rect_mut(
        &mut img,
        Rect::at(FRAME_X, FRAME_Y).of_size(FRAME_WIDTH, FRAME_HEIGHT),
        INK,
    );
    draw_filled_rect_mut(
        &mut img,
        Rect::at(FRAME_X + FRAME_THICKNESS as i32, FRAME_Y + FRAME_THICKNESS as i32).of_size(
            FRAME_WIDTH - 2 * FRAME_THICKNESS,
            FRAME_HEIGHT - 2 * FRAME_THICKNESS,
        ),
        CLEAR,
    );

    for (i, gaps) in lines.iter().enumerate() {
        let y = FIRST_LINE_Y + LINE_SPACING * i as i32;
        let line = Rect::at(LINE_X, y).of_size(LINE_LENGTH, LINE_THICKNESS);
        draw_filled_rect_mut(&mut img, line, INK);
        for gap in gaps {
            let blank = Rect::at(gap.x, y).of_size(gap.width, LINE_THICKNESS);
            draw_filled_rect_mut(&mut img, blank, CLEAR);
        }
    }

    img
}

/// Five lines where only the second from the bottom is flawless.
///
/// The two bottom-ish flawed lines share gaps in the left half and the two
/// top ones share gaps in the right half, so each half has a clear peak.
pub fn standard_pattern() -> RgbaImage {
    calibration_photo(&[
        vec![Gap { x: 510, width: 30 }],
        vec![Gap { x: 260, width: 30 }],
        vec![Gap { x: 500, width: 30 }],
        vec![],
        vec![Gap { x: 250, width: 30 }],
    ])
}

/// Line number (bottom line is 1) of the flawless line in [`standard_pattern`]
pub const STANDARD_BEST_LINE: usize = 2;

pub fn rgba(img: RgbaImage) -> DynamicImage {
    DynamicImage::ImageRgba8(img)
}
