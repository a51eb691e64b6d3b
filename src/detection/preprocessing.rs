use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

use crate::error::{AnalysisError, Result};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Binary foreground mask from the alpha channel (alpha > 0 is foreground)
pub fn alpha_mask(img: &DynamicImage, stage: &'static str) -> Result<GrayImage> {
    if !img.color().has_alpha() {
        return Err(AnalysisError::missing_alpha(stage));
    }
    Ok(rgba_alpha_mask(&img.to_rgba8()))
}

pub fn rgba_alpha_mask(img: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[3] > 0 {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Remove thin artifacts and fill small holes.
///
/// Opens then closes the mask with a square neighbourhood of half-width
/// `kernel_radius`. Repeating a square erosion n times equals one erosion
/// with n times the radius, so `iterations` scales the radius. The scaled
/// radius must fit in a `u8`.
pub fn clean_mask(mask: &GrayImage, kernel_radius: u8, iterations: u8) -> Result<GrayImage> {
    let k = kernel_radius.checked_mul(iterations).ok_or_else(|| {
        AnalysisError::config(format!(
            "kernel radius {kernel_radius} over {iterations} iterations exceeds {}",
            u8::MAX
        ))
    })?;
    if k == 0 {
        return Ok(mask.clone());
    }
    let opened = open(mask, Norm::LInf, k);
    Ok(close(&opened, Norm::LInf, k))
}

/// Drop `margin` pixels from every side, `None` if nothing would remain
pub fn crop_border(img: &RgbaImage, margin: u32) -> Option<RgbaImage> {
    let (width, height) = img.dimensions();
    let inner_w = width.checked_sub(margin.saturating_mul(2)).filter(|w| *w > 0)?;
    let inner_h = height.checked_sub(margin.saturating_mul(2)).filter(|h| *h > 0)?;
    Some(image::imageops::crop_imm(img, margin, margin, inner_w, inner_h).to_image())
}
