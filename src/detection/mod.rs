//! Image-level stages: mask cleanup, contours, rectangle and line detection.

pub mod contours;
pub mod lines;
pub mod preprocessing;
pub mod rectangle;
