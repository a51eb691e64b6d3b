use tracing::debug;

use crate::detection::contours;
use crate::models::{LineGroup, ProfiledLine};

/// Attach a thickness profile to every line group.
///
/// Each line's contours are filled onto one `width` x `height` mask; the
/// thickness of a column is the span from its first to last foreground row.
pub fn profile_lines(groups: Vec<LineGroup>, width: u32, height: u32) -> Vec<ProfiledLine> {
    groups
        .into_iter()
        .map(|group| {
            let thickness = thickness_profile(&group, width, height);
            ProfiledLine {
                contours: group.contours,
                thickness,
            }
        })
        .collect()
}

pub fn thickness_profile(group: &LineGroup, width: u32, height: u32) -> Vec<u32> {
    let filled = contours::fill_contours(&group.contours, width, height);

    let profile: Vec<u32> = (0..width)
        .map(|x| {
            let mut rows = (0..height).filter(|&y| filled.get_pixel(x, y)[0] > 0);
            match rows.next() {
                Some(top) => {
                    let bottom = rows.last().unwrap_or(top);
                    bottom - top + 1
                }
                None => 0,
            }
        })
        .collect();

    debug!(
        columns = profile.len(),
        covered = profile.iter().filter(|t| **t > 0).count(),
        "Thickness profile"
    );
    profile
}
