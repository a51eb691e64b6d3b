use tracing::debug;

use crate::analysis::stats::population_std;
use crate::models::{ProblematicRegion, ProfiledLine};

/// Find the columns where the lines disagree the most, one per image half.
///
/// For each half the column with the largest population standard deviation
/// of thickness across lines is the peak (leftmost on ties; a half where
/// every column has zero spread has no peak). The region spans `radius`
/// columns on either side of the peak, clipped to the half.
pub fn find_problematic_regions(
    lines: &[ProfiledLine],
    width: usize,
    radius_ratio: f64,
) -> Vec<ProblematicRegion> {
    if lines.is_empty() || width == 0 {
        return Vec::new();
    }

    let radius = (width as f64 * radius_ratio) as usize;
    let mid = width / 2;

    let mut regions = Vec::with_capacity(2);
    for (start, end) in [(0, mid), (mid, width)] {
        if let Some(peak) = peak_column(lines, start, end) {
            let region = ProblematicRegion {
                start: peak.saturating_sub(radius).max(start),
                end: (peak + radius + 1).min(end),
                peak,
            };
            debug!(?region, "Problematic region");
            regions.push(region);
        }
    }
    regions
}

fn peak_column(lines: &[ProfiledLine], start: usize, end: usize) -> Option<usize> {
    let mut max_std = 0.0;
    let mut peak = None;
    for x in start..end {
        let samples = lines
            .iter()
            .map(|line| line.thickness.get(x).copied().unwrap_or(0) as f64);
        if let Some(std) = population_std(samples) {
            if std > max_std {
                max_std = std;
                peak = Some(x);
            }
        }
    }
    peak
}
