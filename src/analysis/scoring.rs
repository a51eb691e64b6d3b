use tracing::debug;

use crate::analysis::stats::{count_zeros, nonzero_std};
use crate::config::RankingCriterion;
use crate::models::{ProblematicRegion, ProfiledLine, RankedLine, ScoredLine};

/// Defect score of a thickness slice: spread of the printed columns plus a
/// penalty for every missing column
pub fn defect_score(thickness: &[u32], gap_penalty: f64) -> f64 {
    nonzero_std(thickness) + gap_penalty * count_zeros(thickness) as f64
}

/// Sum of the defect scores inside each region, scored independently
pub fn regional_score(thickness: &[u32], regions: &[ProblematicRegion], gap_penalty: f64) -> f64 {
    regions
        .iter()
        .map(|r| {
            let end = r.end.min(thickness.len());
            let start = r.start.min(end);
            defect_score(&thickness[start..end], gap_penalty)
        })
        .sum()
}

/// Compute S1 and S2 for every line
pub fn score_lines(
    lines: Vec<ProfiledLine>,
    regions: &[ProblematicRegion],
    gap_penalty: f64,
) -> Vec<ScoredLine> {
    lines
        .into_iter()
        .map(|line| {
            let global_score = defect_score(&line.thickness, gap_penalty);
            let regional_score = regional_score(&line.thickness, regions, gap_penalty);
            ScoredLine {
                contours: line.contours,
                thickness: line.thickness,
                global_score,
                regional_score,
            }
        })
        .collect()
}

/// Order lines by the chosen score, lowest first, and keep the best `top_n`.
///
/// The sort is stable so equal scores keep drawing order.
pub fn rank_lines(
    lines: &[ScoredLine],
    criterion: RankingCriterion,
    top_n: usize,
) -> Vec<RankedLine> {
    let mut ranked: Vec<RankedLine> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| RankedLine {
            line_number: i + 1,
            global_score: line.global_score,
            regional_score: line.regional_score,
        })
        .collect();

    match criterion {
        RankingCriterion::Regional => {
            ranked.sort_by(|a, b| a.regional_score.total_cmp(&b.regional_score))
        }
        RankingCriterion::Global => {
            ranked.sort_by(|a, b| a.global_score.total_cmp(&b.global_score))
        }
    }
    ranked.truncate(top_n);

    debug!(?criterion, best = ?ranked.first().map(|r| r.line_number), "Lines ranked");
    ranked
}
