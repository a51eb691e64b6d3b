//! Tunable parameters for the rectangle and line analysis stages.
//!
//! The defaults match the printed calibration pattern photographed from
//! roughly 30 cm with a 1080p camera. Different print or camera geometries
//! should override the border margin and morphology kernel rather than
//! rely on these values.
//!
//! ```no_run
//! use pa_linescan::PipelineConfig;
//! use std::path::Path;
//!
//! let config = PipelineConfig::from_json_file(Path::new("linescan.json"))?;
//! # Ok::<(), pa_linescan::AnalysisError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AnalysisError, Result};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cleanup: CleanupConfig,
    pub rectangle: RectangleConfig,
    pub lines: LineConfig,
    pub scoring: ScoringConfig,
}

/// Morphological mask cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Half-width of the square neighbourhood (2 gives a 5x5 kernel)
    pub kernel_radius: u8,

    /// Open/close repetitions before rectangle detection
    pub rectangle_iterations: u8,

    /// Open/close repetitions before line blob detection
    pub line_iterations: u8,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            kernel_radius: 2,
            rectangle_iterations: 4,
            line_iterations: 2,
        }
    }
}

/// Rectangle corner detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectangleConfig {
    /// Contours must be strictly larger than this (px²)
    pub min_contour_area: f64,

    /// Polygon approximation tolerances as fractions of the perimeter,
    /// tried in order
    pub approx_tolerances: Vec<f64>,
}

impl Default for RectangleConfig {
    fn default() -> Self {
        Self {
            min_contour_area: 1000.0,
            approx_tolerances: vec![0.01, 0.02, 0.03, 0.05, 0.07, 0.10],
        }
    }
}

/// Line blob grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Pixels cropped from every side of the rectified image
    pub border_margin: u32,

    /// Blobs smaller than this (px²) are dropped
    pub min_blob_area: f64,

    /// Centroid gap, as a fraction of the cropped height, that starts a new line
    pub line_gap_ratio: f64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            border_margin: 50,
            min_blob_area: 100.0,
            line_gap_ratio: 0.02,
        }
    }
}

/// Which score orders the final result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingCriterion {
    /// Order by the problematic-region score (S2)
    #[default]
    Regional,
    /// Order by the whole-line score (S1)
    Global,
}

/// Smoothness scoring and ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Added once per column with no foreground
    pub gap_penalty: f64,

    /// Problematic region half-width as a fraction of the image width
    pub region_radius_ratio: f64,

    /// Number of ranked lines returned
    pub top_n: usize,

    pub ranking: RankingCriterion,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            gap_penalty: 1000.0,
            region_radius_ratio: 0.1,
            top_n: 5,
            ranking: RankingCriterion::Regional,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::config_with_source(format!("cannot read {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            AnalysisError::config_with_source(format!("cannot parse {}", path.display()), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::config_with_source("cannot serialize config", e))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject parameter combinations the stages cannot work with
    pub fn validate(&self) -> Result<()> {
        let cleanup = &self.cleanup;
        for (name, iterations) in [
            ("rectangle_iterations", cleanup.rectangle_iterations),
            ("line_iterations", cleanup.line_iterations),
        ] {
            if cleanup.kernel_radius.checked_mul(iterations).is_none() {
                return Err(AnalysisError::config(format!(
                    "kernel_radius {} times {name} {iterations} exceeds {}",
                    cleanup.kernel_radius,
                    u8::MAX
                )));
            }
        }
        if self.rectangle.approx_tolerances.is_empty() {
            return Err(AnalysisError::config("approx_tolerances must not be empty"));
        }
        if let Some(t) = self
            .rectangle
            .approx_tolerances
            .iter()
            .find(|t| !(**t > 0.0 && t.is_finite()))
        {
            return Err(AnalysisError::config(format!(
                "approx tolerance must be positive, got {t}"
            )));
        }
        if !(self.lines.line_gap_ratio > 0.0 && self.lines.line_gap_ratio < 1.0) {
            return Err(AnalysisError::config(format!(
                "line_gap_ratio must be in (0, 1), got {}",
                self.lines.line_gap_ratio
            )));
        }
        if !(self.scoring.region_radius_ratio >= 0.0 && self.scoring.region_radius_ratio <= 1.0) {
            return Err(AnalysisError::config(format!(
                "region_radius_ratio must be in [0, 1], got {}",
                self.scoring.region_radius_ratio
            )));
        }
        if self.scoring.gap_penalty < 0.0 {
            return Err(AnalysisError::config("gap_penalty must not be negative"));
        }
        if self.scoring.top_n == 0 {
            return Err(AnalysisError::config("top_n must be at least 1"));
        }
        Ok(())
    }
}
