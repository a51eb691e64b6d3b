use image::{DynamicImage, GrayImage, ImageReader};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

use crate::analysis::{regions, scoring, thickness};
use crate::config::PipelineConfig;
use crate::detection::lines;
use crate::detection::rectangle::{self, CornerSource, RectifiedRectangle};
use crate::error::Result;
use crate::models::{ContourSummary, CornerSet, ProblematicRegion, RankedLine, ScoredLine};

/// Scored lines of one rectified image
#[derive(Debug, Clone)]
pub struct LineAnalysis {
    /// Bottom line first; index + 1 is the line number
    pub lines: Vec<ScoredLine>,
    pub regions: Vec<ProblematicRegion>,
    /// Cleaned mask of the cropped area that was analysed
    pub mask: GrayImage,
}

impl LineAnalysis {
    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }
}

/// Everything one pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub rectangle: RectifiedRectangle,
    pub analysis: LineAnalysis,
    /// Best first, truncated to the configured count
    pub ranking: Vec<RankedLine>,
}

impl PipelineOutput {
    pub fn best_line(&self) -> Option<usize> {
        self.ranking.first().map(|r| r.line_number)
    }

    /// Write the intermediate masks, the rectified image and the JSON report
    /// into `dir`
    pub fn write_debug_outputs(&self, dir: &Path) -> Result<()> {
        self.rectangle.mask.save(dir.join("01_mask.png"))?;
        self.rectangle.image.save(dir.join("02_rectified.png"))?;
        self.analysis.mask.save(dir.join("03_line_mask.png"))?;
        self.report().write_json(&dir.join("report.json"))
    }

    /// Plain-value export of corners, profiles, regions and ranking
    pub fn report(&self) -> AnalysisReport {
        let lines = self
            .analysis
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| LineReport {
                line_number: i + 1,
                contours: line.contours.iter().map(|c| c.summary()).collect(),
                thickness: line.thickness.clone(),
                global_score: line.global_score,
                regional_score: line.regional_score,
            })
            .collect();

        AnalysisReport {
            corners: self.rectangle.corners,
            corner_source: self.rectangle.source,
            rectified_size: (self.rectangle.image.width(), self.rectangle.image.height()),
            analyzed_size: (self.analysis.width(), self.analysis.height()),
            regions: self.analysis.regions.clone(),
            lines,
            ranking: self.ranking.clone(),
        }
    }
}

/// Serializable summary of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub corners: CornerSet,
    pub corner_source: CornerSource,
    pub rectified_size: (u32, u32),
    pub analyzed_size: (u32, u32),
    pub regions: Vec<ProblematicRegion>,
    pub lines: Vec<LineReport>,
    pub ranking: Vec<RankedLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineReport {
    pub line_number: usize,
    pub contours: Vec<ContourSummary>,
    pub thickness: Vec<u32>,
    pub global_score: f64,
    pub regional_score: f64,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Open and decode a masked photograph
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Masked photograph in, ranked lines out.
///
/// Every stage is a pure function of the previous stage's output, so one
/// `Pipeline` can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Pipeline with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline with a custom configuration, validated up front
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Locate and rectify the printed rectangle
    pub fn extract_rectangle(&self, input: &DynamicImage) -> Result<RectifiedRectangle> {
        rectangle::extract_rectangle(input, &self.config.cleanup, &self.config.rectangle)
    }

    /// Group, profile and score the lines of an already rectified image
    pub fn analyze_lines(&self, rectified: &DynamicImage) -> Result<LineAnalysis> {
        let layout = lines::group_lines(rectified, &self.config.cleanup, &self.config.lines)?;
        let (width, height) = (layout.width(), layout.height());

        let profiled = thickness::profile_lines(layout.groups, width, height);
        let regions = regions::find_problematic_regions(
            &profiled,
            width as usize,
            self.config.scoring.region_radius_ratio,
        );
        let scored = scoring::score_lines(profiled, &regions, self.config.scoring.gap_penalty);

        Ok(LineAnalysis {
            lines: scored,
            regions,
            mask: layout.mask,
        })
    }

    /// Run every stage on a masked photograph
    #[instrument(skip_all)]
    pub fn run(&self, input: &DynamicImage) -> Result<PipelineOutput> {
        let rectangle = self.extract_rectangle(input)?;
        info!(
            width = rectangle.image.width(),
            height = rectangle.image.height(),
            "Rectangle rectified"
        );

        let analysis = self.analyze_lines(&rectangle.image)?;
        info!(
            lines = analysis.lines.len(),
            regions = analysis.regions.len(),
            "Lines analysed"
        );

        let ranking = scoring::rank_lines(
            &analysis.lines,
            self.config.scoring.ranking,
            self.config.scoring.top_n,
        );

        Ok(PipelineOutput {
            rectangle,
            analysis,
            ranking,
        })
    }
}
