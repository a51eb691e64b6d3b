//! # pa-linescan
//!
//! Ranks the test lines of a printed pressure-advance calibration pattern
//! by how evenly they were extruded.
//!
//! Input is a photograph whose alpha channel marks the printed pattern
//! (background transparent). The pipeline rectifies the pattern's outline
//! rectangle, measures the thickness of every line column by column, and
//! scores each line with extra weight on the areas where lines differ most.
//!
//! ```no_run
//! use pa_linescan::Pipeline;
//!
//! let photo = image::open("pattern_out.png")?;
//! let output = Pipeline::new().run(&photo)?;
//! for ranked in &output.ranking {
//!     println!(
//!         "line {} S1={:.1} S2={:.1}",
//!         ranked.line_number, ranked.global_score, ranked.regional_score
//!     );
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;

pub use config::{PipelineConfig, RankingCriterion};
pub use detection::rectangle::{CornerSource, RectifiedRectangle};
pub use error::{AnalysisError, Result};
pub use models::{
    BoundingBox, Contour, ContourSummary, CornerSet, LineGroup, ProblematicRegion, ProfiledLine,
    RankedLine, ScoredLine,
};
pub use pipeline::{AnalysisReport, LineAnalysis, LineReport, Pipeline, PipelineOutput};
