mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from pa_linescan for tests
pub use pa_linescan::{AnalysisError, Pipeline, PipelineConfig, PipelineOutput, RankingCriterion};
