//! Numeric stages: thickness profiles, problematic regions and scores.

pub mod regions;
pub mod scoring;
pub mod stats;
pub mod thickness;
