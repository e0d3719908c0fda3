//! Heuristic statistics extraction and synthetic threat generation for
//! underwater imagery.
//!
//! Every stage takes an explicit [`RandomSource`]; pass a seeded generator
//! from [`seeded_rng`] to make runs reproducible.

pub mod backend;
pub mod catalog;
pub mod enhance;
pub mod geometry;
pub mod pipeline;
pub mod random;
pub mod scoring;
pub mod selector;
pub mod statistics;

mod config;
mod report;

pub use backend::{DetectorKind, SyntheticDetector, ThreatDetector, build_detector};
pub use catalog::{Extent, ThreatCatalog, ThreatProfile};
pub use config::ThreatDetectionOptions;
pub use enhance::{EnhancementMetrics, color_correct};
pub use pipeline::DetectionPipeline;
pub use random::{RandomSource, ReplaySource, entropy_rng, seeded_rng};
pub use report::{ThreatAnalysis, ThreatReport};
pub use statistics::{extract, extract_frame};

pub use depthwatch_types as types;
