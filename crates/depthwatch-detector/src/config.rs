use rand::rngs::StdRng;

use crate::backend::DetectorKind;
use crate::random::{entropy_rng, seeded_rng};

#[derive(Clone, Debug)]
pub struct ThreatDetectionOptions {
    /// Generate detections; when off only statistics (and enhancement) are produced.
    pub detect_threats: bool,
    pub enhance: bool,
    pub detector: DetectorKind,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ThreatDetectionOptions {
    fn default() -> Self {
        Self {
            detect_threats: true,
            enhance: true,
            detector: DetectorKind::Auto,
            seed: None,
        }
    }
}

impl ThreatDetectionOptions {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => seeded_rng(seed),
            None => entropy_rng(),
        }
    }
}
