use depthwatch_types::{DetectionRecord, ImageStatistics, Priority, RgbaFrame};
use serde::Serialize;

use crate::enhance::EnhancementMetrics;

/// Everything produced for one image, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatReport {
    pub statistics: ImageStatistics,
    pub detections: Vec<DetectionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhancement: Option<EnhancementMetrics>,
    pub processing_time_ms: u64,
}

impl ThreatReport {
    pub fn is_clear(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn count_with_priority(&self, priority: Priority) -> usize {
        self.detections
            .iter()
            .filter(|record| record.priority == priority)
            .count()
    }

    /// Priority of the first (most severe) detection.
    pub fn highest_priority(&self) -> Option<Priority> {
        self.detections.first().map(|record| record.priority)
    }
}

#[derive(Debug, Clone)]
pub struct ThreatAnalysis {
    pub report: ThreatReport,
    pub enhanced: Option<RgbaFrame>,
}
