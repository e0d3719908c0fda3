use std::time::Instant;

use depthwatch_types::{DetectionError, DetectionResult, RgbaFrame};

use crate::config::ThreatDetectionOptions;
use crate::enhance::{EnhancementMetrics, color_correct};
use crate::pipeline::{DetectionPipeline, now_millis};
use crate::random::RandomSource;
use crate::report::{ThreatAnalysis, ThreatReport};
use crate::statistics::extract_frame;

/// Candidates tried, in order, when the detector kind is `auto`.
const AUTO_DETECTOR_PRIORITY: &[DetectorKind] = &[DetectorKind::Model, DetectorKind::Synthetic];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Auto,
    /// Trained model inference; not bundled with this build.
    Model,
    Synthetic,
}

impl DetectorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectorKind::Auto => "auto",
            DetectorKind::Model => "model",
            DetectorKind::Synthetic => "synthetic",
        }
    }
}

pub trait ThreatDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn analyze(
        &self,
        frame: &RgbaFrame,
        rng: &mut dyn RandomSource,
    ) -> DetectionResult<ThreatAnalysis>;
}

trait DetectorBackend: Sync {
    fn kind(&self) -> DetectorKind;
    fn ensure_available(&self, options: &ThreatDetectionOptions) -> DetectionResult<()>;
    fn build(&self, options: &ThreatDetectionOptions) -> DetectionResult<Box<dyn ThreatDetector>>;
}

struct SyntheticBackend;

impl DetectorBackend for SyntheticBackend {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Synthetic
    }

    fn ensure_available(&self, _options: &ThreatDetectionOptions) -> DetectionResult<()> {
        Ok(())
    }

    fn build(&self, options: &ThreatDetectionOptions) -> DetectionResult<Box<dyn ThreatDetector>> {
        Ok(Box::new(SyntheticDetector::from_options(options)))
    }
}

static SYNTHETIC_BACKEND: SyntheticBackend = SyntheticBackend;

fn backend_for_kind(kind: DetectorKind) -> Option<&'static dyn DetectorBackend> {
    match kind {
        DetectorKind::Auto | DetectorKind::Model => None,
        DetectorKind::Synthetic => Some(&SYNTHETIC_BACKEND),
    }
}

pub fn build_detector(
    kind: DetectorKind,
    options: &ThreatDetectionOptions,
) -> DetectionResult<Box<dyn ThreatDetector>> {
    match kind {
        DetectorKind::Auto => build_auto(options),
        _ => {
            let backend = backend_for_kind(kind)
                .ok_or_else(|| DetectionError::unsupported(kind.as_str()))?;
            backend.ensure_available(options)?;
            backend.build(options)
        }
    }
}

fn build_auto(options: &ThreatDetectionOptions) -> DetectionResult<Box<dyn ThreatDetector>> {
    let mut last_err: Option<DetectionError> = None;
    for &candidate in AUTO_DETECTOR_PRIORITY {
        let Some(backend) = backend_for_kind(candidate) else {
            let err = DetectionError::unsupported(candidate.as_str());
            log::warn!(
                "auto detector candidate '{}' unavailable: {err}",
                candidate.as_str()
            );
            last_err = Some(err);
            continue;
        };
        match backend
            .ensure_available(options)
            .and_then(|()| backend.build(options))
        {
            Ok(detector) => {
                log::debug!("auto detector resolved to '{}'", backend.kind().as_str());
                return Ok(detector);
            }
            Err(err) => {
                log::warn!(
                    "auto detector candidate '{}' failed to initialize: {err}",
                    candidate.as_str()
                );
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| DetectionError::unsupported(DetectorKind::Auto.as_str())))
}

/// Statistics-driven generator used when no trained detector is available.
#[derive(Debug, Clone)]
pub struct SyntheticDetector {
    pipeline: DetectionPipeline<'static>,
    detect_threats: bool,
    enhance: bool,
}

impl Default for SyntheticDetector {
    fn default() -> Self {
        Self::new(DetectionPipeline::default())
    }
}

impl SyntheticDetector {
    pub fn new(pipeline: DetectionPipeline<'static>) -> Self {
        Self {
            pipeline,
            detect_threats: true,
            enhance: false,
        }
    }

    pub fn from_options(options: &ThreatDetectionOptions) -> Self {
        Self {
            pipeline: DetectionPipeline::default(),
            detect_threats: options.detect_threats,
            enhance: options.enhance,
        }
    }

    pub fn with_enhancement(mut self, enhance: bool) -> Self {
        self.enhance = enhance;
        self
    }

    /// Runs statistics, detection and optional enhancement with a fixed
    /// creation time.
    ///
    /// Draw order: the movement flag, the detection pipeline, then the six
    /// enhancement metric draws.
    pub fn analyze_at(
        &self,
        frame: &RgbaFrame,
        rng: &mut dyn RandomSource,
        created_at: u64,
    ) -> DetectionResult<ThreatAnalysis> {
        let started = Instant::now();
        let statistics = extract_frame(frame, rng)?;
        let detections = if self.detect_threats {
            self.pipeline.run_at(&statistics, rng, created_at)
        } else {
            Vec::new()
        };
        let (enhanced, enhancement) = if self.enhance {
            (
                Some(color_correct(frame)?),
                Some(EnhancementMetrics::sample(rng)),
            )
        } else {
            (None, None)
        };

        Ok(ThreatAnalysis {
            report: ThreatReport {
                statistics,
                detections,
                enhancement,
                processing_time_ms: started.elapsed().as_millis() as u64,
            },
            enhanced,
        })
    }
}

impl ThreatDetector for SyntheticDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Synthetic
    }

    fn analyze(
        &self,
        frame: &RgbaFrame,
        rng: &mut dyn RandomSource,
    ) -> DetectionResult<ThreatAnalysis> {
        self.analyze_at(frame, rng, now_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded_rng;

    #[test]
    fn auto_falls_back_to_synthetic() {
        let detector = build_detector(DetectorKind::Auto, &ThreatDetectionOptions::default()).unwrap();
        assert_eq!(detector.kind(), DetectorKind::Synthetic);
    }

    #[test]
    fn explicit_model_detector_is_unsupported() {
        let err = build_detector(DetectorKind::Model, &ThreatDetectionOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, DetectionError::Unsupported { backend: "model" }));
    }

    #[test]
    fn disabled_detection_still_reports_statistics() {
        let options = ThreatDetectionOptions {
            detect_threats: false,
            enhance: false,
            ..ThreatDetectionOptions::default()
        };
        let detector = build_detector(DetectorKind::Synthetic, &options).unwrap();
        let frame = RgbaFrame::filled(4, 4, [0, 0, 0, 255]).unwrap();
        let analysis = detector.analyze(&frame, &mut seeded_rng(1)).unwrap();
        assert!(analysis.report.is_clear());
        assert!(analysis.enhanced.is_none());
        assert!(analysis.report.enhancement.is_none());
        assert_eq!(analysis.report.statistics.water_clarity, 0.2);
    }

    #[test]
    fn enhancement_produces_frame_and_metrics() {
        let detector = SyntheticDetector::default().with_enhancement(true);
        let frame = RgbaFrame::filled(3, 3, [100, 100, 100, 255]).unwrap();
        let analysis = detector.analyze(&frame, &mut seeded_rng(2)).unwrap();
        let enhanced = analysis.enhanced.unwrap();
        assert_eq!(&enhanced.data()[..4], &[130, 120, 90, 255]);
        assert!(analysis.report.enhancement.is_some());
    }

    #[test]
    fn invalid_frames_never_reach_the_detector() {
        assert!(RgbaFrame::from_owned(3, 3, vec![0; 10]).is_err());
    }
}
