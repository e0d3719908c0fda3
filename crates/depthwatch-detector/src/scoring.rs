use depthwatch_types::{
    BoundingBox, Depth, DetectionMetrics, DetectionQuality, ImageStatistics, SizeClass, ThreatKind,
};

use crate::catalog::ThreatProfile;
use crate::random::RandomSource;

pub const MIN_CONFIDENCE: f64 = 0.3;
pub const MAX_CONFIDENCE: f64 = 0.95;
pub const MAX_THREAT_LEVEL: u8 = 10;

/// Reference area used for kinds missing from a lookup.
pub const DEFAULT_BASE_SIZE: f64 = 0.05;
pub const DEFAULT_METHOD_LABEL: &str = "Visual pattern recognition";

// Distance at which an object of its base size fills exactly that share of the frame.
const DISTANCE_SCALE_METERS: f64 = 50.0;
const LARGE_AREA: f64 = 0.1;
const MEDIUM_AREA: f64 = 0.05;

/// Typical share of the frame covered by each kind at the reference distance.
pub fn base_size(kind: ThreatKind) -> f64 {
    match kind {
        ThreatKind::Submarine => 0.15,
        ThreatKind::Torpedo => 0.08,
        ThreatKind::Mine => 0.06,
        ThreatKind::Diver => 0.05,
        ThreatKind::Drone => 0.04,
        ThreatKind::Debris => 0.03,
    }
}

pub fn detection_method_label(kind: ThreatKind) -> &'static str {
    match kind {
        ThreatKind::Submarine => "Sonar signature + Visual confirmation",
        ThreatKind::Torpedo => "Motion tracking + Shape analysis",
        ThreatKind::Mine => "Magnetic anomaly + Visual pattern",
        ThreatKind::Diver => "Thermal signature + Movement pattern",
        ThreatKind::Drone => "Acoustic signature + Visual tracking",
        ThreatKind::Debris => DEFAULT_METHOD_LABEL,
    }
}

/// Looks up a kind by its serialized name, e.g. from an external report.
///
/// Unknown names fall back to [`DEFAULT_BASE_SIZE`] instead of failing.
pub fn base_size_by_name(name: &str) -> f64 {
    ThreatKind::from_name(name).map_or(DEFAULT_BASE_SIZE, base_size)
}

/// Name-keyed counterpart of [`detection_method_label`], defaulting to
/// [`DEFAULT_METHOD_LABEL`].
pub fn detection_method_label_by_name(name: &str) -> &'static str {
    ThreatKind::from_name(name).map_or(DEFAULT_METHOD_LABEL, detection_method_label)
}

/// Murky water lowers confidence; one draw adds ±20 % jitter.
pub fn confidence<R>(profile: &ThreatProfile, stats: &ImageStatistics, rng: &mut R) -> f64
where
    R: RandomSource + ?Sized,
{
    let jitter = rng.uniform(0.8, 1.2);
    (profile.base_confidence * stats.water_clarity * jitter).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

pub fn size_class(area: f64) -> SizeClass {
    if area > LARGE_AREA {
        SizeClass::Large
    } else if area > MEDIUM_AREA {
        SizeClass::Medium
    } else {
        SizeClass::Small
    }
}

pub fn detection_quality(water_clarity: f64) -> DetectionQuality {
    if water_clarity > 0.7 {
        DetectionQuality::High
    } else if water_clarity > 0.4 {
        DetectionQuality::Medium
    } else {
        DetectionQuality::Low
    }
}

pub fn estimated_distance_meters(kind: ThreatKind, area: f64) -> f64 {
    (base_size(kind) / area).sqrt() * DISTANCE_SCALE_METERS
}

pub fn threat_level(kind: ThreatKind, area: f64, depth: Depth) -> u8 {
    let mut level = 1u8;

    if area > LARGE_AREA {
        level += 2;
    } else if area > MEDIUM_AREA {
        level += 1;
    }

    level += match kind {
        ThreatKind::Submarine | ThreatKind::Torpedo => 3,
        ThreatKind::Mine | ThreatKind::Drone => 2,
        ThreatKind::Diver => 1,
        ThreatKind::Debris => 0,
    };

    // Shallow contacts are closer to surface assets.
    if depth == Depth::Shallow {
        level += 1;
    }

    level.min(MAX_THREAT_LEVEL)
}

/// Deterministic metrics for a placed detection; consumes no draws.
pub fn metrics(kind: ThreatKind, bbox: &BoundingBox, stats: &ImageStatistics) -> DetectionMetrics {
    let area = bbox.area();
    DetectionMetrics {
        size_class: size_class(area),
        aspect_ratio: bbox.aspect_ratio(),
        estimated_distance_meters: estimated_distance_meters(kind, area),
        threat_level: threat_level(kind, area, stats.depth),
        detection_quality: detection_quality(stats.water_clarity),
    }
}

/// Confidence and metrics in one call. The pipeline calls the two halves
/// separately because confidence must be drawn before the box is synthesized.
pub fn score<R>(
    profile: &ThreatProfile,
    bbox: &BoundingBox,
    stats: &ImageStatistics,
    rng: &mut R,
) -> (f64, DetectionMetrics)
where
    R: RandomSource + ?Sized,
{
    let confidence = confidence(profile, stats, rng);
    (confidence, metrics(profile.kind, bbox, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ThreatCatalog;
    use crate::random::ReplaySource;

    fn stats(depth: Depth, clarity: f64) -> ImageStatistics {
        ImageStatistics {
            water_clarity: clarity,
            depth,
            avg_brightness: 100.0,
            blue_ratio: 0.4,
            has_metallic_objects: false,
            has_movement: false,
            edge_density: 0.0,
            dark_pixel_ratio: 0.0,
        }
    }

    #[test]
    fn confidence_is_clamped_on_both_sides() {
        let catalog = ThreatCatalog::standard();
        let submarine = catalog.get(ThreatKind::Submarine).unwrap();
        let debris = catalog.get(ThreatKind::Debris).unwrap();

        let high = confidence(submarine, &stats(Depth::Deep, 1.0), &mut ReplaySource::constant(0.99));
        assert_eq!(high, MAX_CONFIDENCE);
        let low = confidence(debris, &stats(Depth::Deep, 0.2), &mut ReplaySource::constant(0.0));
        assert_eq!(low, MIN_CONFIDENCE);

        // 0.78 * 0.9 * 1.0
        let mine = catalog.get(ThreatKind::Mine).unwrap();
        let mid = confidence(mine, &stats(Depth::Medium, 0.9), &mut ReplaySource::constant(0.5));
        assert!((mid - 0.702).abs() < 1e-9);
    }

    #[test]
    fn size_class_thresholds_are_exclusive() {
        assert_eq!(size_class(0.1), SizeClass::Medium);
        assert_eq!(size_class(0.100_001), SizeClass::Large);
        assert_eq!(size_class(0.05), SizeClass::Small);
        assert_eq!(size_class(0.050_001), SizeClass::Medium);
    }

    #[test]
    fn quality_follows_clarity() {
        assert_eq!(detection_quality(0.71), DetectionQuality::High);
        assert_eq!(detection_quality(0.7), DetectionQuality::Medium);
        assert_eq!(detection_quality(0.4), DetectionQuality::Low);
    }

    #[test]
    fn distance_grows_as_boxes_shrink() {
        // area equal to the base size puts the object at the reference distance
        assert!((estimated_distance_meters(ThreatKind::Diver, 0.05) - 50.0).abs() < 1e-9);
        assert!((estimated_distance_meters(ThreatKind::Submarine, 0.0375) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn threat_level_adds_size_kind_and_depth() {
        assert_eq!(threat_level(ThreatKind::Debris, 0.01, Depth::Deep), 1);
        assert_eq!(threat_level(ThreatKind::Diver, 0.06, Depth::Shallow), 4);
        assert_eq!(threat_level(ThreatKind::Mine, 0.02, Depth::Medium), 3);
        assert_eq!(threat_level(ThreatKind::Submarine, 0.2, Depth::Shallow), 7);
        assert_eq!(threat_level(ThreatKind::Torpedo, 0.02, Depth::Deep), 4);
    }

    #[test]
    fn metrics_use_box_geometry() {
        let bbox = BoundingBox::new(0.1, 0.4, 0.4, 0.1);
        let result = metrics(ThreatKind::Submarine, &bbox, &stats(Depth::Deep, 0.8));
        assert_eq!(result.size_class, SizeClass::Small);
        assert!((result.aspect_ratio - 4.0).abs() < 1e-9);
        assert_eq!(result.threat_level, 4);
        assert_eq!(result.detection_quality, DetectionQuality::High);
        assert!(result.estimated_distance_meters > 50.0);
    }

    #[test]
    fn score_draws_once_for_confidence() {
        let catalog = ThreatCatalog::standard();
        let drone = catalog.get(ThreatKind::Drone).unwrap();
        let bbox = BoundingBox::new(0.2, 0.2, 0.1, 0.1);
        let mut rng = ReplaySource::new(vec![0.5, 0.0]);
        let (confidence, metrics) = score(drone, &bbox, &stats(Depth::Shallow, 0.8), &mut rng);
        assert!((confidence - 0.6).abs() < 1e-9);
        assert_eq!(metrics.threat_level, 4);
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn name_lookups_fall_back_to_defaults() {
        assert_eq!(base_size_by_name("torpedo"), 0.08);
        assert_eq!(base_size_by_name("whale"), DEFAULT_BASE_SIZE);
        assert_eq!(
            detection_method_label_by_name("mine"),
            "Magnetic anomaly + Visual pattern"
        );
        assert_eq!(detection_method_label_by_name("whale"), DEFAULT_METHOD_LABEL);
        assert_eq!(detection_method_label(ThreatKind::Debris), DEFAULT_METHOD_LABEL);
    }
}
