use depthwatch_types::{DetectionError, DetectionResult, PreferredDepth, Priority, ThreatKind};

/// Width and height as fractions of the image extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Plausible size, shape, depth and confidence baseline for one detection type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreatProfile {
    pub kind: ThreatKind,
    pub priority: Priority,
    pub base_confidence: f64,
    pub min_size: Extent,
    pub max_size: Extent,
    /// Allowed `width / height` range, inclusive.
    pub aspect_ratio_range: (f64, f64),
    pub preferred_depth: PreferredDepth,
    pub characteristics: &'static [&'static str],
}

impl ThreatProfile {
    pub fn has_characteristic(&self, tag: &str) -> bool {
        self.characteristics.contains(&tag)
    }
}

pub const METALLIC: &str = "metallic";
pub const FAST_MOVING: &str = "fast-moving";

static STANDARD_PROFILES: [ThreatProfile; 6] = [
    ThreatProfile {
        kind: ThreatKind::Submarine,
        priority: Priority::Critical,
        base_confidence: 0.85,
        min_size: Extent::new(0.15, 0.08),
        max_size: Extent::new(0.4, 0.2),
        aspect_ratio_range: (2.5, 6.0),
        preferred_depth: PreferredDepth::Deep,
        characteristics: &["elongated", METALLIC, "large", "horizontal"],
    },
    ThreatProfile {
        kind: ThreatKind::Mine,
        priority: Priority::High,
        base_confidence: 0.78,
        min_size: Extent::new(0.05, 0.05),
        max_size: Extent::new(0.15, 0.15),
        aspect_ratio_range: (0.8, 1.2),
        preferred_depth: PreferredDepth::Medium,
        characteristics: &["spherical", METALLIC, "anchored"],
    },
    ThreatProfile {
        kind: ThreatKind::Torpedo,
        priority: Priority::Critical,
        base_confidence: 0.82,
        min_size: Extent::new(0.12, 0.04),
        max_size: Extent::new(0.25, 0.08),
        aspect_ratio_range: (3.0, 8.0),
        preferred_depth: PreferredDepth::Any,
        characteristics: &["cylindrical", FAST_MOVING, METALLIC],
    },
    ThreatProfile {
        kind: ThreatKind::Diver,
        priority: Priority::Medium,
        base_confidence: 0.72,
        min_size: Extent::new(0.04, 0.08),
        max_size: Extent::new(0.12, 0.25),
        aspect_ratio_range: (0.3, 0.8),
        preferred_depth: PreferredDepth::Shallow,
        characteristics: &["humanoid", "vertical", "organic"],
    },
    ThreatProfile {
        kind: ThreatKind::Drone,
        priority: Priority::High,
        base_confidence: 0.75,
        min_size: Extent::new(0.06, 0.06),
        max_size: Extent::new(0.18, 0.18),
        aspect_ratio_range: (0.7, 1.5),
        preferred_depth: PreferredDepth::Shallow,
        characteristics: &["compact", "propellers", "hovering"],
    },
    ThreatProfile {
        kind: ThreatKind::Debris,
        priority: Priority::Low,
        base_confidence: 0.65,
        min_size: Extent::new(0.03, 0.03),
        max_size: Extent::new(0.2, 0.2),
        aspect_ratio_range: (0.2, 5.0),
        preferred_depth: PreferredDepth::Any,
        characteristics: &["irregular", "stationary", "various"],
    },
];

/// Ordered, read-only view over a set of profiles.
#[derive(Debug, Clone, Copy)]
pub struct ThreatCatalog<'a> {
    profiles: &'a [ThreatProfile],
}

impl ThreatCatalog<'static> {
    /// The six built-in profiles: submarine, mine, torpedo, diver, drone, debris.
    pub fn standard() -> Self {
        Self {
            profiles: &STANDARD_PROFILES,
        }
    }
}

impl<'a> ThreatCatalog<'a> {
    pub fn new(profiles: &'a [ThreatProfile]) -> DetectionResult<Self> {
        if profiles.is_empty() {
            return Err(DetectionError::EmptyCatalog);
        }
        Ok(Self { profiles })
    }

    pub fn iter(&self) -> std::slice::Iter<'a, ThreatProfile> {
        self.profiles.iter()
    }

    pub fn get(&self, kind: ThreatKind) -> Option<&'a ThreatProfile> {
        self.profiles.iter().find(|profile| profile.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ThreatCatalog<'static> {
    fn default() -> Self {
        Self::standard()
    }
}
