//! Shared domain models for the depthwatch workspace.
//!
//! This crate centralizes the lightweight data structures exchanged between
//! the detector crate and the CLI: decoded frames, per-image statistics and
//! the detection records produced for them. Keep it free of heavy
//! dependencies so every crate can depend on it.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

pub type DetectionResult<T> = Result<T, DetectionError>;

const RGBA_CHANNELS: usize = 4;

/// A decoded raster image with interleaved RGBA bytes.
#[derive(Clone)]
pub struct RgbaFrame {
    width: u32,
    height: u32,
    data: Arc<[u8]>,
}

impl fmt::Debug for RgbaFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RgbaFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl RgbaFrame {
    pub fn from_owned(width: u32, height: u32, data: Vec<u8>) -> DetectionResult<Self> {
        validate_rgba_len(data.len(), width, height)?;
        Ok(Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
        })
    }

    /// Builds a frame where every pixel has the same RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> DetectionResult<Self> {
        let pixels = (width as usize).saturating_mul(height as usize);
        let mut data = Vec::with_capacity(pixels.saturating_mul(RGBA_CHANNELS));
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self::from_owned(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Checks that `len` bytes hold exactly `width * height` RGBA pixels.
pub fn validate_rgba_len(len: usize, width: u32, height: u32) -> DetectionResult<()> {
    if width == 0 || height == 0 {
        return Err(DetectionError::invalid_image(format!(
            "image has no pixels ({width}x{height})"
        )));
    }
    let required = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(RGBA_CHANNELS))
        .ok_or_else(|| DetectionError::invalid_image("calculated RGBA length overflowed"))?;
    if len != required {
        return Err(DetectionError::invalid_image(format!(
            "buffer holds {len} bytes but {width}x{height} RGBA needs {required}"
        )));
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("invalid image data: {reason}")]
    InvalidImageData { reason: String },

    #[error("threat catalog has no profiles")]
    EmptyCatalog,

    #[error("{backend} detector is not available in this build")]
    Unsupported { backend: &'static str },
}

impl DetectionError {
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImageData {
            reason: reason.into(),
        }
    }

    pub fn unsupported(backend: &'static str) -> Self {
        Self::Unsupported { backend }
    }
}

/// Coarse water-depth class inferred from colour and brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Shallow,
    Medium,
    Deep,
}

impl Depth {
    /// Deep wins over medium, medium over shallow.
    pub fn classify(blue_ratio: f64, avg_brightness: f64) -> Self {
        if blue_ratio > 0.7 || avg_brightness < 80.0 {
            Depth::Deep
        } else if blue_ratio > 0.5 {
            Depth::Medium
        } else {
            Depth::Shallow
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Shallow => "shallow",
            Depth::Medium => "medium",
            Depth::Deep => "deep",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Depth a profile is most plausible at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredDepth {
    Shallow,
    Medium,
    Deep,
    Any,
}

impl PreferredDepth {
    pub fn accepts(self, depth: Depth) -> bool {
        match self {
            PreferredDepth::Any => true,
            PreferredDepth::Shallow => depth == Depth::Shallow,
            PreferredDepth::Medium => depth == Depth::Medium,
            PreferredDepth::Deep => depth == Depth::Deep,
        }
    }
}

/// Summary values derived once per image; they bias every later stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatistics {
    pub water_clarity: f64,
    pub depth: Depth,
    pub avg_brightness: f64,
    pub blue_ratio: f64,
    pub has_metallic_objects: bool,
    /// Coin flip standing in for motion data a still frame cannot provide.
    pub has_movement: bool,
    pub edge_density: f64,
    pub dark_pixel_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatKind {
    Submarine,
    Mine,
    Torpedo,
    Diver,
    Drone,
    Debris,
}

pub const DEFAULT_ICON: &str = "⚠️";

impl ThreatKind {
    pub const ALL: [ThreatKind; 6] = [
        ThreatKind::Submarine,
        ThreatKind::Mine,
        ThreatKind::Torpedo,
        ThreatKind::Diver,
        ThreatKind::Drone,
        ThreatKind::Debris,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThreatKind::Submarine => "submarine",
            ThreatKind::Mine => "mine",
            ThreatKind::Torpedo => "torpedo",
            ThreatKind::Diver => "diver",
            ThreatKind::Drone => "drone",
            ThreatKind::Debris => "debris",
        }
    }

    /// Inverse of [`ThreatKind::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Display glyph; torpedo has no dedicated icon and uses [`DEFAULT_ICON`].
    pub fn icon(self) -> &'static str {
        match self {
            ThreatKind::Submarine => "🚢",
            ThreatKind::Mine => "💣",
            ThreatKind::Diver => "🤿",
            ThreatKind::Drone => "🚁",
            ThreatKind::Debris => "🗑️",
            ThreatKind::Torpedo => DEFAULT_ICON,
        }
    }
}

impl fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }

    /// Hex colour used when overlaying detections of this priority.
    pub fn color(self) -> &'static str {
        match self {
            Priority::Critical => "#ef4444",
            Priority::High => "#f97316",
            Priority::Medium => "#eab308",
            Priority::Low => "#3b82f6",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Box in unit-square coordinates relative to the image extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn is_contained(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.0
            && self.y + self.height <= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectionQuality {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionMetrics {
    pub size_class: SizeClass,
    pub aspect_ratio: f64,
    pub estimated_distance_meters: f64,
    pub threat_level: u8,
    pub detection_quality: DetectionQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRecord {
    #[serde(rename = "type")]
    pub kind: ThreatKind,
    pub priority: Priority,
    pub confidence: f64,
    pub bbox: BoundingBox,
    pub characteristics: Vec<String>,
    pub metrics: DetectionMetrics,
    pub detection_method_label: String,
    pub color: String,
    pub icon: String,
    /// Unix epoch milliseconds.
    pub created_at: u64,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_boundaries_follow_precedence() {
        assert_eq!(Depth::classify(0.5, 80.0), Depth::Shallow);
        assert_eq!(Depth::classify(0.500_001, 80.0), Depth::Medium);
        assert_eq!(Depth::classify(0.7, 80.0), Depth::Medium);
        assert_eq!(Depth::classify(0.700_001, 200.0), Depth::Deep);
        assert_eq!(Depth::classify(0.2, 79.999), Depth::Deep);
        assert_eq!(Depth::classify(0.6, 79.0), Depth::Deep);
    }

    #[test]
    fn preferred_any_accepts_every_depth() {
        for depth in [Depth::Shallow, Depth::Medium, Depth::Deep] {
            assert!(PreferredDepth::Any.accepts(depth));
        }
        assert!(PreferredDepth::Deep.accepts(Depth::Deep));
        assert!(!PreferredDepth::Deep.accepts(Depth::Shallow));
    }

    #[test]
    fn frame_rejects_mismatched_buffer() {
        let err = RgbaFrame::from_owned(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidImageData { .. }));
        let err = RgbaFrame::from_owned(0, 4, Vec::new()).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidImageData { .. }));
        assert!(RgbaFrame::from_owned(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn record_serializes_with_flat_field_names() {
        let record = DetectionRecord {
            kind: ThreatKind::Mine,
            priority: Priority::High,
            confidence: 0.5,
            bbox: BoundingBox::new(0.1, 0.2, 0.1, 0.1),
            characteristics: vec!["metallic".to_string()],
            metrics: DetectionMetrics {
                size_class: SizeClass::Small,
                aspect_ratio: 1.0,
                estimated_distance_meters: 122.0,
                threat_level: 3,
                detection_quality: DetectionQuality::Medium,
            },
            detection_method_label: "Magnetic anomaly + Visual pattern".to_string(),
            color: Priority::High.color().to_string(),
            icon: ThreatKind::Mine.icon().to_string(),
            created_at: 7,
            id: "threat_7_0".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "mine");
        assert_eq!(value["priority"], "HIGH");
        assert_eq!(value["bbox"]["width"], 0.1);
        assert_eq!(value["metrics"]["sizeClass"], "Small");
        assert_eq!(value["metrics"]["estimatedDistanceMeters"], 122.0);
        assert_eq!(value["metrics"]["detectionQuality"], "Medium");
        assert_eq!(value["detectionMethodLabel"], "Magnetic anomaly + Visual pattern");
        assert_eq!(value["createdAt"], 7);
    }

    #[test]
    fn torpedo_falls_back_to_default_icon() {
        assert_eq!(ThreatKind::Torpedo.icon(), DEFAULT_ICON);
        assert_ne!(ThreatKind::Submarine.icon(), DEFAULT_ICON);
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in ThreatKind::ALL {
            assert_eq!(ThreatKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ThreatKind::from_name("Submarine"), None);
    }
}
