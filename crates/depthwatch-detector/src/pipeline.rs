use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use depthwatch_types::{Depth, DetectionRecord, ImageStatistics, ThreatKind};

use crate::catalog::ThreatCatalog;
use crate::random::RandomSource;
use crate::{geometry, scoring, selector};

pub const MAX_DETECTIONS: usize = 3;

// (condition met, probability of adding one detection)
const CLEAR_WATER_CHANCE: f64 = 0.6;
const DEEP_WATER_CHANCE: f64 = 0.4;
const METALLIC_CHANCE: f64 = 0.8;
const MOVEMENT_CHANCE: f64 = 0.5;

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// How many detections to attempt for an image.
///
/// Each satisfied condition rolls its own draw; unmet conditions consume
/// nothing.
pub fn planned_detection_count<R>(stats: &ImageStatistics, rng: &mut R) -> usize
where
    R: RandomSource + ?Sized,
{
    let mut count = 0usize;
    if stats.water_clarity > 0.7 && rng.chance(CLEAR_WATER_CHANCE) {
        count += 1;
    }
    if stats.depth == Depth::Deep && rng.chance(DEEP_WATER_CHANCE) {
        count += 1;
    }
    if stats.has_metallic_objects && rng.chance(METALLIC_CHANCE) {
        count += 1;
    }
    if stats.has_movement && rng.chance(MOVEMENT_CHANCE) {
        count += 1;
    }
    count.min(MAX_DETECTIONS)
}

/// Highest priority first, then highest confidence. Stable.
pub fn sort_by_priority(records: &mut [DetectionRecord]) {
    records.sort_by(|a, b| {
        b.priority.rank().cmp(&a.priority.rank()).then_with(|| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        })
    });
}

/// Turns image statistics into a ranked list of synthetic detections.
#[derive(Debug, Clone, Copy)]
pub struct DetectionPipeline<'a> {
    catalog: ThreatCatalog<'a>,
}

impl Default for DetectionPipeline<'static> {
    fn default() -> Self {
        Self::new(ThreatCatalog::standard())
    }
}

impl<'a> DetectionPipeline<'a> {
    pub fn new(catalog: ThreatCatalog<'a>) -> Self {
        Self { catalog }
    }

    pub fn run<R>(&self, stats: &ImageStatistics, rng: &mut R) -> Vec<DetectionRecord>
    where
        R: RandomSource + ?Sized,
    {
        self.run_at(stats, rng, now_millis())
    }

    /// Same as [`DetectionPipeline::run`] with a caller-supplied creation time,
    /// so seeded runs produce identical records.
    ///
    /// An empty list is a normal result. Iterations whose selection comes up
    /// empty are dropped rather than retried, so fewer records than planned
    /// may be returned.
    pub fn run_at<R>(
        &self,
        stats: &ImageStatistics,
        rng: &mut R,
        created_at: u64,
    ) -> Vec<DetectionRecord>
    where
        R: RandomSource + ?Sized,
    {
        let planned = planned_detection_count(stats, rng);
        let mut chosen: Vec<ThreatKind> = Vec::with_capacity(planned);
        let mut records = Vec::with_capacity(planned);

        for iteration in 0..planned {
            let Some(kind) = selector::select(stats, &self.catalog, &chosen, rng) else {
                log::debug!("iteration {iteration}: no candidate accepted");
                continue;
            };
            let Some(profile) = self.catalog.get(kind) else {
                continue;
            };

            let confidence = scoring::confidence(profile, stats, rng);
            let bbox = geometry::synthesize(profile, stats, rng);
            let metrics = scoring::metrics(kind, &bbox, stats);
            log::debug!(
                "iteration {iteration}: {kind} ({}) confidence {confidence:.3}",
                profile.priority
            );

            records.push(DetectionRecord {
                kind,
                priority: profile.priority,
                confidence,
                bbox,
                characteristics: profile
                    .characteristics
                    .iter()
                    .map(|tag| (*tag).to_string())
                    .collect(),
                metrics,
                detection_method_label: scoring::detection_method_label(kind).to_string(),
                color: profile.priority.color().to_string(),
                icon: kind.icon().to_string(),
                created_at,
                id: format!("threat_{created_at}_{iteration}"),
            });
            chosen.push(kind);
        }

        sort_by_priority(&mut records);
        log::debug!(
            "planned {planned} detections, produced {} ({} water)",
            records.len(),
            stats.depth
        );
        records
    }
}
