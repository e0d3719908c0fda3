use std::cmp::Ordering;

use depthwatch_types::{Depth, ImageStatistics, ThreatKind};

use crate::catalog::{FAST_MOVING, METALLIC, ThreatCatalog, ThreatProfile};
use crate::random::RandomSource;

const BASE_PROBABILITY: f64 = 0.3;
const DEPTH_MATCH_BONUS: f64 = 0.3;
const METALLIC_BONUS: f64 = 0.4;
const MOVEMENT_BONUS: f64 = 0.3;
const CLEAR_WATER_BONUS: f64 = 0.2;
const CLEAR_WATER_THRESHOLD: f64 = 0.7;

/// A profile together with its unnormalized acceptance probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub kind: ThreatKind,
    pub probability: f64,
}

/// Submarines and torpedoes are reported at most once per image.
pub fn is_excluded(kind: ThreatKind, already_chosen: &[ThreatKind]) -> bool {
    matches!(kind, ThreatKind::Submarine | ThreatKind::Torpedo) && already_chosen.contains(&kind)
}

pub fn candidate_probability(profile: &ThreatProfile, stats: &ImageStatistics) -> f64 {
    let mut probability = BASE_PROBABILITY;

    if profile.preferred_depth.accepts(stats.depth) {
        probability += DEPTH_MATCH_BONUS;
    }
    if stats.has_metallic_objects && profile.has_characteristic(METALLIC) {
        probability += METALLIC_BONUS;
    }
    if stats.has_movement && profile.has_characteristic(FAST_MOVING) {
        probability += MOVEMENT_BONUS;
    }
    if stats.water_clarity > CLEAR_WATER_THRESHOLD {
        probability += CLEAR_WATER_BONUS;
    }

    match (stats.depth, profile.kind) {
        (Depth::Deep, ThreatKind::Submarine) => probability += 0.4,
        (Depth::Deep, ThreatKind::Diver) => probability -= 0.3,
        (Depth::Shallow, ThreatKind::Diver) => probability += 0.3,
        (Depth::Shallow, ThreatKind::Drone) => probability += 0.2,
        _ => {}
    }

    probability
}

/// Eligible candidates, highest probability first; catalog order breaks ties.
pub fn candidate_probabilities(
    stats: &ImageStatistics,
    catalog: &ThreatCatalog<'_>,
    already_chosen: &[ThreatKind],
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = catalog
        .iter()
        .filter(|profile| !is_excluded(profile.kind, already_chosen))
        .map(|profile| Candidate {
            kind: profile.kind,
            probability: candidate_probability(profile, stats),
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
    });
    candidates
}

/// Picks the next detection type, or `None` when every candidate is rejected.
///
/// This is an ordered accept/reject scan rather than a categorical sample:
/// candidates are visited from most to least likely and each one consumes a
/// fresh draw until one draw falls below its probability.
pub fn select<R>(
    stats: &ImageStatistics,
    catalog: &ThreatCatalog<'_>,
    already_chosen: &[ThreatKind],
    rng: &mut R,
) -> Option<ThreatKind>
where
    R: RandomSource + ?Sized,
{
    candidate_probabilities(stats, catalog, already_chosen)
        .into_iter()
        .find(|candidate| rng.chance(candidate.probability))
        .map(|candidate| candidate.kind)
}
