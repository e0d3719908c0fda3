use depthwatch_types::{BoundingBox, Depth, ImageStatistics};

use crate::catalog::ThreatProfile;
use crate::random::RandomSource;

// Smallest extent a synthesized box may have.
const MIN_EXTENT: f64 = 1e-6;
const PLACEMENT_CEILING: f64 = 0.8;

/// Lower bound of the vertical placement band; deeper water sits lower in frame.
fn placement_floor(depth: Depth) -> f64 {
    match depth {
        Depth::Deep => 0.4,
        Depth::Shallow => 0.2,
        Depth::Medium => 0.3,
    }
}

/// Applies at most one aspect-ratio correction to a drawn size.
///
/// A ratio below the profile range widens the box; a ratio above it shortens
/// the box. Sizes already within range are returned unchanged.
pub fn correct_aspect(width: f64, height: f64, range: (f64, f64)) -> (f64, f64) {
    let (low, high) = range;
    let ratio = width / height;
    if ratio < low {
        (height * low, height)
    } else if ratio > high {
        (width, width / high)
    } else {
        (width, height)
    }
}

/// Draws a plausible bounding box for `profile`.
///
/// Consumes four draws in order: width, height, vertical position, horizontal
/// position. The result always lies inside the unit square.
pub fn synthesize<R>(profile: &ThreatProfile, stats: &ImageStatistics, rng: &mut R) -> BoundingBox
where
    R: RandomSource + ?Sized,
{
    let width = rng.uniform(profile.min_size.width, profile.max_size.width);
    let height = rng.uniform(profile.min_size.height, profile.max_size.height);
    let (width, height) = correct_aspect(width, height, profile.aspect_ratio_range);
    let width = width.clamp(MIN_EXTENT, 1.0);
    let height = height.clamp(MIN_EXTENT, 1.0);

    let y = rng.uniform(placement_floor(stats.depth), PLACEMENT_CEILING);
    let y = y.min(1.0 - height).max(0.0);
    let x = rng.uniform(0.0, 1.0 - width).max(0.0);

    BoundingBox::new(x, y, width, height)
}
