use depthwatch_types::{Depth, DetectionResult, ImageStatistics, RgbaFrame, validate_rgba_len};

use crate::random::RandomSource;

// Brightness jump between vertical neighbours that marks an edge pixel.
const EDGE_THRESHOLD: f64 = 30.0;
// Pixels darker than this count towards the dark ratio.
const DARK_PIXEL_THRESHOLD: f64 = 50.0;
// Edge density above which the frame is assumed to contain metallic objects.
const METALLIC_EDGE_DENSITY: f64 = 0.05;
// Still frames carry no motion; movement is a plain coin flip.
const MOVEMENT_PROBABILITY: f64 = 0.3;
const CLARITY_FLOOR: f64 = 0.2;
const CLARITY_CEILING: f64 = 1.0;

/// Raw sums collected in one pass over the pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSummary {
    pub pixel_count: usize,
    pub avg_red: f64,
    pub avg_green: f64,
    pub avg_blue: f64,
    pub avg_brightness: f64,
    pub edge_pixels: usize,
    pub dark_pixels: usize,
}

impl PixelSummary {
    /// Share of blue in the summed channel averages; zero for a black frame.
    pub fn blue_ratio(&self) -> f64 {
        let total = self.avg_red + self.avg_green + self.avg_blue;
        if total <= 0.0 {
            0.0
        } else {
            self.avg_blue / total
        }
    }

    pub fn edge_density(&self) -> f64 {
        self.edge_pixels as f64 / self.pixel_count as f64
    }

    pub fn dark_pixel_ratio(&self) -> f64 {
        self.dark_pixels as f64 / self.pixel_count as f64
    }

    pub fn water_clarity(&self) -> f64 {
        let clarity = (self.avg_brightness / 128.0) * (1.0 - self.blue_ratio() * 0.5);
        clarity.clamp(CLARITY_FLOOR, CLARITY_CEILING)
    }

    /// Everything except the movement flag, which needs a random draw.
    pub fn into_statistics(self, has_movement: bool) -> ImageStatistics {
        let blue_ratio = self.blue_ratio();
        let edge_density = self.edge_density();
        ImageStatistics {
            water_clarity: self.water_clarity(),
            depth: Depth::classify(blue_ratio, self.avg_brightness),
            avg_brightness: self.avg_brightness,
            blue_ratio,
            has_metallic_objects: edge_density > METALLIC_EDGE_DENSITY,
            has_movement,
            edge_density,
            dark_pixel_ratio: self.dark_pixel_ratio(),
        }
    }
}

#[inline]
fn brightness_at(data: &[u8], offset: usize) -> f64 {
    (data[offset] as f64 + data[offset + 1] as f64 + data[offset + 2] as f64) / 3.0
}

/// Deterministic part of the extraction: channel averages, edges and dark pixels.
///
/// The first and last rows have no vertical neighbour on one side and are
/// never counted as edges.
pub fn summarize(data: &[u8], width: u32, height: u32) -> DetectionResult<PixelSummary> {
    validate_rgba_len(data.len(), width, height)?;

    let width = width as usize;
    let height = height as usize;
    let pixel_count = width * height;
    let row_stride = width * 4;

    let mut total_red = 0u64;
    let mut total_green = 0u64;
    let mut total_blue = 0u64;
    let mut total_brightness = 0.0f64;
    let mut edge_pixels = 0usize;
    let mut dark_pixels = 0usize;

    for (index, pixel) in data.chunks_exact(4).enumerate() {
        let (red, green, blue) = (pixel[0], pixel[1], pixel[2]);
        total_red += red as u64;
        total_green += green as u64;
        total_blue += blue as u64;

        let brightness = (red as f64 + green as f64 + blue as f64) / 3.0;
        total_brightness += brightness;
        if brightness < DARK_PIXEL_THRESHOLD {
            dark_pixels += 1;
        }

        let row = index / width;
        if row > 0 && row + 1 < height {
            let offset = index * 4;
            let above = brightness_at(data, offset - row_stride);
            let below = brightness_at(data, offset + row_stride);
            if (brightness - above).abs() > EDGE_THRESHOLD
                || (brightness - below).abs() > EDGE_THRESHOLD
            {
                edge_pixels += 1;
            }
        }
    }

    let count = pixel_count as f64;
    Ok(PixelSummary {
        pixel_count,
        avg_red: total_red as f64 / count,
        avg_green: total_green as f64 / count,
        avg_blue: total_blue as f64 / count,
        avg_brightness: total_brightness / count,
        edge_pixels,
        dark_pixels,
    })
}

/// Derives [`ImageStatistics`] from an RGBA buffer.
///
/// Consumes exactly one random draw (the movement flag).
pub fn extract<R>(
    data: &[u8],
    width: u32,
    height: u32,
    rng: &mut R,
) -> DetectionResult<ImageStatistics>
where
    R: RandomSource + ?Sized,
{
    let summary = summarize(data, width, height)?;
    let has_movement = rng.chance(MOVEMENT_PROBABILITY);
    Ok(summary.into_statistics(has_movement))
}

pub fn extract_frame<R>(frame: &RgbaFrame, rng: &mut R) -> DetectionResult<ImageStatistics>
where
    R: RandomSource + ?Sized,
{
    extract(frame.data(), frame.width(), frame.height(), rng)
}
