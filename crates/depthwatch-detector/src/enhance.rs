use depthwatch_types::{DetectionResult, RgbaFrame};
use serde::Serialize;

use crate::random::RandomSource;

// Underwater scenes lose red first; boost it and pull blue back.
const RED_GAIN: f64 = 1.3;
const GREEN_GAIN: f64 = 1.2;
const BLUE_GAIN: f64 = 0.9;

#[inline]
fn scale_channel(value: u8, gain: f64) -> u8 {
    (value as f64 * gain).min(255.0).round_ties_even() as u8
}

/// Applies the colour-correction gains to an RGBA buffer in place.
/// Alpha is left untouched.
pub fn color_correct_in_place(data: &mut [u8]) {
    for pixel in data.chunks_exact_mut(4) {
        pixel[0] = scale_channel(pixel[0], RED_GAIN);
        pixel[1] = scale_channel(pixel[1], GREEN_GAIN);
        pixel[2] = scale_channel(pixel[2], BLUE_GAIN);
    }
}

pub fn color_correct(frame: &RgbaFrame) -> DetectionResult<RgbaFrame> {
    let mut data = frame.data().to_vec();
    color_correct_in_place(&mut data);
    RgbaFrame::from_owned(frame.width(), frame.height(), data)
}

/// Quality figures reported alongside an enhanced image.
///
/// These are placeholder values drawn at random, not measurements of the
/// corrected image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementMetrics {
    /// Peak signal-to-noise ratio, dB.
    pub psnr: f64,
    pub ssim: f64,
    pub uiqm: f64,
    /// Percentages.
    pub contrast: u8,
    pub sharpness: u8,
    pub colorfulness: u8,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

impl EnhancementMetrics {
    /// Consumes six draws: psnr, ssim, uiqm, contrast, sharpness, colorfulness.
    pub fn sample<R>(rng: &mut R) -> Self
    where
        R: RandomSource + ?Sized,
    {
        let psnr = round_to(rng.uniform(25.0, 33.0), 2);
        let ssim = round_to(rng.uniform(0.8, 0.95), 3);
        let uiqm = round_to(rng.uniform(2.5, 4.0), 2);
        let contrast = rng.uniform(85.0, 100.0).floor() as u8;
        let sharpness = rng.uniform(75.0, 100.0).floor() as u8;
        let colorfulness = rng.uniform(80.0, 100.0).floor() as u8;
        Self {
            psnr,
            ssim,
            uiqm,
            contrast,
            sharpness,
            colorfulness,
        }
    }
}
