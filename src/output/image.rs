use std::path::{Path, PathBuf};

use depthwatch_types::{BoundingBox, DetectionRecord, RgbaFrame};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use tokio::{fs, task};

use crate::cli::ImageFormat;
use crate::output::error::OutputError;
use crate::settings::ImageOutputSettings;

const JPEG_QUALITY: u8 = 90;
const OUTLINE_THICKNESS: usize = 2;

pub(crate) struct ImageOutput {
    directory: PathBuf,
    format: ImageFormat,
}

impl ImageOutput {
    pub(crate) fn new(settings: ImageOutputSettings) -> Self {
        Self {
            directory: settings.dir,
            format: settings.format,
        }
    }

    /// Writes `frame` with every detection outlined in its priority colour.
    pub(crate) async fn write(
        &self,
        stem: &str,
        suffix: &str,
        frame: &RgbaFrame,
        detections: &[DetectionRecord],
    ) -> Result<PathBuf, OutputError> {
        fs::create_dir_all(&self.directory).await?;
        let path = self
            .directory
            .join(format!("{stem}_{suffix}.{}", extension(self.format)));
        write_frame(frame, detections, &path, self.format).await?;
        Ok(path)
    }
}

fn extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
    }
}

async fn write_frame(
    frame: &RgbaFrame,
    detections: &[DetectionRecord],
    path: &Path,
    format: ImageFormat,
) -> Result<(), OutputError> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;

    let mut rgb = rgba_to_rgb(frame.data());
    for record in detections {
        if let Some(rect) = bbox_to_rect(&record.bbox, width, height) {
            let color = parse_hex_color(&record.color).unwrap_or([255, 64, 64]);
            draw_outline(&mut rgb, width, height, rect, color);
        }
    }

    let (frame_width, frame_height) = (frame.width(), frame.height());
    let encoded = task::spawn_blocking(move || encode(&rgb, frame_width, frame_height, format))
        .await??;
    fs::write(path, encoded).await?;
    Ok(())
}

fn encode(rgb: &[u8], width: u32, height: u32, format: ImageFormat) -> Result<Vec<u8>, OutputError> {
    let mut encoded = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY);
            encoder.encode(rgb, width, height, ColorType::Rgb8)?;
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new(&mut encoded);
            encoder.write_image(rgb, width, height, ColorType::Rgb8)?;
        }
    }
    Ok(encoded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

/// Maps a unit-square box to inclusive pixel bounds; `None` if it covers no pixel.
fn bbox_to_rect(bbox: &BoundingBox, width: usize, height: usize) -> Option<Rect> {
    if width == 0 || height == 0 {
        return None;
    }
    let start_x = (bbox.x * width as f64).floor().max(0.0) as usize;
    let start_y = (bbox.y * height as f64).floor().max(0.0) as usize;
    let end_x = (((bbox.x + bbox.width) * width as f64).ceil() as usize).min(width);
    let end_y = (((bbox.y + bbox.height) * height as f64).ceil() as usize).min(height);
    if end_x <= start_x || end_y <= start_y {
        return None;
    }
    Some(Rect {
        x0: start_x,
        y0: start_y,
        x1: end_x - 1,
        y1: end_y - 1,
    })
}

fn draw_outline(buffer: &mut [u8], width: usize, height: usize, rect: Rect, color: [u8; 3]) {
    let stride = width * 3;
    for offset in 0..OUTLINE_THICKNESS {
        let top = rect.y0 + offset;
        let left = rect.x0 + offset;
        if top > rect.y1 || left > rect.x1 {
            break;
        }
        let bottom = rect.y1 - offset;
        let right = rect.x1 - offset;
        for x in rect.x0..=rect.x1 {
            paint(buffer, stride, top, x, color);
            paint(buffer, stride, bottom, x, color);
        }
        for y in rect.y0..=rect.y1.min(height - 1) {
            paint(buffer, stride, y, left, color);
            paint(buffer, stride, y, right, color);
        }
    }
}

fn paint(buffer: &mut [u8], stride: usize, y: usize, x: usize, color: [u8; 3]) {
    let idx = y * stride + x * 3;
    if let Some(pixel) = buffer.get_mut(idx..idx + 3) {
        pixel.copy_from_slice(&color);
    }
}

/// Parses `#rrggbb`.
fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

fn rgba_to_rgb(data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(data.len() / 4 * 3);
    for pixel in data.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_maps_to_inclusive_pixels() {
        let rect = bbox_to_rect(&BoundingBox::new(0.25, 0.5, 0.5, 0.25), 8, 8).unwrap();
        assert_eq!(
            rect,
            Rect {
                x0: 2,
                y0: 4,
                x1: 5,
                y1: 5
            }
        );
        assert!(bbox_to_rect(&BoundingBox::new(0.1, 0.1, 0.1, 0.1), 0, 8).is_none());
    }

    #[test]
    fn outline_leaves_interior_untouched() {
        let (width, height) = (8, 8);
        let mut buffer = vec![0u8; width * height * 3];
        let rect = Rect {
            x0: 1,
            y0: 1,
            x1: 6,
            y1: 6,
        };
        draw_outline(&mut buffer, width, height, rect, [239, 68, 68]);
        let at = |x: usize, y: usize| &buffer[(y * width + x) * 3..(y * width + x) * 3 + 3];
        assert_eq!(at(1, 1), &[239, 68, 68]);
        assert_eq!(at(2, 4), &[239, 68, 68]);
        assert_eq!(at(6, 6), &[239, 68, 68]);
        assert_eq!(at(4, 4), &[0, 0, 0]);
        assert_eq!(at(0, 0), &[0, 0, 0]);
    }

    #[test]
    fn priority_colors_parse() {
        assert_eq!(parse_hex_color("#3b82f6"), Some([0x3b, 0x82, 0xf6]));
        assert_eq!(parse_hex_color("3b82f6"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn alpha_is_dropped() {
        assert_eq!(rgba_to_rgb(&[1, 2, 3, 4, 5, 6, 7, 8]), vec![1, 2, 3, 5, 6, 7]);
    }
}
