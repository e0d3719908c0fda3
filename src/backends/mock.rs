use std::time::Duration;

use depthwatch_types::RgbaFrame;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tokio_stream::wrappers::ReceiverStream;

use crate::core::{DynFrameSource, FrameSource, FrameStream, LoadedFrame, SourceResult};

/// Synthetic underwater scenes: a blue vertical gradient with a dark hull
/// shaped band that drifts from frame to frame.
#[derive(Debug, Clone)]
pub struct MockSource {
    frame_count: usize,
    width: u32,
    height: u32,
    interval: Duration,
    channel_capacity: usize,
}

impl Default for MockSource {
    fn default() -> Self {
        Self {
            frame_count: 8,
            width: 320,
            height: 180,
            interval: Duration::from_millis(16),
            channel_capacity: 4,
        }
    }
}

impl MockSource {
    pub fn new(frame_count: usize, width: u32, height: u32, interval: Duration) -> Self {
        Self {
            frame_count,
            width,
            height,
            interval,
            ..Self::default()
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    fn generate_frame(&self, index: usize) -> SourceResult<LoadedFrame> {
        let width = self.width as usize;
        let height = self.height as usize;
        let mut data = Vec::with_capacity(width * height * 4);

        let band_height = (height / 8).max(1);
        let band_top = (index * 7) % height.saturating_sub(band_height).max(1);
        let band_left = width / 4;
        let band_right = width - width / 4;

        for row in 0..height {
            let depth = row * 255 / height.max(1);
            for col in 0..width {
                let in_band = row >= band_top
                    && row < band_top + band_height
                    && col >= band_left
                    && col < band_right;
                let pixel = if in_band {
                    [20, 24, 28, 255]
                } else {
                    [
                        (40usize.saturating_sub(depth / 8)) as u8,
                        (120usize.saturating_sub(depth / 3)) as u8,
                        (220usize.saturating_sub(depth / 4)) as u8,
                        255,
                    ]
                };
                data.extend_from_slice(&pixel);
            }
        }

        let frame = RgbaFrame::from_owned(self.width, self.height, data)?;
        Ok(LoadedFrame::new(format!("mock-{index:04}"), frame))
    }
}

impl FrameSource for MockSource {
    fn total_frames(&self) -> Option<u64> {
        Some(self.frame_count as u64)
    }

    fn into_stream(self: Box<Self>) -> FrameStream {
        let source = *self;
        let (tx, rx) = mpsc::channel::<SourceResult<LoadedFrame>>(source.channel_capacity);
        tokio::spawn(async move {
            let mut next_instant = Instant::now();
            for index in 0..source.frame_count {
                let frame = source.generate_frame(index);
                if Instant::now() < next_instant {
                    sleep(next_instant - Instant::now()).await;
                }
                next_instant += source.interval;
                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        });
        Box::pin(ReceiverStream::new(rx))
    }
}

pub fn boxed_mock(channel_capacity: Option<usize>) -> DynFrameSource {
    let source = MockSource::default();
    match channel_capacity {
        Some(capacity) => Box::new(source.with_channel_capacity(capacity)),
        None => Box::new(source),
    }
}
