use std::path::PathBuf;
use std::pin::Pin;

use depthwatch_types::{DetectionError, RgbaFrame};
use futures_util::Stream;
use thiserror::Error;

pub type SourceResult<T> = Result<T, SourceError>;

pub type FrameStream = Pin<Box<dyn Stream<Item = SourceResult<LoadedFrame>> + Send>>;

pub type DynFrameSource = Box<dyn FrameSource>;

/// A decoded image together with a human-readable origin.
#[derive(Debug, Clone)]
pub struct LoadedFrame {
    pub label: String,
    pub frame: RgbaFrame,
}

impl LoadedFrame {
    pub fn new(label: impl Into<String>, frame: RgbaFrame) -> Self {
        Self {
            label: label.into(),
            frame,
        }
    }

    /// Label reduced to something safe to use in a file name.
    pub fn file_stem(&self) -> String {
        let stem = std::path::Path::new(&self.label)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.label);
        stem.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

pub trait FrameSource: Send + 'static {
    fn total_frames(&self) -> Option<u64> {
        None
    }

    fn into_stream(self: Box<Self>) -> FrameStream;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is {size} bytes; the limit is {limit} bytes")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("{path} is not a supported image: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("decoded image was rejected: {0}")]
    Frame(#[from] DetectionError),
    #[error("{0}")]
    Configuration(String),
    #[error("{source_kind} source is not available in this build")]
    Unsupported { source_kind: &'static str },
    #[error("decode task failed: {0}")]
    Join(String),
}

impl SourceError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn unsupported(source_kind: &'static str) -> Self {
        Self::Unsupported { source_kind }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_strips_directories_and_odd_characters() {
        let frame = RgbaFrame::filled(1, 1, [0, 0, 0, 255]).unwrap();
        let loaded = LoadedFrame::new("/tmp/dive site #3.jpg", frame.clone());
        assert_eq!(loaded.file_stem(), "dive_site__3");
        let loaded = LoadedFrame::new("mock-0001", frame);
        assert_eq!(loaded.file_stem(), "mock-0001");
    }

    #[test]
    fn too_large_message_names_the_limit() {
        let err = SourceError::TooLarge {
            path: PathBuf::from("big.png"),
            size: 20,
            limit: 10,
        };
        assert_eq!(err.to_string(), "big.png is 20 bytes; the limit is 10 bytes");
    }
}
