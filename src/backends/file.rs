use std::path::{Path, PathBuf};

use depthwatch_types::RgbaFrame;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::{fs, task};

use crate::core::{DynFrameSource, FrameSource, FrameStream, LoadedFrame, SourceError, SourceResult};

/// Reads and decodes image files one after another.
#[derive(Debug, Clone)]
pub struct FileSource {
    paths: Vec<PathBuf>,
    max_file_bytes: u64,
}

impl FileSource {
    pub fn new(paths: Vec<PathBuf>, max_file_bytes: u64) -> Self {
        Self {
            paths,
            max_file_bytes,
        }
    }
}

impl FrameSource for FileSource {
    fn total_frames(&self) -> Option<u64> {
        Some(self.paths.len() as u64)
    }

    fn into_stream(self: Box<Self>) -> FrameStream {
        let limit = self.max_file_bytes;
        let stream = stream::iter(self.paths).then(move |path| load_image(path, limit));
        Box::pin(stream)
    }
}

/// Loads one image file into an RGBA frame.
///
/// Files above `max_file_bytes` are rejected before being read.
pub async fn load_image(path: PathBuf, max_file_bytes: u64) -> SourceResult<LoadedFrame> {
    let metadata = fs::metadata(&path)
        .await
        .map_err(|source| SourceError::io(&path, source))?;
    if metadata.len() > max_file_bytes {
        return Err(SourceError::TooLarge {
            path,
            size: metadata.len(),
            limit: max_file_bytes,
        });
    }

    let bytes = fs::read(&path)
        .await
        .map_err(|source| SourceError::io(&path, source))?;
    let decode_path = path.clone();
    let frame = task::spawn_blocking(move || decode_rgba(&decode_path, &bytes))
        .await
        .map_err(|err| SourceError::Join(err.to_string()))??;

    log::debug!(
        "decoded {} ({}x{})",
        path.display(),
        frame.width(),
        frame.height()
    );
    Ok(LoadedFrame::new(path.display().to_string(), frame))
}

fn decode_rgba(path: &Path, bytes: &[u8]) -> SourceResult<RgbaFrame> {
    let image = image::load_from_memory(bytes).map_err(|source| SourceError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(RgbaFrame::from_owned(width, height, rgba.into_raw())?)
}

pub fn boxed_file(paths: Vec<PathBuf>, max_file_bytes: u64) -> DynFrameSource {
    Box::new(FileSource::new(paths, max_file_bytes))
}
