use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::{DynFrameSource, SourceError, SourceResult};

/// Default upload limit, 10 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Mock,
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(SourceKind::File),
            "mock" => Ok(SourceKind::Mock),
            other => Err(SourceError::configuration(format!(
                "unknown source '{other}'"
            ))),
        }
    }
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::File => "file",
            SourceKind::Mock => "mock",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Configuration {
    pub source: SourceKind,
    pub inputs: Vec<PathBuf>,
    pub max_file_bytes: u64,
    pub channel_capacity: Option<NonZeroUsize>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            source: SourceKind::File,
            inputs: Vec::new(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            channel_capacity: None,
        }
    }
}

impl Configuration {
    pub fn from_env() -> SourceResult<Self> {
        let mut config = Configuration::default();
        if let Ok(source) = env::var("DEPTHWATCH_SOURCE") {
            config.source = SourceKind::from_str(&source)?;
        }
        if let Ok(limit) = env::var("DEPTHWATCH_MAX_FILE_BYTES") {
            config.max_file_bytes = parse_max_file_bytes(&limit)?;
        }
        if let Ok(capacity) = env::var("DEPTHWATCH_CHANNEL_CAPACITY") {
            config.channel_capacity = Some(parse_channel_capacity(&capacity)?);
        }
        Ok(config)
    }

    pub fn available_sources() -> Vec<SourceKind> {
        let mut sources = vec![SourceKind::File];
        #[cfg(feature = "backend-mock")]
        {
            sources.push(SourceKind::Mock);
        }
        sources
    }

    pub fn create_source(&self) -> SourceResult<DynFrameSource> {
        match self.source {
            SourceKind::File => {
                if self.inputs.is_empty() {
                    return Err(SourceError::configuration(
                        "file source requires at least one input path",
                    ));
                }
                Ok(crate::backends::file::boxed_file(
                    self.inputs.clone(),
                    self.max_file_bytes,
                ))
            }
            SourceKind::Mock => {
                #[cfg(feature = "backend-mock")]
                {
                    let capacity = self.channel_capacity.map(NonZeroUsize::get);
                    Ok(crate::backends::mock::boxed_mock(capacity))
                }
                #[cfg(not(feature = "backend-mock"))]
                {
                    Err(SourceError::unsupported("mock"))
                }
            }
        }
    }
}

fn parse_max_file_bytes(value: &str) -> SourceResult<u64> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(SourceError::configuration(
            "DEPTHWATCH_MAX_FILE_BYTES must be greater than zero",
        )),
        Ok(limit) => Ok(limit),
        Err(_) => Err(SourceError::configuration(format!(
            "failed to parse DEPTHWATCH_MAX_FILE_BYTES='{value}' as a positive integer"
        ))),
    }
}

fn parse_channel_capacity(value: &str) -> SourceResult<NonZeroUsize> {
    let parsed = value.trim().parse::<usize>().map_err(|_| {
        SourceError::configuration(format!(
            "failed to parse DEPTHWATCH_CHANNEL_CAPACITY='{value}' as a positive integer"
        ))
    })?;
    NonZeroUsize::new(parsed).ok_or_else(|| {
        SourceError::configuration("DEPTHWATCH_CHANNEL_CAPACITY must be greater than zero")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_parse_case_insensitively() {
        assert_eq!(SourceKind::from_str("MOCK").unwrap(), SourceKind::Mock);
        assert_eq!(SourceKind::from_str("file").unwrap(), SourceKind::File);
        assert!(SourceKind::from_str("camera").is_err());
    }

    #[test]
    fn file_source_needs_inputs() {
        let config = Configuration::default();
        assert!(matches!(
            config.create_source(),
            Err(SourceError::Configuration(_))
        ));
    }

    #[test]
    fn max_file_bytes_must_be_positive() {
        assert_eq!(parse_max_file_bytes(" 2048 ").unwrap(), 2048);
        assert!(parse_max_file_bytes("0").is_err());
        assert!(parse_max_file_bytes("ten").is_err());
    }

    #[test]
    fn channel_capacity_must_be_positive() {
        assert_eq!(parse_channel_capacity("16").unwrap().get(), 16);
        assert!(parse_channel_capacity("0").is_err());
        assert!(parse_channel_capacity("-3").is_err());
    }

    #[cfg(feature = "backend-mock")]
    #[tokio::test(flavor = "multi_thread")]
    async fn mock_source_honours_channel_capacity() {
        use tokio_stream::StreamExt;

        let config = Configuration {
            source: SourceKind::Mock,
            channel_capacity: NonZeroUsize::new(1),
            ..Configuration::default()
        };
        let source = config.create_source().unwrap();
        assert_eq!(source.total_frames(), Some(8));
        let frames: Vec<_> = source.into_stream().collect().await;
        assert_eq!(frames.len(), 8);
        assert!(frames.iter().all(Result::is_ok));
    }
}
