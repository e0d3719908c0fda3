use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use depthwatch_detector::{DetectorKind, ThreatDetectionOptions};
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::cli::{CliArgs, CliSources, DetectorBackend, ImageFormat};
use crate::config::DEFAULT_MAX_FILE_BYTES;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    source: Option<String>,
    detector: Option<String>,
    seed: Option<u64>,
    enhance: Option<bool>,
    detect_threats: Option<bool>,
    max_file_bytes: Option<u64>,
    output: Option<OutputFileConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct OutputFileConfig {
    json: Option<String>,
    pretty: Option<bool>,
    image_dir: Option<String>,
    image_format: Option<String>,
}

#[derive(Debug)]
pub struct EffectiveSettings {
    pub source: Option<String>,
    pub detection: ThreatDetectionOptions,
    pub max_file_bytes: u64,
    pub json: Option<JsonOutputSettings>,
    pub image: Option<ImageOutputSettings>,
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct JsonOutputSettings {
    pub path: PathBuf,
    pub pretty: bool,
}

#[derive(Debug, Clone)]
pub struct ImageOutputSettings {
    pub dir: PathBuf,
    pub format: ImageFormat,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    NotFound {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config file {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config file {}: {source}", path.display())
            }
            ConfigError::InvalidValue { path, field, value } => match path {
                Some(path) => write!(
                    f,
                    "invalid value '{value}' for '{field}' in {}",
                    path.display()
                ),
                None => write!(f, "invalid value '{value}' for '{field}'"),
            },
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } | ConfigError::NotFound { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = path.to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        return read_config(path);
    }

    let candidates = [project_config_path(), default_config_path()];
    for path in candidates.into_iter().flatten() {
        if path.exists() {
            return read_config(path);
        }
    }
    Ok((FileConfig::default(), None))
}

fn read_config(path: PathBuf) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok((config, Some(path)))
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(Path::to_path_buf));

    let FileConfig {
        source: file_source,
        detector: file_detector,
        seed: file_seed,
        enhance: file_enhance,
        detect_threats: file_detect_threats,
        max_file_bytes: file_max_file_bytes,
        output: file_output,
    } = file;
    let file_output = file_output.unwrap_or_default();

    let source = normalize_string(cli.source.clone()).or_else(|| normalize_string(file_source));

    let mut detector = cli.detector;
    if !sources.detector_from_cli {
        if let Some(value) = normalize_string(file_detector) {
            detector = parse_detector(&value, config_path.as_ref())?;
        }
    }

    let defaults = ThreatDetectionOptions::default();
    let detection = ThreatDetectionOptions {
        detect_threats: cli
            .detect_threats
            .or(file_detect_threats)
            .unwrap_or(defaults.detect_threats),
        enhance: cli.enhance.or(file_enhance).unwrap_or(defaults.enhance),
        detector: DetectorKind::from(detector),
        seed: cli.seed.or(file_seed),
    };

    let max_file_bytes = match (cli.max_file_bytes, file_max_file_bytes) {
        (Some(value), _) => value,
        (None, Some(0)) => {
            return Err(ConfigError::InvalidValue {
                path: config_path,
                field: "max_file_bytes",
                value: "0".to_string(),
            });
        }
        (None, Some(value)) => value,
        (None, None) => DEFAULT_MAX_FILE_BYTES,
    };

    let json_path = match cli.json.clone() {
        Some(path) => Some(expand_pathbuf(path)),
        None => normalize_string(file_output.json.clone())
            .and_then(|value| resolve_path_from_config(value, config_dir.as_deref())),
    };
    let pretty = if cli.compact {
        false
    } else {
        file_output.pretty.unwrap_or(true)
    };
    let json = json_path.map(|path| JsonOutputSettings { path, pretty });

    let mut image_format = cli.image_format;
    if !sources.image_format_from_cli {
        if let Some(value) = normalize_string(file_output.image_format.clone()) {
            image_format = parse_image_format(&value, config_path.as_ref())?;
        }
    }
    let image_dir = match cli.image_dir.clone() {
        Some(dir) => Some(expand_pathbuf(dir)),
        None => normalize_string(file_output.image_dir)
            .and_then(|value| resolve_path_from_config(value, config_dir.as_deref())),
    };
    let image = image_dir.map(|dir| ImageOutputSettings {
        dir,
        format: image_format,
    });

    Ok(EffectiveSettings {
        source,
        detection,
        max_file_bytes,
        json,
        image,
        config_dir,
    })
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "depthwatch", "depthwatch")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir().ok().map(|dir| dir.join("config.toml"))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn expand_pathbuf(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_home_path(s),
        None => path,
    }
}

fn resolve_path_from_config(value: String, base: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_home_path(trimmed);
    match base {
        Some(base) if !expanded.is_absolute() => Some(base.join(expanded)),
        _ => Some(expanded),
    }
}

fn expand_home_path(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().to_path_buf();
        }
    } else if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(stripped);
        }
    }
    PathBuf::from(value)
}

fn parse_detector(value: &str, path: Option<&PathBuf>) -> Result<DetectorBackend, ConfigError> {
    DetectorBackend::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
        path: path.cloned(),
        field: "detector",
        value: value.to_string(),
    })
}

fn parse_image_format(value: &str, path: Option<&PathBuf>) -> Result<ImageFormat, ConfigError> {
    ImageFormat::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
        path: path.cloned(),
        field: "image_format",
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(args)
    }

    fn file_config(contents: &str) -> FileConfig {
        toml::from_str(contents).unwrap()
    }

    #[test]
    fn file_values_fill_unset_cli_options() {
        let file = file_config(
            r#"
            detector = "synthetic"
            seed = 42
            enhance = false
            max_file_bytes = 2048

            [output]
            json = "out/report.json"
            pretty = false
            image_dir = "out/images"
            image_format = "jpeg"
            "#,
        );
        let settings = merge(
            &cli(&["depthwatch", "a.png"]),
            &CliSources::default(),
            file,
            Some(PathBuf::from("/etc/depthwatch/config.toml")),
        )
        .unwrap();

        assert_eq!(settings.detection.detector, DetectorKind::Synthetic);
        assert_eq!(settings.detection.seed, Some(42));
        assert!(!settings.detection.enhance);
        assert!(settings.detection.detect_threats);
        assert_eq!(settings.max_file_bytes, 2048);

        let json = settings.json.unwrap();
        assert_eq!(json.path, PathBuf::from("/etc/depthwatch/out/report.json"));
        assert!(!json.pretty);
        let image = settings.image.unwrap();
        assert_eq!(image.dir, PathBuf::from("/etc/depthwatch/out/images"));
        assert_eq!(image.format, ImageFormat::Jpeg);
    }

    #[test]
    fn cli_values_win_over_file() {
        let file = file_config("detector = \"model\"\nseed = 1\nenhance = false\n");
        let args = cli(&[
            "depthwatch",
            "--detector",
            "synthetic",
            "--seed",
            "9",
            "--enhance",
            "true",
        ]);
        let sources = CliSources {
            detector_from_cli: true,
            ..CliSources::default()
        };
        let settings = merge(&args, &sources, file, None).unwrap();
        assert_eq!(settings.detection.detector, DetectorKind::Synthetic);
        assert_eq!(settings.detection.seed, Some(9));
        assert!(settings.detection.enhance);
    }

    #[test]
    fn defaults_apply_without_any_config() {
        let settings = merge(
            &cli(&["depthwatch"]),
            &CliSources::default(),
            FileConfig::default(),
            None,
        )
        .unwrap();
        assert_eq!(settings.detection.detector, DetectorKind::Auto);
        assert_eq!(settings.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert!(settings.json.is_none());
        assert!(settings.image.is_none());
        assert!(settings.source.is_none());
    }

    #[test]
    fn invalid_file_values_are_reported() {
        let err = merge(
            &cli(&["depthwatch"]),
            &CliSources::default(),
            file_config("detector = \"sonar\""),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "detector", .. }));

        let err = merge(
            &cli(&["depthwatch"]),
            &CliSources::default(),
            file_config("max_file_bytes = 0"),
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "max_file_bytes",
                ..
            }
        ));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depthwatch.toml");
        std::fs::write(&path, "source = \"mock\"\nseed = 3\n").unwrap();

        let args = cli(&["depthwatch", "--config", path.to_str().unwrap()]);
        let settings = resolve_settings(&args, &CliSources::default()).unwrap();
        assert_eq!(settings.source.as_deref(), Some("mock"));
        assert_eq!(settings.detection.seed, Some(3));
        assert_eq!(settings.config_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = cli(&["depthwatch", "--config", "/nonexistent/depthwatch.toml"]);
        let err = resolve_settings(&args, &CliSources::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
