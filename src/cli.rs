use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use depthwatch_detector::DetectorKind;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DetectorBackend {
    Auto,
    Model,
    Synthetic,
}

impl From<DetectorBackend> for DetectorKind {
    fn from(value: DetectorBackend) -> Self {
        match value {
            DetectorBackend::Auto => DetectorKind::Auto,
            DetectorBackend::Model => DetectorKind::Model,
            DetectorBackend::Synthetic => DetectorKind::Synthetic,
        }
    }
}

#[derive(Debug, Default)]
pub struct CliSources {
    pub detector_from_cli: bool,
    pub image_format_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            detector_from_cli: value_from_cli(matches, "detector"),
            image_format_from_cli: value_from_cli(matches, "image_format"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    parse_matches(&matches)
}

fn parse_matches(matches: &ArgMatches) -> (CliArgs, CliSources) {
    let args = match CliArgs::from_arg_matches(matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(matches);
    (args, sources)
}

#[derive(Debug, Parser)]
#[command(
    name = "depthwatch",
    about = "Inspect underwater images and report likely threats",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Read frames from a specific source (file or mock)
    #[arg(short = 's', long = "source")]
    pub source: Option<String>,

    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Detector implementation; auto falls back to the synthetic generator
    #[arg(long = "detector", value_enum, default_value_t = DetectorBackend::Auto)]
    pub detector: DetectorBackend,

    /// Seed for reproducible output
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Apply colour correction and report enhancement metrics
    #[arg(long = "enhance", value_parser = clap::value_parser!(bool))]
    pub enhance: Option<bool>,

    /// Generate threat detections (statistics are always reported)
    #[arg(long = "detect-threats", value_parser = clap::value_parser!(bool))]
    pub detect_threats: Option<bool>,

    /// Reject input files larger than this many bytes
    #[arg(
        long = "max-file-bytes",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_file_bytes: Option<u64>,

    /// Write all reports to this JSON file
    #[arg(long = "json", value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long = "compact")]
    pub compact: bool,

    /// Directory for annotated (and enhanced) images
    #[arg(long = "image-dir")]
    pub image_dir: Option<PathBuf>,

    /// Image format used with --image-dir
    #[arg(long = "image-format", value_enum, default_value_t = ImageFormat::Png)]
    pub image_format: ImageFormat,

    /// Print the available sources and detectors
    #[arg(long = "list-backends")]
    pub list_backends: bool,

    /// Input image paths
    pub inputs: Vec<PathBuf>,
}
