use std::sync::Arc;
use std::time::Duration;

use depthwatch_detector::types::{DetectionError, Priority};
use depthwatch_detector::{
    DetectorKind, ThreatAnalysis, ThreatDetectionOptions, ThreatDetector, build_detector,
};
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tokio_stream::StreamExt;

use crate::config::Configuration;
use crate::core::{DynFrameSource, LoadedFrame, SourceError};
use crate::output::{OutputError, OutputManager};
use crate::settings::ConfigError;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

pub struct ExecutionPlan {
    pub config: Configuration,
    pub detection: ThreatDetectionOptions,
    pub output: Option<Arc<OutputManager>>,
    pub show_progress: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: u64,
    pub failed: u64,
    pub detections: usize,
    pub critical: usize,
}

/// Streams every frame from the configured source through the detector.
/// A frame that fails to load or analyze is logged and skipped; output
/// failures abort the run.
pub async fn run(plan: ExecutionPlan) -> Result<RunSummary, RunError> {
    let ExecutionPlan {
        config,
        detection,
        output,
        show_progress,
    } = plan;

    let source = config.create_source()?;
    let detector = build_detector(detection.detector, &detection)?;
    log::info!(
        "analyzing frames from '{}' with the {} detector",
        config.source,
        detector.kind().as_str()
    );

    let summary = analyze_stream(
        source,
        detector.as_ref(),
        &detection,
        output.as_deref(),
        show_progress,
    )
    .await?;

    if let Some(output) = output.as_ref() {
        output.finalize().await?;
    }
    Ok(summary)
}

async fn analyze_stream(
    source: DynFrameSource,
    detector: &dyn ThreatDetector,
    detection: &ThreatDetectionOptions,
    output: Option<&OutputManager>,
    show_progress: bool,
) -> Result<RunSummary, RunError> {
    let progress = build_progress(source.total_frames(), show_progress);
    let mut stream = source.into_stream();
    let mut rng = detection.rng();
    let mut summary = RunSummary::default();

    while let Some(loaded) = stream.next().await {
        progress.inc(1);
        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                log::error!("skipping input: {err}");
                summary.failed += 1;
                continue;
            }
        };

        let analysis = match detector.analyze(&loaded.frame, &mut rng) {
            Ok(analysis) => analysis,
            Err(err) => {
                log::error!("analysis of {} failed: {err}", loaded.label);
                summary.failed += 1;
                continue;
            }
        };

        summary.processed += 1;
        summary.detections += analysis.report.detections.len();
        summary.critical += analysis.report.count_with_priority(Priority::Critical);
        progress.println(describe(&loaded, &analysis));

        if let Some(output) = output {
            if let Some(path) = output.publish(&loaded, &analysis).await? {
                log::debug!("wrote {}", path.display());
            }
        }
    }

    progress.finish_with_message(format!(
        "{} analyzed, {} failed",
        summary.processed, summary.failed
    ));
    Ok(summary)
}

fn build_progress(total: Option<u64>, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let progress = match total {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {pos}/{len} images [{elapsed_precise}] {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        }
        None => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan.bold} [{elapsed_precise}] images {pos} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            spinner
        }
    };
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

fn describe(loaded: &LoadedFrame, analysis: &ThreatAnalysis) -> String {
    let report = &analysis.report;
    let stats = &report.statistics;
    let mut line = format!(
        "{}: {}x{} clarity {:.2} depth {} metallic {} movement {}",
        loaded.label,
        loaded.frame.width(),
        loaded.frame.height(),
        stats.water_clarity,
        stats.depth.as_str(),
        stats.has_metallic_objects,
        stats.has_movement,
    );
    if let Some(priority) = report.highest_priority() {
        let names: Vec<String> = report
            .detections
            .iter()
            .map(|record| format!("{} {:.0}%", record.kind.as_str(), record.confidence * 100.0))
            .collect();
        line.push_str(&format!(" - [{}] {}", priority.as_str(), names.join(", ")));
    } else {
        line.push_str(" - no threats");
    }
    line
}

pub fn display_available_backends() {
    let sources: Vec<&'static str> = Configuration::available_sources()
        .iter()
        .map(|kind| kind.as_str())
        .collect();
    println!("available sources: {}", sources.join(", "));

    let options = ThreatDetectionOptions::default();
    let detectors: Vec<&'static str> = [DetectorKind::Model, DetectorKind::Synthetic]
        .into_iter()
        .filter(|kind| build_detector(*kind, &options).is_ok())
        .map(DetectorKind::as_str)
        .collect();
    println!("available detectors: auto, {}", detectors.join(", "));
}
