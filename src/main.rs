use std::io::IsTerminal;

use depthwatch::cli::parse_cli;
use depthwatch::output::OutputManager;
use depthwatch::runner::{self, ExecutionPlan, RunError};
use depthwatch::settings::resolve_settings;
use depthwatch::{Configuration, SourceError, SourceKind};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), RunError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (cli, sources) = parse_cli();
    if cli.list_backends {
        runner::display_available_backends();
        return Ok(());
    }

    let settings = resolve_settings(&cli, &sources)?;
    match settings.config_dir.as_deref() {
        Some(dir) => log::info!("loaded configuration from {}", dir.display()),
        None => log::debug!("no configuration file found; using defaults"),
    }

    let mut config = Configuration::from_env()?;
    if let Some(source) = settings.source.as_deref() {
        config.source = source.parse::<SourceKind>()?;
    }
    config.inputs = cli.inputs.clone();
    config.max_file_bytes = settings.max_file_bytes;
    if !Configuration::available_sources().contains(&config.source) {
        return Err(SourceError::unsupported(config.source.as_str()).into());
    }

    let output = OutputManager::new(settings.image.clone(), settings.json.clone());
    let summary = runner::run(ExecutionPlan {
        config,
        detection: settings.detection,
        output,
        show_progress: std::io::stderr().is_terminal(),
    })
    .await?;

    log::info!(
        "{} images analyzed ({} failed), {} detections, {} critical",
        summary.processed,
        summary.failed,
        summary.detections,
        summary.critical
    );
    Ok(())
}
