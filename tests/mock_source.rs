use depthwatch::output::OutputManager;
use depthwatch::settings::JsonOutputSettings;
use depthwatch::{Configuration, ExecutionPlan, SourceKind, run};
use depthwatch_detector::{DetectorKind, ThreatDetectionOptions};
use tokio_stream::StreamExt;

fn options(seed: u64) -> ThreatDetectionOptions {
    ThreatDetectionOptions {
        detector: DetectorKind::Synthetic,
        seed: Some(seed),
        ..ThreatDetectionOptions::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn mock_source_produces_stream() {
    let config = Configuration {
        source: SourceKind::Mock,
        ..Configuration::default()
    };
    let source = config.create_source().expect("mock source available");
    assert_eq!(source.total_frames(), Some(8));
    let mut stream = source.into_stream();
    let mut frames = Vec::new();
    while let Some(frame) = stream.next().await {
        frames.push(frame.unwrap());
        if frames.len() == 3 {
            break;
        }
    }
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].frame.width(), 320);
    assert_eq!(frames[0].frame.height(), 180);
}

#[tokio::test(flavor = "multi_thread")]
async fn mock_run_writes_a_report_per_frame() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("report.json");
    let output = OutputManager::new(
        None,
        Some(JsonOutputSettings {
            path: json_path.clone(),
            pretty: true,
        }),
    );

    let summary = run(ExecutionPlan {
        config: Configuration {
            source: SourceKind::Mock,
            ..Configuration::default()
        },
        detection: options(11),
        output,
        show_progress: false,
    })
    .await
    .unwrap();
    assert_eq!(summary.processed, 8);
    assert_eq!(summary.failed, 0);

    let contents = std::fs::read_to_string(&json_path).unwrap();
    let reports: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 8);
    assert_eq!(reports[0]["source"], "mock-0000");
    let detections: usize = reports
        .iter()
        .map(|report| report["detections"].as_array().unwrap().len())
        .sum();
    assert_eq!(detections, summary.detections);
    for report in reports {
        assert!(report["detections"].as_array().unwrap().len() <= 3);
        assert!(report["enhancement"].is_object());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.png");
    image::RgbaImage::from_pixel(6, 4, image::Rgba([20, 80, 200, 255]))
        .save(&good)
        .unwrap();

    let summary = run(ExecutionPlan {
        config: Configuration {
            source: SourceKind::File,
            inputs: vec![dir.path().join("missing.png"), good],
            ..Configuration::default()
        },
        detection: options(5),
        output: None,
        show_progress: false,
    })
    .await
    .unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn file_source_without_inputs_is_rejected() {
    let result = run(ExecutionPlan {
        config: Configuration::default(),
        detection: options(1),
        output: None,
        show_progress: false,
    })
    .await;
    assert!(matches!(result, Err(depthwatch::RunError::Source(_))));
}
