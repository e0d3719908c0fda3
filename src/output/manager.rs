use std::path::PathBuf;
use std::sync::Arc;

use depthwatch_detector::ThreatAnalysis;
use tokio::sync::Mutex;

use crate::core::LoadedFrame;
use crate::settings::{ImageOutputSettings, JsonOutputSettings};

use super::error::OutputError;
use super::image::ImageOutput;
use super::json::JsonOutput;
use super::types::ImageReportRecord;

pub struct OutputManager {
    image: Option<ImageOutput>,
    json: Option<JsonOutput>,
    records: Mutex<Vec<ImageReportRecord>>,
}

impl OutputManager {
    pub fn new(
        image: Option<ImageOutputSettings>,
        json: Option<JsonOutputSettings>,
    ) -> Option<Arc<Self>> {
        if image.is_none() && json.is_none() {
            return None;
        }
        Some(Arc::new(Self {
            image: image.map(ImageOutput::new),
            json: json.map(JsonOutput::new),
            records: Mutex::new(Vec::new()),
        }))
    }

    /// Writes the annotated image (enhanced if available) and queues the
    /// report for the JSON file. Returns the image path when one was written.
    pub async fn publish(
        &self,
        loaded: &LoadedFrame,
        analysis: &ThreatAnalysis,
    ) -> Result<Option<PathBuf>, OutputError> {
        let mut written = None;
        if let Some(image) = self.image.as_ref() {
            let (frame, suffix) = match analysis.enhanced.as_ref() {
                Some(enhanced) => (enhanced, "enhanced"),
                None => (&loaded.frame, "annotated"),
            };
            let path = image
                .write(
                    &loaded.file_stem(),
                    suffix,
                    frame,
                    &analysis.report.detections,
                )
                .await?;
            written = Some(path);
        }
        if self.json.is_some() {
            let record = ImageReportRecord {
                source: loaded.label.clone(),
                width: loaded.frame.width(),
                height: loaded.frame.height(),
                report: analysis.report.clone(),
            };
            self.records.lock().await.push(record);
        }
        Ok(written)
    }

    pub async fn finalize(&self) -> Result<(), OutputError> {
        if let Some(json) = self.json.as_ref() {
            let records = self.records.lock().await;
            json.write(&records).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ImageFormat;
    use depthwatch_detector::{SyntheticDetector, seeded_rng};
    use depthwatch_types::RgbaFrame;

    #[test]
    fn nothing_configured_means_no_manager() {
        assert!(OutputManager::new(None, None).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn writes_images_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("reports/report.json");
        let manager = OutputManager::new(
            Some(ImageOutputSettings {
                dir: dir.path().join("images"),
                format: ImageFormat::Png,
            }),
            Some(JsonOutputSettings {
                path: json_path.clone(),
                pretty: false,
            }),
        )
        .unwrap();

        let frame = RgbaFrame::filled(16, 12, [30, 90, 180, 255]).unwrap();
        let loaded = LoadedFrame::new("harbour.jpg", frame);
        let analysis = SyntheticDetector::default()
            .with_enhancement(true)
            .analyze_at(&loaded.frame, &mut seeded_rng(8), 1)
            .unwrap();

        let written = manager.publish(&loaded, &analysis).await.unwrap().unwrap();
        assert!(written.ends_with("harbour_enhanced.png"));
        assert!(written.exists());

        manager.finalize().await.unwrap();
        let contents = std::fs::read_to_string(&json_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value[0]["source"], "harbour.jpg");
        assert_eq!(value[0]["width"], 16);
        assert!(value[0]["statistics"]["waterClarity"].is_number());
        assert!(value[0]["detections"].is_array());
    }
}
