use depthwatch_detector::ThreatReport;
use serde::Serialize;

/// One entry of the JSON report: the analysed image and what was found in it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReportRecord {
    pub source: String,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub report: ThreatReport,
}
