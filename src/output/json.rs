use std::path::PathBuf;

use tokio::fs;

use crate::output::error::OutputError;
use crate::output::types::ImageReportRecord;
use crate::settings::JsonOutputSettings;

pub(crate) struct JsonOutput {
    path: PathBuf,
    pretty: bool,
}

impl JsonOutput {
    pub(crate) fn new(settings: JsonOutputSettings) -> Self {
        Self {
            path: settings.path,
            pretty: settings.pretty,
        }
    }

    pub(crate) async fn write(&self, records: &[ImageReportRecord]) -> Result<(), OutputError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        write_json(self.path.clone(), records, self.pretty).await
    }
}

async fn write_json<T>(path: PathBuf, data: &T, pretty: bool) -> Result<(), OutputError>
where
    T: serde::Serialize + ?Sized,
{
    let encoded = if pretty {
        serde_json::to_vec_pretty(data)?
    } else {
        serde_json::to_vec(data)?
    };
    fs::write(path, encoded).await?;
    Ok(())
}
