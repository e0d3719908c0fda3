mod error;
mod image;
mod json;
mod manager;
mod types;

pub use error::OutputError;
pub use manager::OutputManager;
pub use types::ImageReportRecord;
