//! Command-line front end for the depthwatch detector: loads images from
//! disk (or a synthetic mock source), analyzes them and writes reports.

pub mod backends;
pub mod cli;
pub mod config;
pub mod core;
pub mod output;
pub mod runner;
pub mod settings;

pub use config::{Configuration, SourceKind};
pub use core::{DynFrameSource, FrameSource, FrameStream, LoadedFrame, SourceError, SourceResult};
pub use runner::{ExecutionPlan, RunError, RunSummary, run};
