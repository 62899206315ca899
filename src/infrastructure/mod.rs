// Infrastructure implementations for callorder.

pub mod concurrency;
pub mod config;
pub mod program_loader;

pub use crate::ports::dot_exporter::DotExporter;
pub use config::{AnalysisConfig, RenderConfig};
pub use program_loader::JsonProgramSource;
