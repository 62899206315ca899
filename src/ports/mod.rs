use std::path::Path;

use crate::domain::graph_view::GraphView;
use crate::domain::program::Program;

pub mod dot_exporter;

/// Acquisition of the target program's functions and classes.
pub trait ProgramSource {
    fn load(&self) -> anyhow::Result<Program>;
}

/// Rendering collaborator. An empty graph is a no-op, not an error;
/// returns whether anything was written.
pub trait GraphExporter {
    fn export(&self, graph: &GraphView, path: &Path) -> std::io::Result<bool>;
}
