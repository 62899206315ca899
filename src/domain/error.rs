//! Error types for the analysis core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Edges survived frontier elimination: the call graph is not acyclic.
    #[error("call graph contains a cycle ({} unconsumed edges, e.g. {})", .edges.len(), first_edge(.edges))]
    CycleDetected { edges: Vec<(String, String)> },
}

fn first_edge(edges: &[(String, String)]) -> String {
    edges
        .first()
        .map(|(from, to)| format!("{} -> {}", from, to))
        .unwrap_or_default()
}
