//! DOT Exporter
//!
//! Exports a GraphView as Graphviz DOT text.

use crate::domain::graph_view::{GraphView, ViewNodeKind};
use crate::ports::GraphExporter;
use std::io::Result;
use std::path::Path;

pub struct DotExporter;

impl GraphExporter for DotExporter {
    fn export(&self, graph: &GraphView, path: &Path) -> Result<bool> {
        if graph.is_empty() {
            return Ok(false);
        }
        std::fs::write(path, Self::to_dot(graph))?;
        Ok(true)
    }
}

impl DotExporter {
    /// Convert a GraphView to a DOT string.
    pub fn to_dot(graph: &GraphView) -> String {
        let mut lines = Vec::new();

        lines.push(format!("digraph \"{}\" {{", Self::escape_label(&graph.name)));
        // Edgeless graphs read better with a spring layout
        if graph.edges.is_empty() {
            lines.push("    layout=neato;".to_string());
        } else {
            lines.push("    rankdir=TB;".to_string());
        }
        lines.push("    node [fontname=\"Helvetica\", fontsize=12];".to_string());
        lines.push("".to_string());

        for node in &graph.nodes {
            let (shape, color) = Self::node_style(node.kind);
            lines.push(format!(
                "    \"{}\" [label=\"{}\", shape={}, style=\"filled\", fillcolor=\"{}\"];",
                Self::escape_label(&node.id),
                Self::escape_label(&node.label),
                shape,
                color
            ));
        }

        if !graph.edges.is_empty() {
            lines.push("".to_string());
        }
        for edge in &graph.edges {
            lines.push(format!(
                "    \"{}\" -> \"{}\";",
                Self::escape_label(&edge.from),
                Self::escape_label(&edge.to)
            ));
        }

        lines.push("}".to_string());

        lines.join("\n")
    }

    fn node_style(kind: ViewNodeKind) -> (&'static str, &'static str) {
        match kind {
            ViewNodeKind::Function => ("box", "#89b4fa"), // Blue
            ViewNodeKind::Method => ("box", "#cba6f7"),   // Purple
            ViewNodeKind::Class => ("ellipse", "#a6e3a1"), // Green
        }
    }

    fn escape_label(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}
