use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::application::AnalysisReport;
use crate::domain::graph_view::{GraphView, ViewNodeKind};

/// Serializable analysis report for the test-execution harness.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportDto {
    pub total_functions: usize,
    pub isolated: Vec<String>,
    pub ordered: Vec<String>,
    pub call_graph: GraphDto,
    /// function -> class -> invoked methods
    pub class_methods: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    pub class_usage: GraphDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphDto {
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeDto {
    pub id: String,
    pub label: String,
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeDto {
    pub from: String,
    pub to: String,
    pub type_: String,
}

impl GraphDto {
    /// Flatten a rendered view; every edge gets `edge_type`.
    pub fn from_view(view: &GraphView, edge_type: &str) -> Self {
        Self {
            nodes: view
                .nodes
                .iter()
                .map(|node| NodeDto {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    kind: match node.kind {
                        ViewNodeKind::Function => "function",
                        ViewNodeKind::Method => "method",
                        ViewNodeKind::Class => "class",
                    }
                    .to_string(),
                })
                .collect(),
            edges: view
                .edges
                .iter()
                .map(|edge| EdgeDto {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    type_: edge_type.to_string(),
                })
                .collect(),
        }
    }
}

impl From<&AnalysisReport> for ReportDto {
    fn from(report: &AnalysisReport) -> Self {
        let call_graph = GraphView::from_call_graph("function dependency", &report.call_graph);
        let class_usage = GraphView::from_class_usage("class dependency", &report.class_usage);

        let class_methods = report
            .class_methods
            .iter()
            .map(|(function, classes)| {
                let classes = classes
                    .iter()
                    .map(|(class, methods)| (class.clone(), methods.iter().cloned().collect()))
                    .collect();
                (function.clone(), classes)
            })
            .collect();

        ReportDto {
            total_functions: report.total_functions,
            isolated: report.order.isolated.clone(),
            ordered: report.order.ordered.clone(),
            call_graph: GraphDto::from_view(&call_graph, "call"),
            class_methods,
            class_usage: GraphDto::from_view(&class_usage, "uses"),
        }
    }
}

/// Plain-text summary for terminals.
impl fmt::Display for ReportDto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Total: {} functions]", self.total_functions)?;
        writeln!(f, "Test order ({} functions):", self.ordered.len())?;
        for (i, function) in self.ordered.iter().enumerate() {
            writeln!(f, "  {:>3}. {}", i + 1, function)?;
        }
        writeln!(f, "Isolated ({} functions):", self.isolated.len())?;
        for function in &self.isolated {
            writeln!(f, "       {}", function)?;
        }
        if !self.class_methods.is_empty() {
            writeln!(f, "Class methods invoked:")?;
            for (function, classes) in &self.class_methods {
                for (class, methods) in classes {
                    writeln!(f, "  {} -> {}.{{{}}}", function, class, methods.join(", "))?;
                }
            }
        }
        Ok(())
    }
}
