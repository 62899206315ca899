//! Renderable Graph View
//!
//! Flattened node/edge lists handed to graph exporters, built from either
//! the call graph or the class-usage graph.

use crate::domain::callgraph::CallGraph;
use crate::domain::class_usage::ClassUsageGraph;

/// A graph ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphView {
    /// Graph title
    pub name: String,
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    /// Unique identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Node type for visual styling
    pub kind: ViewNodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewNodeKind {
    Function,
    /// `Class.method`
    Method,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEdge {
    pub from: String,
    pub to: String,
}

impl GraphView {
    pub fn from_call_graph(name: &str, graph: &CallGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|id| ViewNode {
                id: id.clone(),
                label: id.clone(),
                kind: if id.contains('.') {
                    ViewNodeKind::Method
                } else {
                    ViewNodeKind::Function
                },
            })
            .collect();
        let edges = graph
            .edges
            .iter()
            .map(|(from, to)| ViewEdge {
                from: from.clone(),
                to: to.clone(),
            })
            .collect();
        Self {
            name: name.to_string(),
            nodes,
            edges,
        }
    }

    /// Class nodes are keyed by declared identity so a function and a class
    /// sharing a name stay distinct.
    pub fn from_class_usage(name: &str, graph: &ClassUsageGraph) -> Self {
        let class_id = |class: &str| {
            let qualname = graph
                .classes
                .get(class)
                .map(|info| info.qualname.as_str())
                .unwrap_or(class);
            format!("class:{}", qualname)
        };

        let mut nodes: Vec<ViewNode> = graph
            .functions()
            .map(|function| ViewNode {
                id: function.to_string(),
                label: function.to_string(),
                kind: if function.contains('.') {
                    ViewNodeKind::Method
                } else {
                    ViewNodeKind::Function
                },
            })
            .collect();
        nodes.extend(graph.classes.values().map(|info| ViewNode {
            id: class_id(&info.name),
            label: info.name.clone(),
            kind: ViewNodeKind::Class,
        }));

        let edges = graph
            .edges()
            .map(|(function, class)| ViewEdge {
                from: function.to_string(),
                to: class_id(class),
            })
            .collect();

        Self {
            name: name.to_string(),
            nodes,
            edges,
        }
    }

    /// Keep the nodes and edges accepted by the predicates.
    pub fn filtered(
        &self,
        node_pred: impl Fn(&ViewNode) -> bool,
        edge_pred: impl Fn(&ViewEdge) -> bool,
    ) -> Self {
        Self {
            name: self.name.clone(),
            nodes: self.nodes.iter().filter(|n| node_pred(n)).cloned().collect(),
            edges: self.edges.iter().filter(|e| edge_pred(e)).cloned().collect(),
        }
    }

    /// Drop method nodes and every edge touching one.
    pub fn without_methods(&self) -> Self {
        self.filtered(
            |node| node.kind != ViewNodeKind::Method,
            |edge| !edge.from.contains('.') && !edge.to.contains('.'),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
