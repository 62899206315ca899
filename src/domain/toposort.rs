//! Topological Sorter
//!
//! Kahn-style frontier elimination over the call graph producing a
//! caller-before-callee order. The graph is consumed: edges are deleted as
//! their source is placed, and any edge left at the end means a cycle.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::domain::callgraph::CallGraph;
use crate::domain::error::{AnalysisError, Result};

/// Processing order for the test harness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologicalOrder {
    /// Known functions taking part in no resolved call.
    pub isolated: Vec<String>,
    /// Graph participants, every caller ahead of its callees.
    pub ordered: Vec<String>,
}

impl TopologicalOrder {
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ordered.iter().position(|n| n == id)
    }
}

/// Sort the call graph. `known` lists every function of the program.
///
/// Self-calls are ignored. Among equally eligible nodes the pick is
/// arbitrary, so only the partial order is guaranteed.
pub fn toposort<'k>(
    graph: CallGraph,
    known: impl IntoIterator<Item = &'k str>,
) -> Result<TopologicalOrder> {
    let CallGraph { nodes, mut edges } = graph;

    let isolated: Vec<String> = known
        .into_iter()
        .filter(|id| !nodes.contains(*id))
        .map(str::to_string)
        .collect();

    // Recursion does not constrain the order.
    edges.retain(|(from, to)| from != to);

    let mut outgoing: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut incoming: BTreeMap<&str, usize> = nodes.iter().map(|n| (n.as_str(), 0)).collect();
    for (from, to) in &edges {
        outgoing.entry(from.as_str()).or_default().push(to.as_str());
        *incoming.entry(to.as_str()).or_default() += 1;
    }

    let mut frontier: Vec<&str> = incoming
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();

    let mut ordered = Vec::with_capacity(nodes.len());
    let mut consumed: BTreeSet<(&str, &str)> = BTreeSet::new();

    while let Some(node) = frontier.pop() {
        ordered.push(node.to_string());
        for target in outgoing.remove(node).unwrap_or_default() {
            consumed.insert((node, target));
            if let Some(count) = incoming.get_mut(target) {
                *count -= 1;
                if *count == 0 {
                    frontier.push(target);
                }
            }
        }
    }

    let remaining: Vec<(String, String)> = edges
        .iter()
        .filter(|(from, to)| !consumed.contains(&(from.as_str(), to.as_str())))
        .cloned()
        .collect();
    if !remaining.is_empty() {
        return Err(AnalysisError::CycleDetected { edges: remaining });
    }

    debug!(
        "topological order: {} ordered, {} isolated",
        ordered.len(),
        isolated.len()
    );

    Ok(TopologicalOrder { isolated, ordered })
}
