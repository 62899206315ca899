// Call graph structures for callorder.
// Function-to-function call relationships plus the class-method usage
// recorded for calls that cannot be resolved to a function.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

use crate::domain::index::SymbolIndex;
use crate::domain::normalize::normalize;
use crate::domain::program::{FunctionBody, Program};
use crate::domain::reconstruct::{reconstruct_calls, CallExpression, Callee};

/// Directed call graph; nodes and edges are deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallGraph {
    pub nodes: BTreeSet<String>,
    /// (caller, callee)
    pub edges: BTreeSet<(String, String)>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: &str) {
        if !self.nodes.contains(id) {
            self.nodes.insert(id.to_string());
        }
    }

    /// Adds the edge, creating either endpoint on first sight.
    pub fn add_edge(&mut self, caller_id: &str, callee_id: &str) {
        self.add_node(caller_id);
        self.add_node(callee_id);
        self.edges.insert((caller_id.to_string(), callee_id.to_string()));
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn contains_edge(&self, caller_id: &str, callee_id: &str) -> bool {
        self.edges.contains(&(caller_id.to_string(), callee_id.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// function -> class -> methods invoked on that class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassUsageMap {
    entries: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl ClassUsageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, function: &str, class: &str, method: &str) {
        self.entries
            .entry(function.to_string())
            .or_default()
            .entry(class.to_string())
            .or_default()
            .insert(method.to_string());
    }

    pub fn methods(&self, function: &str, class: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(function).and_then(|classes| classes.get(class))
    }

    /// Classes a function invokes methods on.
    pub fn classes_of(&self, function: &str) -> impl Iterator<Item = &str> {
        self.entries
            .get(function)
            .into_iter()
            .flat_map(|classes| classes.keys().map(String::as_str))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, BTreeSet<String>>)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of resolving one call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Known function with matching arity.
    Function(String),
    /// `Class.method` on a known class; no edge.
    ClassMethod { class: String, method: String },
    Unresolved,
}

/// Resolves reconstructed calls against the symbol index.
pub struct CallGraphBuilder<'a> {
    index: &'a SymbolIndex,
    resolve_nested: bool,
    parallel: bool,
}

impl<'a> CallGraphBuilder<'a> {
    pub fn new(index: &'a SymbolIndex) -> Self {
        Self {
            index,
            resolve_nested: false,
            parallel: false,
        }
    }

    /// Also resolve calls nested inside arguments (`a` calling `b(c())`
    /// then records `a -> c` as well).
    pub fn with_nested_calls(mut self, enabled: bool) -> Self {
        self.resolve_nested = enabled;
        self
    }

    /// Discover calls on the rayon pool. Merging stays sequential.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Normalize and reconstruct the calls of one function.
    /// Functions without a call site yield nothing.
    pub fn discover(&self, body: &FunctionBody) -> Vec<CallExpression> {
        match normalize(&body.instructions) {
            Some(normalized) => {
                reconstruct_calls(&normalized.ops, |name| self.index.is_class(name))
            }
            None => Vec::new(),
        }
    }

    pub fn resolve(&self, call: &CallExpression) -> Resolution {
        match &call.callee {
            Some(Callee::Name(name)) if self.index.resolve(name, call.args.len()).is_some() => {
                Resolution::Function(name.clone())
            }
            Some(Callee::Member { object, attribute }) if self.index.is_class(object) => {
                Resolution::ClassMethod {
                    class: object.clone(),
                    method: attribute.clone(),
                }
            }
            _ => Resolution::Unresolved,
        }
    }

    /// Merge one function's discovered calls into the shared structures.
    pub fn record(
        &self,
        caller: &str,
        calls: &[CallExpression],
        graph: &mut CallGraph,
        usage: &mut ClassUsageMap,
    ) {
        for call in calls {
            match self.resolve(call) {
                Resolution::Function(callee) => graph.add_edge(caller, &callee),
                Resolution::ClassMethod { class, method } => usage.record(caller, &class, &method),
                Resolution::Unresolved => trace!("{}: unresolved call {}", caller, call),
            }
            if self.resolve_nested {
                let nested: Vec<CallExpression> = call.nested_calls().cloned().collect();
                self.record(caller, &nested, graph, usage);
            }
        }
    }

    /// Build over the whole program: per-function discovery, then a
    /// single-threaded merge in program order.
    pub fn build(&self, program: &Program) -> (CallGraph, ClassUsageMap) {
        let discover = |body: &FunctionBody| (body.id(), self.discover(body));
        let discovered: Vec<(String, Vec<CallExpression>)> = if self.parallel {
            program.functions.par_iter().map(discover).collect()
        } else {
            program.functions.iter().map(discover).collect()
        };

        let mut graph = CallGraph::new();
        let mut usage = ClassUsageMap::new();
        for (caller, calls) in &discovered {
            if calls.is_empty() {
                debug!("{}: no call sites reconstructed", caller);
                continue;
            }
            self.record(caller, calls, &mut graph, &mut usage);
        }
        (graph, usage)
    }
}
