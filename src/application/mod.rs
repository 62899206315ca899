// Application layer: wires loading, analysis, ordering and rendering.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::domain::callgraph::{CallGraph, CallGraphBuilder, ClassUsageMap};
use crate::domain::class_usage::ClassUsageGraph;
use crate::domain::error::AnalysisError;
use crate::domain::graph_view::GraphView;
use crate::domain::index::SymbolIndex;
use crate::domain::program::{FunctionBody, Program};
use crate::domain::toposort::{toposort, TopologicalOrder};
use crate::infrastructure::config::AnalysisConfig;
use crate::ports::{GraphExporter, ProgramSource};

/// Everything one analysis run produces.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub total_functions: usize,
    pub call_graph: CallGraph,
    /// Methods invoked on known classes, per calling function.
    pub class_methods: ClassUsageMap,
    pub class_usage: ClassUsageGraph,
    pub order: TopologicalOrder,
}

/// Run the full analysis over an acquired program.
///
/// Per-function work runs independently (on the rayon pool when
/// `config.parallel`) and is merged afterwards; the sort starts only once
/// every function has been analysed. A cyclic call graph is fatal.
pub fn analyze(
    program: &Program,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    info!("[Total: {} functions]", program.functions.len());
    let index = SymbolIndex::build(program);

    info!("function -> function: working out test order (root -> leaf)");
    let (call_graph, class_methods) = CallGraphBuilder::new(&index)
        .with_nested_calls(config.resolve_nested_calls)
        .parallel(config.parallel)
        .build(program);
    info!(
        "call graph: {} nodes, {} edges",
        call_graph.nodes.len(),
        call_graph.edges.len()
    );

    let known: Vec<String> = program.functions.iter().map(FunctionBody::id).collect();
    let order = toposort(call_graph.clone(), known.iter().map(String::as_str))?;

    info!("function -> class: classes loaded in function bodies");
    let class_usage =
        ClassUsageGraph::build(program, &index, &config.private_prefix, config.parallel);

    Ok(AnalysisReport {
        total_functions: program.functions.len(),
        call_graph,
        class_methods,
        class_usage,
        order,
    })
}

pub struct AnalyzeUsecase<'a> {
    pub source: &'a dyn ProgramSource,
    pub exporter: &'a dyn GraphExporter,
    pub config: &'a AnalysisConfig,
}

impl<'a> AnalyzeUsecase<'a> {
    /// Load, analyse and, when `graphs_dir` is given, render both graphs.
    pub fn run(&self, graphs_dir: Option<&Path>) -> Result<AnalysisReport> {
        let program = self.source.load()?;
        let report = analyze(&program, self.config)?;

        if let Some(dir) = graphs_dir {
            self.render(&report, dir)?;
        }

        Ok(report)
    }

    fn render(&self, report: &AnalysisReport, dir: &Path) -> Result<()> {
        let basename = &self.config.render.basename;

        let functions = GraphView::from_call_graph("function dependency", &report.call_graph);
        let functions = if self.config.render.methods {
            functions
        } else {
            functions.without_methods()
        };
        let classes = GraphView::from_class_usage("class dependency", &report.class_usage);

        for (view, suffix) in [(functions, "fns"), (classes, "cls")] {
            let path = dir.join(format!("{}_{}.dot", basename, suffix));
            let written = self
                .exporter
                .export(&view, &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if written {
                info!("wrote {}", path.display());
            } else {
                debug!("{} graph is empty, nothing written", view.name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::index::{ClassInfo, FunctionName, FunctionSignature};
    use crate::domain::instruction::{OpKind, Operation};

    fn body(name: &str, arity: usize, instructions: Vec<Operation>) -> FunctionBody {
        FunctionBody::new(FunctionSignature::new(FunctionName::plain(name), arity), instructions)
    }

    fn global(s: &str) -> Operation {
        Operation::load(OpKind::LoadGlobal, s)
    }

    fn chain_program() -> Program {
        Program {
            functions: vec![
                body(
                    "a",
                    0,
                    vec![global("b"), Operation::load(OpKind::LoadFast, "x"), Operation::call(1)],
                ),
                body("b", 1, vec![global("c"), Operation::call(0)]),
                body("c", 0, vec![global("Widget")]),
                body("lonely", 0, vec![]),
            ],
            classes: vec![ClassInfo::new("Widget")],
        }
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let program = chain_program();
        let parallel = analyze(&program, &AnalysisConfig::default()).unwrap();
        let sequential = analyze(
            &program,
            &AnalysisConfig {
                parallel: false,
                ..AnalysisConfig::default()
            },
        )
        .unwrap();

        assert_eq!(parallel.call_graph, sequential.call_graph);
        assert_eq!(parallel.order, sequential.order);
        assert_eq!(parallel.class_usage, sequential.class_usage);
        assert_eq!(parallel.order.ordered, vec!["a", "b", "c"]);
        assert_eq!(parallel.order.isolated, vec!["lonely"]);
        assert_eq!(parallel.total_functions, 4);
    }

    #[test]
    fn test_class_usage_collected() {
        let report = analyze(&chain_program(), &AnalysisConfig::default()).unwrap();
        let classes = report.class_usage.classes_of("c").unwrap();
        assert!(classes.contains("Widget"));
    }

    #[test]
    fn test_cycle_is_fatal() {
        let program = Program {
            functions: vec![
                body("ping", 0, vec![global("pong"), Operation::call(0)]),
                body("pong", 0, vec![global("ping"), Operation::call(0)]),
            ],
            classes: vec![],
        };
        let err = analyze(&program, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::CycleDetected { .. }));
    }
}
