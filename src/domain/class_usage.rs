// Class-usage pass for callorder.
// Records which known classes each function loads by name. Independent of
// call reconstruction; feeds the function -> class dependency view only.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::index::{ClassInfo, SymbolIndex};
use crate::domain::instruction::Operation;
use crate::domain::program::{FunctionBody, Program};

/// Known classes referenced by plain loads in a raw instruction stream.
/// Names starting with `private_prefix` are skipped.
pub fn referenced_classes(
    ops: &[Operation],
    private_prefix: &str,
    is_class: impl Fn(&str) -> bool,
) -> BTreeSet<String> {
    ops.iter()
        .filter(|op| op.kind.is_plain_load())
        .filter_map(|op| op.operand.as_text())
        .filter(|name| private_prefix.is_empty() || !name.starts_with(private_prefix))
        .filter(|name| is_class(*name))
        .map(str::to_string)
        .collect()
}

/// function -> classes it references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassUsageGraph {
    uses: BTreeMap<String, BTreeSet<String>>,
    /// Declared identity of every class that appears in `uses`.
    pub classes: BTreeMap<String, ClassInfo>,
}

impl ClassUsageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every function (on the rayon pool when `parallel`) and merge
    /// the per-function results in program order.
    pub fn build(
        program: &Program,
        index: &SymbolIndex,
        private_prefix: &str,
        parallel: bool,
    ) -> Self {
        let scan = |body: &FunctionBody| {
            let classes =
                referenced_classes(&body.instructions, private_prefix, |n| index.is_class(n));
            (body.id(), classes)
        };
        let used: Vec<(String, BTreeSet<String>)> = if parallel {
            program.functions.par_iter().map(scan).collect()
        } else {
            program.functions.iter().map(scan).collect()
        };

        let mut graph = Self::new();
        for (function, classes) in used {
            graph.insert(&function, classes, index);
        }
        graph
    }

    /// Functions that reference no class are not recorded.
    pub fn insert(&mut self, function: &str, classes: BTreeSet<String>, index: &SymbolIndex) {
        if classes.is_empty() {
            return;
        }
        for class in &classes {
            if !self.classes.contains_key(class) {
                let info = index.class(class).unwrap_or_else(|| ClassInfo::new(class));
                self.classes.insert(class.clone(), info);
            }
        }
        self.uses.entry(function.to_string()).or_default().extend(classes);
    }

    pub fn classes_of(&self, function: &str) -> Option<&BTreeSet<String>> {
        self.uses.get(function)
    }

    /// (function, class) pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.uses.iter().flat_map(|(function, classes)| {
            classes
                .iter()
                .map(move |class| (function.as_str(), class.as_str()))
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.uses.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.uses.is_empty()
    }
}
