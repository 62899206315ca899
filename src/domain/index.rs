use dashmap::DashMap;
use rayon::prelude::*;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::program::Program;

/// Identifier of an analysed function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FunctionName {
    Plain(String),
    /// A method, rendered `Class.method`.
    Method { class: String, method: String },
}

impl FunctionName {
    pub fn plain(name: &str) -> Self {
        FunctionName::Plain(name.to_string())
    }

    pub fn method(class: &str, method: &str) -> Self {
        FunctionName::Method {
            class: class.to_string(),
            method: method.to_string(),
        }
    }

    /// Graph node identifier.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionName::Plain(name) => write!(f, "{}", name),
            FunctionName::Method { class, method } => write!(f, "{}.{}", class, method),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: FunctionName,
    /// Declared positional parameter count.
    pub arity: usize,
}

impl FunctionSignature {
    pub fn new(name: FunctionName, arity: usize) -> Self {
        Self { name, arity }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    /// Declared identity, e.g. `pkg.module.Widget`.
    pub qualname: String,
}

impl ClassInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            qualname: name.to_string(),
        }
    }
}

/// Thread-safe symbol index of the target program.
/// Built once, in parallel, then only read during analysis.
#[derive(Default)]
pub struct SymbolIndex {
    // Key: FunctionName::id()
    pub functions: DashMap<String, FunctionSignature>,

    // Key: class name
    pub classes: DashMap<String, ClassInfo>,
}

impl SymbolIndex {
    pub fn build(program: &Program) -> Self {
        let index = SymbolIndex::default();

        program.functions.par_iter().for_each(|body| {
            index.functions.insert(body.signature.name.id(), body.signature.clone());
        });
        program.classes.par_iter().for_each(|class| {
            index.classes.insert(class.name.clone(), class.clone());
        });

        index
    }

    /// Exact (name, argument count) match against a known signature.
    /// Returns a clone to avoid holding DashMap locks.
    pub fn resolve(&self, name: &str, arg_count: usize) -> Option<FunctionSignature> {
        self.functions
            .get(name)
            .filter(|sig| sig.arity == arg_count)
            .map(|sig| sig.clone())
    }

    pub fn is_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn class(&self, name: &str) -> Option<ClassInfo> {
        self.classes.get(name).map(|c| c.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::program::FunctionBody;

    fn sample_program() -> Program {
        Program {
            functions: vec![
                FunctionBody::new(FunctionSignature::new(FunctionName::plain("b"), 1), vec![]),
                FunctionBody::new(FunctionSignature::new(FunctionName::plain("a"), 0), vec![]),
                FunctionBody::new(
                    FunctionSignature::new(FunctionName::method("Foo", "run"), 1),
                    vec![],
                ),
            ],
            classes: vec![ClassInfo {
                name: "Foo".to_string(),
                qualname: "pkg.Foo".to_string(),
            }],
        }
    }

    #[test]
    fn test_resolve_exact_arity() {
        let index = SymbolIndex::build(&sample_program());
        assert!(index.resolve("b", 1).is_some());
        assert!(index.resolve("b", 0).is_none());
        assert!(index.resolve("b", 2).is_none());
        assert!(index.resolve("missing", 0).is_none());
    }

    #[test]
    fn test_classes_and_ids() {
        let index = SymbolIndex::build(&sample_program());
        assert!(index.is_class("Foo"));
        assert!(!index.is_class("a"));
        assert_eq!(index.class("Foo").unwrap().qualname, "pkg.Foo");
        assert!(index.resolve("Foo.run", 1).is_some());
    }

    #[test]
    fn test_function_name_display() {
        assert_eq!(FunctionName::method("Foo", "run").to_string(), "Foo.run");
        assert_eq!(FunctionName::plain("f").id(), "f");
    }
}
