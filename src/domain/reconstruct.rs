//! Call Expression Reconstructor
//!
//! Walks a normalized instruction sequence back to front with an explicit
//! stack of pending calls. Scanning backward, a call operation opens an
//! expression, its arguments arrive last-to-first and the callee reference
//! arrives after the final argument.

use crate::domain::instruction::{OpKind, Operand, Operation};
use std::fmt;
use tracing::{debug, trace};

/// What a call site invokes.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// A plain function name.
    Name(String),
    /// `object.attribute`, both static names.
    Member { object: String, attribute: String },
    /// Anything else (call results, subscripts, nested attribute chains).
    Opaque(Box<Argument>),
}

impl From<Argument> for Callee {
    fn from(arg: Argument) -> Self {
        if let Argument::Value(op) = &arg {
            if op.kind.is_name_load() {
                if let Some(name) = op.operand.as_text() {
                    return Callee::Name(name.to_string());
                }
            }
            if op.kind == OpKind::LoadObjAttr {
                if let Operand::Tuple(parts) = &op.operand {
                    if let [Operand::Text(object), Operand::Text(attribute)] = parts.as_slice() {
                        return Callee::Member {
                            object: object.clone(),
                            attribute: attribute.clone(),
                        };
                    }
                }
            }
        }
        Callee::Opaque(Box::new(arg))
    }
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callee::Name(name) => write!(f, "{}", name),
            Callee::Member { object, attribute } => write!(f, "{}.{}", object, attribute),
            Callee::Opaque(arg) => write!(f, "{}", arg),
        }
    }
}

/// A single argument operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Value(Operation),
    Call(CallExpression),
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Value(op) => write!(f, "{}", op.operand),
            Argument::Call(call) => write!(f, "{}", call),
        }
    }
}

/// A reconstructed call site.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: Option<Callee>,
    /// Declared argument count taken from the call operation.
    pub arity: usize,
    /// Arguments in source order.
    pub args: Vec<Argument>,
}

impl CallExpression {
    pub fn new(arity: usize) -> Self {
        Self {
            callee: None,
            arity,
            args: Vec::with_capacity(arity),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.callee.is_some() && self.args.len() == self.arity
    }

    /// Accept the next value seen by the backward scan.
    ///
    /// Values fill the argument list front-first; once it is full the next
    /// value is the callee.
    pub fn feed(&mut self, arg: Argument) {
        if self.args.len() < self.arity {
            self.args.insert(0, arg);
        } else if self.callee.is_none() {
            self.callee = Some(Callee::from(arg));
        }
    }

    pub fn callee_name(&self) -> Option<&str> {
        match &self.callee {
            Some(Callee::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Object construction: the callee textually names a known class.
    pub fn is_constructor(&self, is_class: impl Fn(&str) -> bool) -> bool {
        self.callee_name().is_some_and(is_class)
    }

    /// Calls nested directly inside this one (arguments and call-result callees).
    pub fn nested_calls(&self) -> impl Iterator<Item = &CallExpression> {
        let from_callee = match &self.callee {
            Some(Callee::Opaque(arg)) => match arg.as_ref() {
                Argument::Call(call) => Some(call),
                Argument::Value(_) => None,
            },
            _ => None,
        };
        self.args
            .iter()
            .filter_map(|arg| match arg {
                Argument::Call(call) => Some(call),
                Argument::Value(_) => None,
            })
            .chain(from_callee)
    }
}

impl fmt::Display for CallExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.callee {
            Some(callee) => write!(f, "{}", callee)?,
            None => write!(f, "?")?,
        }
        write!(f, "(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// Reconstruct the top-level call expressions of a normalized sequence, in
/// discovery order (last call site first).
///
/// Constructor calls (callee names a known class) are dropped. A call
/// operation without a usable arity makes the whole sequence unreadable and
/// yields no calls.
pub fn reconstruct_calls(
    ops: &[Operation],
    is_class: impl Fn(&str) -> bool,
) -> Vec<CallExpression> {
    let mut calls = Vec::new();
    let mut stack: Vec<CallExpression> = Vec::new();

    for i in (0..ops.len()).rev() {
        let op = &ops[i];
        if op.kind == OpKind::Call {
            // Mapping construction artifact, not a real call.
            if ops.get(i + 1).is_some_and(|next| next.kind == OpKind::StoreMap) {
                continue;
            }
            let Some(arity) = op.operand.as_count() else {
                debug!("call at {} has no usable arity ({}), skipping sequence", i, op.operand);
                return Vec::new();
            };
            stack.push(CallExpression::new(arity));
        } else if op.kind.is_value() {
            let Some(top) = stack.last_mut() else {
                continue;
            };
            top.feed(Argument::Value(op.clone()));
            fold_completed(&mut stack, &mut calls, &is_class);
        }
    }

    calls
}

fn fold_completed(
    stack: &mut Vec<CallExpression>,
    calls: &mut Vec<CallExpression>,
    is_class: &impl Fn(&str) -> bool,
) {
    while stack.len() > 1 && stack.last().is_some_and(CallExpression::is_complete) {
        if let Some(done) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.feed(Argument::Call(done));
            }
        }
    }

    if stack.len() == 1 && stack[0].is_complete() {
        if let Some(done) = stack.pop() {
            if done.is_constructor(is_class) {
                trace!("dropping constructor call {}", done);
            } else {
                calls.push(done);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instruction::BinaryOp;
    use crate::domain::normalize::normalize;

    fn name(s: &str) -> Operation {
        Operation::load(OpKind::LoadGlobal, s)
    }

    fn fast(s: &str) -> Operation {
        Operation::load(OpKind::LoadFast, s)
    }

    fn no_classes(_: &str) -> bool {
        false
    }

    fn run(raw: Vec<Operation>, classes: &[&str]) -> Vec<CallExpression> {
        let normalized = normalize(&raw).unwrap();
        reconstruct_calls(&normalized.ops, |n| classes.contains(&n))
    }

    #[test]
    fn test_zero_arity_call() {
        let calls = run(vec![name("c"), Operation::call(0)], &[]);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].callee_name(), Some("c"));
        assert!(calls[0].args.is_empty());
    }

    #[test]
    fn test_arguments_in_source_order() {
        let calls = run(vec![name("f"), fast("x"), fast("y"), Operation::call(2)], &[]);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to_string(), "f(x,y)");
    }

    #[test]
    fn test_nested_call_is_folded_into_argument() {
        // f(g(x))
        let calls = run(
            vec![name("f"), name("g"), fast("x"), Operation::call(1), Operation::call(1)],
            &[],
        );
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].callee_name(), Some("f"));
        let nested: Vec<_> = calls[0].nested_calls().collect();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].callee_name(), Some("g"));
        assert_eq!(calls[0].to_string(), "f(g(x))");
    }

    #[test]
    fn test_sequential_calls_in_discovery_order() {
        let calls = run(
            vec![
                name("first"),
                Operation::call(0),
                Operation::bare(OpKind::Other),
                name("second"),
                fast("a"),
                Operation::call(1),
            ],
            &[],
        );
        let names: Vec<_> = calls.iter().filter_map(|c| c.callee_name()).collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn test_slice_and_tuple_arguments() {
        // f(x[a:b:c], (p, q, r))
        let calls = run(
            vec![
                name("f"),
                fast("x"),
                fast("a"),
                fast("b"),
                fast("c"),
                Operation::new(OpKind::BuildSlice, Operand::Int(3)),
                Operation::bare(OpKind::Binary(BinaryOp::Subscr)),
                fast("p"),
                fast("q"),
                fast("r"),
                Operation::new(OpKind::BuildTuple, Operand::Int(3)),
                Operation::call(2),
            ],
            &[],
        );
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args.len(), 2);
        assert_eq!(calls[0].to_string(), "f((x, (a, b, c)),(p, q, r))");
    }

    #[test]
    fn test_constructor_call_dropped() {
        let calls = run(vec![name("Widget"), fast("x"), Operation::call(1)], &["Widget"]);
        assert!(calls.is_empty());
    }

    #[test]
    fn test_constructor_inside_call_stays_an_argument() {
        // f(Widget())
        let calls = run(
            vec![name("f"), name("Widget"), Operation::call(0), Operation::call(1)],
            &["Widget"],
        );
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].callee_name(), Some("f"));
    }

    #[test]
    fn test_member_callee() {
        let calls = run(
            vec![
                fast("Foo"),
                Operation::load(OpKind::LoadAttr, "method"),
                Operation::call(0),
            ],
            &[],
        );
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].callee,
            Some(Callee::Member {
                object: "Foo".to_string(),
                attribute: "method".to_string()
            })
        );
    }

    #[test]
    fn test_constant_callee_is_opaque() {
        let ops = vec![
            Operation::new(OpKind::LoadConst, Operand::text("f")),
            Operation::call(0),
        ];
        let calls = reconstruct_calls(&ops, no_classes);
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0].callee, Some(Callee::Opaque(_))));
        assert_eq!(calls[0].callee_name(), None);
    }

    #[test]
    fn test_call_result_callee_is_opaque() {
        // f()(x)
        let calls = run(
            vec![name("f"), Operation::call(0), fast("x"), Operation::call(1)],
            &[],
        );
        assert_eq!(calls.len(), 1);
        let inner: Vec<_> = calls[0].nested_calls().collect();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].callee_name(), Some("f"));
        assert_eq!(calls[0].callee_name(), None);
    }

    #[test]
    fn test_call_before_store_map_ignored() {
        let ops = vec![
            name("f"),
            fast("k"),
            Operation::call(1),
            Operation::bare(OpKind::StoreMap),
            name("g"),
            Operation::call(0),
        ];
        let calls = reconstruct_calls(&ops, no_classes);
        // The first call never opens an expression, so its operands are
        // unclaimed and only g() survives.
        let names: Vec<_> = calls.iter().filter_map(|c| c.callee_name()).collect();
        assert_eq!(names, vec!["g"]);
    }

    #[test]
    fn test_malformed_arity_yields_nothing() {
        let ops = vec![
            name("f"),
            Operation::new(OpKind::Call, Operand::text("bogus")),
            name("g"),
            Operation::call(0),
        ];
        assert!(reconstruct_calls(&ops, no_classes).is_empty());
    }

    #[test]
    fn test_incomplete_expression_not_emitted() {
        // Arguments without a callee in front of them.
        let ops = vec![fast("x"), Operation::call(1)];
        assert!(reconstruct_calls(&ops, no_classes).is_empty());
    }
}
