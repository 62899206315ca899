//! Instruction Normalizer
//!
//! Collapses multi-instruction value constructions (attribute paths, tuple
//! literals, slices, binary operations) into single logical load operations
//! so the call reconstructor only ever sees one operation per value.

use crate::domain::instruction::{OpKind, Operand, Operation};

/// A normalized instruction sequence, truncated after its last call site.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub ops: Vec<Operation>,
    /// End index of the last call site after collapsing (exclusive).
    pub end_index: usize,
}

/// Exclusive end index of the rightmost call operation, if any.
pub fn find_rightmost_call(ops: &[Operation]) -> Option<usize> {
    ops.iter()
        .rposition(|op| op.kind == OpKind::Call)
        .map(|pos| pos + 1)
}

/// Normalize one function's raw instructions.
///
/// Returns `None` when the stream contains no call site at all.
pub fn normalize(raw: &[Operation]) -> Option<Normalized> {
    let end = find_rightmost_call(raw)?;

    let mut ops: Vec<Operation> = raw[..end]
        .iter()
        .filter(|op| op.kind != OpKind::SetLineno)
        .cloned()
        .collect();
    let mut end_index = ops.len();

    let mut i = 0;
    while i < ops.len() {
        let Some(merge) = plan_collapse(&ops, i) else {
            i += 1;
            continue;
        };

        let sources = if merge.include_self {
            &ops[merge.start..=i]
        } else {
            &ops[merge.start..i]
        };
        let operands: Vec<Operand> = sources.iter().map(|op| op.operand.clone()).collect();
        let merged = Operation::new(merge.kind, Operand::Tuple(operands));

        ops.splice(merge.start..=i, std::iter::once(merged));
        end_index -= i - merge.start;
        // Merges shift indices; resume right after the merged operation.
        i = merge.start + 1;
    }

    Some(Normalized { ops, end_index })
}

struct Collapse {
    start: usize,
    kind: OpKind,
    /// Whether the triggering operation's own operand belongs in the tuple.
    include_self: bool,
}

fn plan_collapse(ops: &[Operation], i: usize) -> Option<Collapse> {
    let op = &ops[i];
    match op.kind {
        OpKind::LoadAttr => {
            let prev = &ops[i.checked_sub(1)?];
            // A load after BUILD_MAP is a mapping key, not an attribute path.
            if prev.kind == OpKind::BuildMap || !prev.kind.is_value() {
                return None;
            }
            Some(Collapse {
                start: i - 1,
                kind: OpKind::LoadObjAttr,
                include_self: true,
            })
        }
        OpKind::BuildTuple => {
            let start = value_run_start(ops, i, op.operand.as_count()?)?;
            Some(Collapse {
                start,
                kind: OpKind::LoadTuple,
                include_self: false,
            })
        }
        OpKind::Slice(form) => {
            let start = value_run_start(ops, i, form.operand_count())?;
            Some(Collapse {
                start,
                kind: OpKind::LoadSlice,
                include_self: false,
            })
        }
        OpKind::BuildSlice => {
            let start = value_run_start(ops, i, op.operand.as_count()?)?;
            Some(Collapse {
                start,
                kind: OpKind::LoadSlice,
                include_self: false,
            })
        }
        OpKind::Binary(bin) => {
            let start = value_run_start(ops, i, 2)?;
            Some(Collapse {
                start,
                kind: OpKind::LoadBinary(bin),
                include_self: false,
            })
        }
        _ => None,
    }
}

/// Start of the `count` operations preceding `i`, provided all of them
/// produce a value.
fn value_run_start(ops: &[Operation], i: usize, count: usize) -> Option<usize> {
    let start = i.checked_sub(count)?;
    ops[start..i]
        .iter()
        .all(|op| op.kind.is_value())
        .then_some(start)
}
