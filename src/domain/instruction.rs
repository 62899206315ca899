// Instruction model for callorder.
// A stack-machine instruction stream reduced to the operation kinds the
// analysis interprets; everything else is carried as `OpKind::Other`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operand payload of an instruction.
///
/// Raw instructions carry scalars (names, constants, counts). Normalized
/// instructions carry a `Tuple` of the operands they were collapsed from,
/// in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    #[default]
    None,
    Int(i64),
    Float(f64),
    Text(String),
    Tuple(Vec<Operand>),
}

impl Operand {
    pub fn text(s: &str) -> Self {
        Operand::Text(s.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Operand::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the operand as a non-negative count (call arity, tuple length).
    pub fn as_count(&self) -> Option<usize> {
        match self {
            Operand::Int(n) => usize::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Int(n) => write!(f, "{}", n),
            Operand::Float(x) => write!(f, "{}", x),
            Operand::Text(s) => write!(f, "{}", s),
            Operand::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Slice shapes with a fixed operand count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceForm {
    /// `x[:]`
    Full,
    /// `x[a:]`
    Lower,
    /// `x[:b]`
    Upper,
    /// `x[a:b]`
    Both,
}

impl SliceForm {
    pub fn operand_count(self) -> usize {
        match self {
            SliceForm::Full => 1,
            SliceForm::Lower | SliceForm::Upper => 2,
            SliceForm::Both => 3,
        }
    }

    fn suffix(self) -> u8 {
        match self {
            SliceForm::Full => 0,
            SliceForm::Lower => 1,
            SliceForm::Upper => 2,
            SliceForm::Both => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    TrueDivide,
    Modulo,
    Power,
    LShift,
    RShift,
    And,
    Or,
    Xor,
    Subscr,
}

impl BinaryOp {
    const ALL: [BinaryOp; 14] = [
        BinaryOp::Add,
        BinaryOp::Subtract,
        BinaryOp::Multiply,
        BinaryOp::Divide,
        BinaryOp::FloorDivide,
        BinaryOp::TrueDivide,
        BinaryOp::Modulo,
        BinaryOp::Power,
        BinaryOp::LShift,
        BinaryOp::RShift,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Xor,
        BinaryOp::Subscr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "ADD",
            BinaryOp::Subtract => "SUBTRACT",
            BinaryOp::Multiply => "MULTIPLY",
            BinaryOp::Divide => "DIVIDE",
            BinaryOp::FloorDivide => "FLOOR_DIVIDE",
            BinaryOp::TrueDivide => "TRUE_DIVIDE",
            BinaryOp::Modulo => "MODULO",
            BinaryOp::Power => "POWER",
            BinaryOp::LShift => "LSHIFT",
            BinaryOp::RShift => "RSHIFT",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Xor => "XOR",
            BinaryOp::Subscr => "SUBSCR",
        }
    }

    fn from_name(s: &str) -> Option<BinaryOp> {
        Self::ALL.into_iter().find(|op| op.name() == s)
    }
}

/// Operation kinds understood by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    // Plain loads
    LoadConst,
    LoadName,
    LoadGlobal,
    LoadFast,
    LoadDeref,

    // Raw value construction
    LoadAttr,
    /// Operand: element count.
    BuildTuple,
    BuildMap,
    StoreMap,
    Slice(SliceForm),
    /// Operand: element count.
    BuildSlice,
    Binary(BinaryOp),

    /// Operand: positional argument count.
    Call,
    /// Line-number pseudo instruction, dropped before reconstruction.
    SetLineno,
    /// Anything the analysis does not interpret (stores, jumps, returns ...).
    Other,

    // Produced by the normalizer
    LoadObjAttr,
    LoadTuple,
    LoadSlice,
    LoadBinary(BinaryOp),
}

impl OpKind {
    /// Parse a conventional mnemonic (`LOAD_FAST`, `CALL_FUNCTION`, `SLICE+3`).
    /// Unknown mnemonics map to `OpKind::Other`.
    pub fn from_mnemonic(s: &str) -> OpKind {
        match s.to_uppercase().as_str() {
            "LOAD_CONST" => OpKind::LoadConst,
            "LOAD_NAME" => OpKind::LoadName,
            "LOAD_GLOBAL" => OpKind::LoadGlobal,
            "LOAD_FAST" => OpKind::LoadFast,
            "LOAD_DEREF" => OpKind::LoadDeref,
            "LOAD_ATTR" => OpKind::LoadAttr,
            "BUILD_TUPLE" => OpKind::BuildTuple,
            "BUILD_MAP" => OpKind::BuildMap,
            "STORE_MAP" => OpKind::StoreMap,
            "SLICE+0" => OpKind::Slice(SliceForm::Full),
            "SLICE+1" => OpKind::Slice(SliceForm::Lower),
            "SLICE+2" => OpKind::Slice(SliceForm::Upper),
            "SLICE+3" => OpKind::Slice(SliceForm::Both),
            "BUILD_SLICE" => OpKind::BuildSlice,
            "CALL_FUNCTION" | "CALL" => OpKind::Call,
            "SETLINENO" | "SET_LINENO" => OpKind::SetLineno,
            other => other
                .strip_prefix("BINARY_")
                .and_then(BinaryOp::from_name)
                .map(OpKind::Binary)
                .unwrap_or(OpKind::Other),
        }
    }

    pub fn mnemonic(&self) -> String {
        match self {
            OpKind::LoadConst => "LOAD_CONST".to_string(),
            OpKind::LoadName => "LOAD_NAME".to_string(),
            OpKind::LoadGlobal => "LOAD_GLOBAL".to_string(),
            OpKind::LoadFast => "LOAD_FAST".to_string(),
            OpKind::LoadDeref => "LOAD_DEREF".to_string(),
            OpKind::LoadAttr => "LOAD_ATTR".to_string(),
            OpKind::BuildTuple => "BUILD_TUPLE".to_string(),
            OpKind::BuildMap => "BUILD_MAP".to_string(),
            OpKind::StoreMap => "STORE_MAP".to_string(),
            OpKind::Slice(form) => format!("SLICE+{}", form.suffix()),
            OpKind::BuildSlice => "BUILD_SLICE".to_string(),
            OpKind::Binary(op) => format!("BINARY_{}", op.name()),
            OpKind::Call => "CALL_FUNCTION".to_string(),
            OpKind::SetLineno => "SetLineno".to_string(),
            OpKind::Other => "OTHER".to_string(),
            OpKind::LoadObjAttr => "LOAD_OBJ_ATTR".to_string(),
            OpKind::LoadTuple => "LOAD_TUPLE".to_string(),
            OpKind::LoadSlice => "LOAD_SLICE".to_string(),
            OpKind::LoadBinary(op) => format!("LOAD_BINARY_{}", op.name()),
        }
    }

    pub fn is_plain_load(&self) -> bool {
        matches!(
            self,
            OpKind::LoadConst
                | OpKind::LoadName
                | OpKind::LoadGlobal
                | OpKind::LoadFast
                | OpKind::LoadDeref
        )
    }

    /// Loads whose operand is an identifier rather than a constant.
    pub fn is_name_load(&self) -> bool {
        self.is_plain_load() && *self != OpKind::LoadConst
    }

    /// Operations that leave exactly one value for a pending call to consume.
    pub fn is_value(&self) -> bool {
        self.is_plain_load()
            || matches!(
                self,
                OpKind::LoadObjAttr | OpKind::LoadTuple | OpKind::LoadSlice | OpKind::LoadBinary(_)
            )
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic())
    }
}

/// A single tagged instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OpKind,
    pub operand: Operand,
}

impl Operation {
    pub fn new(kind: OpKind, operand: Operand) -> Self {
        Self { kind, operand }
    }

    /// Load of a named value (`LOAD_NAME`, `LOAD_FAST`, ...).
    pub fn load(kind: OpKind, name: &str) -> Self {
        Self::new(kind, Operand::text(name))
    }

    pub fn call(arity: usize) -> Self {
        Self::new(OpKind::Call, Operand::Int(arity as i64))
    }

    pub fn bare(kind: OpKind) -> Self {
        Self::new(kind, Operand::None)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::None => write!(f, "{}", self.kind),
            ref operand => write!(f, "{} {}", self.kind, operand),
        }
    }
}
