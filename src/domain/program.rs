// Target program as handed over by the acquisition layer.

use crate::domain::index::{ClassInfo, FunctionSignature};
use crate::domain::instruction::Operation;

/// One function: its signature and raw instruction stream.
#[derive(Debug, Clone)]
pub struct FunctionBody {
    pub signature: FunctionSignature,
    pub instructions: Vec<Operation>,
}

impl FunctionBody {
    pub fn new(signature: FunctionSignature, instructions: Vec<Operation>) -> Self {
        Self {
            signature,
            instructions,
        }
    }

    pub fn id(&self) -> String {
        self.signature.name.id()
    }
}

/// Every function and class the analysis should consider.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub functions: Vec<FunctionBody>,
    pub classes: Vec<ClassInfo>,
}
