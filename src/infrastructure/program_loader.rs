use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::index::{ClassInfo, FunctionName, FunctionSignature};
use crate::domain::instruction::{OpKind, Operand, Operation};
use crate::domain::program::{FunctionBody, Program};
use crate::ports::ProgramSource;

// On-disk program dump produced by the acquisition tooling.

#[derive(Debug, Deserialize)]
struct RawProgram {
    #[serde(default)]
    functions: Vec<RawFunction>,
    #[serde(default)]
    classes: Vec<RawClass>,
}

#[derive(Debug, Deserialize)]
struct RawFunction {
    name: String,
    /// Owning class for methods
    #[serde(default)]
    class: Option<String>,
    arity: usize,
    #[serde(default)]
    instructions: Vec<RawInstruction>,
}

#[derive(Debug, Deserialize)]
struct RawInstruction {
    op: String,
    #[serde(default)]
    arg: Operand,
}

#[derive(Debug, Deserialize)]
struct RawClass {
    name: String,
    #[serde(default)]
    qualname: Option<String>,
}

/// Loads a program dump from a JSON file.
pub struct JsonProgramSource {
    path: PathBuf,
}

impl JsonProgramSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse a program dump held in memory.
    pub fn parse_str(json: &str) -> Result<Program> {
        let raw: RawProgram = serde_json::from_str(json).context("Invalid program dump")?;

        let mut seen = HashSet::new();
        let mut functions = Vec::with_capacity(raw.functions.len());
        for f in raw.functions {
            let name = match f.class {
                Some(class) => FunctionName::Method {
                    class,
                    method: f.name,
                },
                None => FunctionName::Plain(f.name),
            };
            if !seen.insert(name.id()) {
                bail!("Duplicate function in program dump: {}", name);
            }
            let instructions = f
                .instructions
                .into_iter()
                .map(|ins| Operation::new(OpKind::from_mnemonic(&ins.op), ins.arg))
                .collect();
            functions.push(FunctionBody::new(
                FunctionSignature::new(name, f.arity),
                instructions,
            ));
        }

        let classes = raw
            .classes
            .into_iter()
            .map(|c| ClassInfo {
                qualname: c.qualname.unwrap_or_else(|| c.name.clone()),
                name: c.name,
            })
            .collect();

        Ok(Program { functions, classes })
    }
}

impl ProgramSource for JsonProgramSource {
    fn load(&self) -> Result<Program> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read program dump {}", self.path.display()))?;
        Self::parse_str(&content)
            .with_context(|| format!("Failed to load program from {}", self.path.display()))
    }
}
