//! Structural verifier
//!
//! Checks the invariants both sides rely on before an IR snapshot is
//! accepted:
//!
//! - every value used by an operation has exactly one definition in its
//!   function (a parameter or an op result);
//! - every direct call names a function present in the module;
//! - block ids are unique, each block ends in exactly one terminator, and
//!   every branch target, phi edge and recorded CFG edge names a block of
//!   the same function.

use log::trace;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use crate::{BlockId, DialectModule, FuncOp, ValueId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("function @{0} is defined more than once")]
    DuplicateFunction(String),

    #[error("declaration @{0} has a body")]
    DeclarationWithBody(String),

    #[error("function @{0} has no blocks")]
    MissingBody(String),

    #[error("@{function}: block {block} is defined more than once")]
    DuplicateBlock { function: String, block: BlockId },

    #[error("@{function}: block {block} does not end in a terminator")]
    MissingTerminator { function: String, block: BlockId },

    #[error("@{function}: block {block} has a terminator at position {index} before its end")]
    MisplacedTerminator { function: String, block: BlockId, index: usize },

    #[error("@{function}: block {block} references unknown block {target}")]
    UnknownBlock { function: String, block: BlockId, target: BlockId },

    #[error("@{function}: value {value} is defined more than once")]
    DuplicateDefinition { function: String, value: ValueId },

    #[error("@{function}: block {block} uses undefined value {value}")]
    UndefinedValue { function: String, block: BlockId, value: ValueId },

    #[error("@{function}: call to unknown function @{callee}")]
    DanglingCall { function: String, callee: String },
}

/// Verify a whole module, reporting the first violation found
pub fn verify(module: &DialectModule) -> Result<(), VerifyError> {
    let mut symbols = HashSet::new();
    for function in &module.functions {
        if !symbols.insert(function.symbol.as_str()) {
            return Err(VerifyError::DuplicateFunction(function.symbol.clone()));
        }
    }

    for function in &module.functions {
        verify_function(function, &symbols)?;
    }
    trace!("verified module @{} ({} functions)", module.name, module.functions.len());
    Ok(())
}

fn verify_function(function: &FuncOp, symbols: &HashSet<&str>) -> Result<(), VerifyError> {
    let name = || function.symbol.clone();

    if function.is_declaration() {
        if !function.blocks.is_empty() {
            return Err(VerifyError::DeclarationWithBody(name()));
        }
        return Ok(());
    }
    if function.blocks.is_empty() {
        return Err(VerifyError::MissingBody(name()));
    }

    let mut block_ids = HashSet::new();
    for block in &function.blocks {
        if !block_ids.insert(block.id) {
            return Err(VerifyError::DuplicateBlock { function: name(), block: block.id });
        }
    }

    // Definition sites: parameters first, then op results in program order
    let mut defs: HashMap<ValueId, usize> = HashMap::new();
    for param in &function.params {
        *defs.entry(param.value).or_insert(0) += 1;
    }
    for op in function.blocks.iter().flat_map(|b| b.ops.iter()) {
        if let Some(result) = op.result {
            *defs.entry(result).or_insert(0) += 1;
        }
    }
    let duplicate = defs.iter().filter(|(_, count)| **count > 1).min_by_key(|(v, _)| **v);
    if let Some((value, _)) = duplicate {
        return Err(VerifyError::DuplicateDefinition { function: name(), value: *value });
    }

    for block in &function.blocks {
        let last = block.ops.len().checked_sub(1);
        match block.ops.last() {
            Some(op) if op.is_terminator() => {}
            _ => return Err(VerifyError::MissingTerminator { function: name(), block: block.id }),
        }

        for (index, op) in block.ops.iter().enumerate() {
            if op.is_terminator() && Some(index) != last {
                return Err(VerifyError::MisplacedTerminator {
                    function: name(),
                    block: block.id,
                    index,
                });
            }
            for target in op.referenced_blocks() {
                if !block_ids.contains(&target) {
                    return Err(VerifyError::UnknownBlock {
                        function: name(),
                        block: block.id,
                        target,
                    });
                }
            }
            for value in op.used_values() {
                if !defs.contains_key(&value) {
                    return Err(VerifyError::UndefinedValue {
                        function: name(),
                        block: block.id,
                        value,
                    });
                }
            }
            if let Some(callee) = op.callee() {
                if !symbols.contains(callee) {
                    return Err(VerifyError::DanglingCall {
                        function: name(),
                        callee: callee.to_string(),
                    });
                }
            }
        }

        for target in block.preds.iter().chain(block.succs.iter()) {
            if !block_ids.contains(target) {
                return Err(VerifyError::UnknownBlock {
                    function: name(),
                    block: block.id,
                    target: *target,
                });
            }
        }
    }

    Ok(())
}
