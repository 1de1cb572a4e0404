//! Dialect basic blocks

use serde::{Deserialize, Serialize};
use crate::{BlockId, Operation};

/// A basic block: straight-line ops ending in one terminator.
///
/// `preds`/`succs` are edge lists keyed by block id; they mirror the host's
/// recorded CFG and are rebuilt with [`crate::FuncOp::recompute_edges`]
/// after control flow changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub ops: Vec<Operation>,
    pub preds: Vec<BlockId>,
    pub succs: Vec<BlockId>,
}

impl Block {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            ops: Vec::new(),
            preds: Vec::new(),
            succs: Vec::new(),
        }
    }

    pub fn push(&mut self, op: Operation) {
        self.ops.push(op);
    }

    pub fn terminator(&self) -> Option<&Operation> {
        self.ops.last().filter(|op| op.is_terminator())
    }
}
