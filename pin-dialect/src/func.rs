//! Function operations

use pin_common::SourceLocation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use crate::{Block, BlockId, Type, ValueId};

/// Inlining request carried from the host declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InlineHint {
    #[default]
    None,
    Inline,
    AlwaysInline,
    NoInline,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuncAttrs {
    pub inline: InlineHint,
    /// Declaration only: the body lives in another translation unit
    pub external: bool,
    pub loc: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub value: ValueId,
    pub ty: Type,
}

/// A function: signature, attributes and an ordered list of blocks.
/// The first block is the entry block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncOp {
    pub symbol: String,
    pub params: Vec<Param>,
    pub ret: Type,
    pub vararg: bool,
    pub attrs: FuncAttrs,
    pub blocks: Vec<Block>,
}

impl FuncOp {
    pub fn new(symbol: &str, ret: Type) -> Self {
        Self {
            symbol: symbol.to_string(),
            params: Vec::new(),
            ret,
            vararg: false,
            attrs: FuncAttrs::default(),
            blocks: Vec::new(),
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.attrs.external
    }

    /// Whether a body is available to clone from
    pub fn has_body(&self) -> bool {
        !self.attrs.external && !self.blocks.is_empty()
    }

    /// Number of operations that would be emitted, ignoring annotations
    pub fn size_estimate(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| b.ops.iter())
            .filter(|op| !op.is_annotation())
            .count()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn block_index(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    /// Smallest value id not defined anywhere in the function
    pub fn next_value_id(&self) -> ValueId {
        let params = self.params.iter().map(|p| p.value.0);
        let results = self
            .blocks
            .iter()
            .flat_map(|b| b.ops.iter())
            .filter_map(|op| op.result.map(|v| v.0));
        ValueId(params.chain(results).max().map_or(0, |m| m + 1))
    }

    /// Smallest block id above every block in the function
    pub fn next_block_id(&self) -> BlockId {
        BlockId(self.blocks.iter().map(|b| b.id.0).max().map_or(0, |m| m + 1))
    }

    /// Rebuild block edge lists from terminators.
    ///
    /// Successors follow terminator operand order and predecessors follow
    /// block order, duplicates collapsed.
    pub fn recompute_edges(&mut self) {
        let mut preds: HashMap<BlockId, Vec<BlockId>> =
            self.blocks.iter().map(|b| (b.id, Vec::new())).collect();

        for block in &mut self.blocks {
            let mut succs = Vec::new();
            if let Some(term) = block.terminator() {
                for target in term.successors() {
                    if !succs.contains(&target) {
                        succs.push(target);
                    }
                }
            }
            for target in &succs {
                if let Some(list) = preds.get_mut(target) {
                    if !list.contains(&block.id) {
                        list.push(block.id);
                    }
                }
            }
            block.succs = succs;
        }

        for block in &mut self.blocks {
            block.preds = preds.remove(&block.id).unwrap_or_default();
        }
    }
}

impl fmt::Display for FuncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  pin.func @{}(", self.symbol)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{}: {}", param.value, param.ty)?;
        }
        if self.vararg { write!(f, ", ...")?; }
        write!(f, ") -> {}", self.ret)?;
        write!(f, " attributes {{inline = {:?}", self.attrs.inline)?;
        if self.attrs.external {
            write!(f, ", external")?;
        }
        write!(f, "}}")?;
        if self.blocks.is_empty() {
            return writeln!(f);
        }
        writeln!(f, " {{")?;
        for block in &self.blocks {
            writeln!(f, "  {}:", block.id)?;
            for op in &block.ops {
                writeln!(f, "    {op}")?;
            }
        }
        writeln!(f, "  }}")
    }
}
