//! Function Definitions
//!
//! Defines native functions with their parameters, blocks, and the
//! attributes the host exposes to optimization passes.

use pin_common::{LabelId, SourceLocation, TempId};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::{BasicBlock, IrType};

/// Inlining request attached to a function declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InlineHint {
    #[default]
    None,
    /// `inline` keyword: a hint only
    Inline,
    /// `always_inline` attribute
    AlwaysInline,
    /// `noinline` attribute
    NoInline,
}

/// Function in native IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: IrType,
    pub parameters: Vec<(TempId, IrType)>,
    pub blocks: Vec<BasicBlock>,
    pub is_external: bool,
    pub is_vararg: bool,
    #[serde(default)]
    pub inline_hint: InlineHint,
    pub source_location: Option<SourceLocation>,
}

impl Function {
    pub fn new(name: String, return_type: IrType) -> Self {
        Self {
            name,
            return_type,
            parameters: Vec::new(),
            blocks: Vec::new(),
            is_external: false,
            is_vararg: false,
            inline_hint: InlineHint::None,
            source_location: None,
        }
    }

    pub fn add_parameter(&mut self, param_id: TempId, param_type: IrType) {
        self.parameters.push((param_id, param_type));
    }

    pub fn add_block(&mut self, block: BasicBlock) {
        self.blocks.push(block);
    }

    pub fn get_block(&self, id: LabelId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn get_block_mut(&mut self, id: LabelId) -> Option<&mut BasicBlock> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Rebuild predecessor/successor lists from block terminators.
    ///
    /// Successors follow terminator operand order, predecessors follow block
    /// order; duplicates are collapsed.
    pub fn recompute_cfg(&mut self) {
        let mut preds: Vec<(LabelId, Vec<LabelId>)> =
            self.blocks.iter().map(|b| (b.id, Vec::new())).collect();

        for block in &mut self.blocks {
            let mut succs = Vec::new();
            if let Some(term) = block.instructions.last() {
                for target in term.successors() {
                    if !succs.contains(&target) {
                        succs.push(target);
                    }
                }
            }
            for target in &succs {
                if let Some((_, list)) = preds.iter_mut().find(|(id, _)| id == target) {
                    if !list.contains(&block.id) {
                        list.push(block.id);
                    }
                }
            }
            block.successors = succs;
        }

        for (block, (_, list)) in self.blocks.iter_mut().zip(preds) {
            block.predecessors = list;
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.is_external { "declare" } else { "define" };
        write!(f, "{keyword} {} @{}(", self.return_type, self.name)?;
        for (i, (id, ty)) in self.parameters.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{ty} %{id}")?;
        }
        if self.is_vararg { write!(f, ", ...")?; }
        write!(f, ")")?;
        if self.inline_hint != InlineHint::None {
            write!(f, " #{:?}", self.inline_hint)?;
        }
        if self.is_external {
            return writeln!(f);
        }
        writeln!(f, " {{")?;
        for block in &self.blocks {
            writeln!(f, "L{}:", block.id)?;
            for inst in &block.instructions {
                writeln!(f, "  {inst}")?;
            }
        }
        writeln!(f, "}}")
    }
}
