//! Dialect operations
//!
//! One [`OpKind`] per host construct that passes may observe or rewrite.
//! Every operation carries its result type, even when the result value is
//! discarded, so the host can rebuild the exact native instruction.

use pin_common::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::{BlockId, Operand, Type, ValueId};

/// Integer arithmetic and bitwise operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add, Sub, Mul,
    DivS, DivU, RemS, RemU,
    And, Or, Xor,
    Shl, ShrL, ShrA,
}

impl BinOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::DivS => "divs",
            BinOp::DivU => "divu",
            BinOp::RemS => "rems",
            BinOp::RemU => "remu",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::ShrL => "shrl",
            BinOp::ShrA => "shra",
        }
    }
}

/// Integer comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpPred {
    Eq, Ne,
    Slt, Sle, Sgt, Sge,
    Ult, Ule, Ugt, Uge,
}

impl CmpPred {
    pub fn mnemonic(self) -> &'static str {
        match self {
            CmpPred::Eq => "eq",
            CmpPred::Ne => "ne",
            CmpPred::Slt => "slt",
            CmpPred::Sle => "sle",
            CmpPred::Sgt => "sgt",
            CmpPred::Sge => "sge",
            CmpPred::Ult => "ult",
            CmpPred::Ule => "ule",
            CmpPred::Ugt => "ugt",
            CmpPred::Uge => "uge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    Not,
    Neg,
}

/// Width and representation changing conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvKind {
    ZeroExtend,
    SignExtend,
    Truncate,
    PtrToInt,
    IntToPtr,
}

impl ConvKind {
    pub fn mnemonic(self) -> &'static str {
        match self {
            ConvKind::ZeroExtend => "zext",
            ConvKind::SignExtend => "sext",
            ConvKind::Truncate => "trunc",
            ConvKind::PtrToInt => "ptrtoint",
            ConvKind::IntToPtr => "inttoptr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpKind {
    Binary { op: BinOp, lhs: Operand, rhs: Operand },
    Cmp { pred: CmpPred, lhs: Operand, rhs: Operand },
    Unary { op: UnOp, operand: Operand },
    Convert { kind: ConvKind, operand: Operand },
    Load { ptr: Operand },
    Store { value: Operand, ptr: Operand },
    ElementPtr { base: Operand, indices: Vec<Operand> },
    Alloca { alloc_ty: Type, count: Option<Operand> },
    /// Direct call. `known_inlined` marks call sites the host inliner already handled.
    Call { callee: String, args: Vec<Operand>, known_inlined: bool },
    CallIndirect { target: Operand, args: Vec<Operand> },
    Intrinsic { name: String, args: Vec<Operand> },
    Cast { operand: Operand },
    Select { cond: Operand, on_true: Operand, on_false: Operand },
    Phi { incoming: Vec<(Operand, BlockId)> },
    Ret { value: Option<Operand> },
    Br { dest: BlockId },
    CondBr { cond: Operand, on_true: BlockId, on_false: BlockId },
    DebugLoc { loc: SourceLocation },
    Comment { text: String },
}

/// A single dialect operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub result: Option<ValueId>,
    /// Result type; `Void` for operations producing nothing
    pub ty: Type,
    pub kind: OpKind,
}

impl Operation {
    pub fn new(result: Option<ValueId>, ty: Type, kind: OpKind) -> Self {
        Self { result, ty, kind }
    }

    /// Operation without a result
    pub fn void(kind: OpKind) -> Self {
        Self { result: None, ty: Type::Void, kind }
    }

    pub fn name(&self) -> &'static str {
        match &self.kind {
            OpKind::Binary { .. } => "pin.binary",
            OpKind::Cmp { .. } => "pin.cmp",
            OpKind::Unary { .. } => "pin.unary",
            OpKind::Convert { .. } => "pin.convert",
            OpKind::Load { .. } => "pin.load",
            OpKind::Store { .. } => "pin.store",
            OpKind::ElementPtr { .. } => "pin.element_ptr",
            OpKind::Alloca { .. } => "pin.alloca",
            OpKind::Call { .. } => "pin.call",
            OpKind::CallIndirect { .. } => "pin.call_indirect",
            OpKind::Intrinsic { .. } => "pin.intrinsic",
            OpKind::Cast { .. } => "pin.cast",
            OpKind::Select { .. } => "pin.select",
            OpKind::Phi { .. } => "pin.phi",
            OpKind::Ret { .. } => "pin.ret",
            OpKind::Br { .. } => "pin.br",
            OpKind::CondBr { .. } => "pin.cond_br",
            OpKind::DebugLoc { .. } => "pin.debug_loc",
            OpKind::Comment { .. } => "pin.comment",
        }
    }

    pub fn operands(&self) -> Vec<&Operand> {
        match &self.kind {
            OpKind::Binary { lhs, rhs, .. } | OpKind::Cmp { lhs, rhs, .. } => vec![lhs, rhs],
            OpKind::Unary { operand, .. }
            | OpKind::Convert { operand, .. }
            | OpKind::Cast { operand } => vec![operand],
            OpKind::Load { ptr } => vec![ptr],
            OpKind::Store { value, ptr } => vec![value, ptr],
            OpKind::ElementPtr { base, indices } => {
                std::iter::once(base).chain(indices.iter()).collect()
            }
            OpKind::Alloca { count, .. } => count.iter().collect(),
            OpKind::Call { args, .. } | OpKind::Intrinsic { args, .. } => args.iter().collect(),
            OpKind::CallIndirect { target, args } => {
                std::iter::once(target).chain(args.iter()).collect()
            }
            OpKind::Select { cond, on_true, on_false } => vec![cond, on_true, on_false],
            OpKind::Phi { incoming } => incoming.iter().map(|(v, _)| v).collect(),
            OpKind::Ret { value } => value.iter().collect(),
            OpKind::CondBr { cond, .. } => vec![cond],
            OpKind::Br { .. } | OpKind::DebugLoc { .. } | OpKind::Comment { .. } => Vec::new(),
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Operand> {
        match &mut self.kind {
            OpKind::Binary { lhs, rhs, .. } | OpKind::Cmp { lhs, rhs, .. } => vec![lhs, rhs],
            OpKind::Unary { operand, .. }
            | OpKind::Convert { operand, .. }
            | OpKind::Cast { operand } => vec![operand],
            OpKind::Load { ptr } => vec![ptr],
            OpKind::Store { value, ptr } => vec![value, ptr],
            OpKind::ElementPtr { base, indices } => {
                std::iter::once(base).chain(indices.iter_mut()).collect()
            }
            OpKind::Alloca { count, .. } => count.iter_mut().collect(),
            OpKind::Call { args, .. } | OpKind::Intrinsic { args, .. } => args.iter_mut().collect(),
            OpKind::CallIndirect { target, args } => {
                std::iter::once(target).chain(args.iter_mut()).collect()
            }
            OpKind::Select { cond, on_true, on_false } => vec![cond, on_true, on_false],
            OpKind::Phi { incoming } => incoming.iter_mut().map(|(v, _)| v).collect(),
            OpKind::Ret { value } => value.iter_mut().collect(),
            OpKind::CondBr { cond, .. } => vec![cond],
            OpKind::Br { .. } | OpKind::DebugLoc { .. } | OpKind::Comment { .. } => Vec::new(),
        }
    }

    /// Values read by this operation
    pub fn used_values(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.operands().into_iter().filter_map(Operand::as_value)
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self.kind, OpKind::Ret { .. } | OpKind::Br { .. } | OpKind::CondBr { .. })
    }

    /// Debug locations and comments carry no semantics
    pub fn is_annotation(&self) -> bool {
        matches!(self.kind, OpKind::DebugLoc { .. } | OpKind::Comment { .. })
    }

    /// Branch targets in operand order
    pub fn successors(&self) -> Vec<BlockId> {
        match &self.kind {
            OpKind::Br { dest } => vec![*dest],
            OpKind::CondBr { on_true, on_false, .. } => vec![*on_true, *on_false],
            _ => Vec::new(),
        }
    }

    /// Every block referenced by the operation: branch targets and phi edges
    pub fn referenced_blocks(&self) -> Vec<BlockId> {
        match &self.kind {
            OpKind::Phi { incoming } => incoming.iter().map(|(_, b)| *b).collect(),
            _ => self.successors(),
        }
    }

    /// Rewrite every block reference through `f`
    pub fn remap_blocks(&mut self, mut f: impl FnMut(BlockId) -> BlockId) {
        match &mut self.kind {
            OpKind::Br { dest } => *dest = f(*dest),
            OpKind::CondBr { on_true, on_false, .. } => {
                *on_true = f(*on_true);
                *on_false = f(*on_false);
            }
            OpKind::Phi { incoming } => {
                for (_, block) in incoming {
                    *block = f(*block);
                }
            }
            _ => {}
        }
    }

    /// Callee symbol of a direct call
    pub fn callee(&self) -> Option<&str> {
        match &self.kind {
            OpKind::Call { callee, .. } => Some(callee),
            _ => None,
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 { write!(f, ", ")?; }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = self.result {
            write!(f, "{result} = ")?;
        }
        write!(f, "{}", self.name())?;
        match &self.kind {
            OpKind::Binary { op, lhs, rhs } => write!(f, " {} {lhs}, {rhs}", op.mnemonic())?,
            OpKind::Cmp { pred, lhs, rhs } => write!(f, " {} {lhs}, {rhs}", pred.mnemonic())?,
            OpKind::Unary { op, operand } => write!(f, " {op:?} {operand}")?,
            OpKind::Convert { kind, operand } => write!(f, " {} {operand}", kind.mnemonic())?,
            OpKind::Load { ptr } => write!(f, " {ptr}")?,
            OpKind::Store { value, ptr } => write!(f, " {value}, {ptr}")?,
            OpKind::ElementPtr { base, indices } => {
                write!(f, " {base}[")?;
                write_list(f, indices)?;
                write!(f, "]")?;
            }
            OpKind::Alloca { alloc_ty, count } => {
                write!(f, " {alloc_ty}")?;
                if let Some(count) = count {
                    write!(f, " x {count}")?;
                }
            }
            OpKind::Call { callee, args, known_inlined } => {
                write!(f, " @{callee}(")?;
                write_list(f, args)?;
                write!(f, ")")?;
                if *known_inlined {
                    write!(f, " {{known_inlined}}")?;
                }
            }
            OpKind::CallIndirect { target, args } => {
                write!(f, " {target}(")?;
                write_list(f, args)?;
                write!(f, ")")?;
            }
            OpKind::Intrinsic { name, args } => {
                write!(f, " \"{name}\"(")?;
                write_list(f, args)?;
                write!(f, ")")?;
            }
            OpKind::Cast { operand } => write!(f, " {operand}")?,
            OpKind::Select { cond, on_true, on_false } => {
                write!(f, " {cond}, {on_true}, {on_false}")?
            }
            OpKind::Phi { incoming } => {
                for (i, (value, block)) in incoming.iter().enumerate() {
                    write!(f, "{} [{value}, {block}]", if i > 0 { "," } else { "" })?;
                }
            }
            OpKind::Ret { value: Some(value) } => write!(f, " {value}")?,
            OpKind::Ret { value: None } => {}
            OpKind::Br { dest } => write!(f, " {dest}")?,
            OpKind::CondBr { cond, on_true, on_false } => {
                write!(f, " {cond}, {on_true}, {on_false}")?
            }
            OpKind::DebugLoc { loc } => write!(f, " \"{loc}\"")?,
            OpKind::Comment { text } => write!(f, " \"{text}\"")?,
        }
        if !self.ty.is_void() {
            write!(f, " : {}", self.ty)?;
        }
        Ok(())
    }
}
