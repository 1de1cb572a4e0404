//! Native IR Instructions

use pin_common::{LabelId, SourceLocation, TempId};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::{IrBinaryOp, IrType, IrUnaryOp, Value};

/// Operand of an inline assembly statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsmOperand {
    pub constraint: String,
    pub value: Value,
    pub tied_to: Option<usize>,
}

/// Native IR Instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Binary operation: result = op lhs, rhs
    Binary {
        result: TempId,
        op: IrBinaryOp,
        lhs: Value,
        rhs: Value,
        result_type: IrType,
    },

    /// Unary operation: result = op operand
    Unary {
        result: TempId,
        op: IrUnaryOp,
        operand: Value,
        result_type: IrType,
    },

    /// Load from memory: result = load ptr
    Load {
        result: TempId,
        ptr: Value,
        result_type: IrType,
    },

    /// Store to memory: store value, ptr
    Store {
        value: Value,
        ptr: Value,
    },

    /// Get element pointer: result = getelementptr ptr, indices...
    GetElementPtr {
        result: TempId,
        ptr: Value,
        indices: Vec<Value>,
        result_type: IrType,
    },

    /// Allocate stack memory: result = alloca type, count
    Alloca {
        result: TempId,
        alloc_type: IrType,
        count: Option<Value>,
        result_type: IrType,
    },

    /// Function call: result = call func(args...)
    ///
    /// `known_inlined` is set by the host's own early inliner on call sites
    /// it has already expanded or rejected.
    Call {
        result: Option<TempId>,
        function: Value,
        args: Vec<Value>,
        result_type: IrType,
        #[serde(default)]
        known_inlined: bool,
    },

    /// Return: ret value or ret void
    Return(Option<Value>),

    /// Unconditional branch: br label
    Branch(LabelId),

    /// Conditional branch: br condition, true_label, false_label
    BranchCond {
        condition: Value,
        true_label: LabelId,
        false_label: LabelId,
    },

    /// Phi node: result = phi [val1, label1], [val2, label2], ...
    Phi {
        result: TempId,
        incoming: Vec<(Value, LabelId)>,
        result_type: IrType,
    },

    /// Type cast: result = cast value to target_type
    Cast {
        result: TempId,
        value: Value,
        target_type: IrType,
    },

    /// Select (ternary): result = select condition, true_value, false_value
    Select {
        result: TempId,
        condition: Value,
        true_value: Value,
        false_value: Value,
        result_type: IrType,
    },

    /// Intrinsic function call (for compiler builtins)
    Intrinsic {
        result: Option<TempId>,
        intrinsic: String,
        args: Vec<Value>,
        result_type: IrType,
    },

    /// Debug information
    DebugLoc {
        location: SourceLocation,
    },

    /// Inline assembly
    InlineAsm {
        assembly: String,
        outputs: Vec<AsmOperand>,
        inputs: Vec<AsmOperand>,
        clobbers: Vec<String>,
    },

    /// Comment (for debugging)
    Comment(String),
}

impl Instruction {
    /// The temporary defined by this instruction, if any
    pub fn result(&self) -> Option<TempId> {
        match self {
            Instruction::Binary { result, .. }
            | Instruction::Unary { result, .. }
            | Instruction::Load { result, .. }
            | Instruction::GetElementPtr { result, .. }
            | Instruction::Alloca { result, .. }
            | Instruction::Phi { result, .. }
            | Instruction::Cast { result, .. }
            | Instruction::Select { result, .. } => Some(*result),
            Instruction::Call { result, .. } | Instruction::Intrinsic { result, .. } => *result,
            _ => None,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Return(_) | Instruction::Branch(_) | Instruction::BranchCond { .. }
        )
    }

    /// Labels this instruction may transfer control to
    pub fn successors(&self) -> Vec<LabelId> {
        match self {
            Instruction::Branch(label) => vec![*label],
            Instruction::BranchCond { true_label, false_label, .. } => {
                vec![*true_label, *false_label]
            }
            _ => Vec::new(),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Value]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 { write!(f, ", ")?; }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary { result, op, lhs, rhs, result_type } => {
                write!(f, "%{result} = {op} {result_type} {lhs}, {rhs}")
            }
            Instruction::Unary { result, op, operand, result_type } => {
                write!(f, "%{result} = {op} {operand} to {result_type}")
            }
            Instruction::Load { result, ptr, result_type } => {
                write!(f, "%{result} = load {result_type}, {ptr}")
            }
            Instruction::Store { value, ptr } => write!(f, "store {value}, {ptr}"),
            Instruction::GetElementPtr { result, ptr, indices, .. } => {
                write!(f, "%{result} = getelementptr {ptr}")?;
                for index in indices {
                    write!(f, ", {index}")?;
                }
                Ok(())
            }
            Instruction::Alloca { result, alloc_type, count, .. } => {
                write!(f, "%{result} = alloca {alloc_type}")?;
                if let Some(count) = count {
                    write!(f, ", {count}")?;
                }
                Ok(())
            }
            Instruction::Call { result, function, args, known_inlined, .. } => {
                if let Some(result) = result {
                    write!(f, "%{result} = ")?;
                }
                write!(f, "call {function}(")?;
                write_args(f, args)?;
                write!(f, ")")?;
                if *known_inlined {
                    write!(f, " ; inlined")?;
                }
                Ok(())
            }
            Instruction::Return(Some(value)) => write!(f, "ret {value}"),
            Instruction::Return(None) => write!(f, "ret void"),
            Instruction::Branch(label) => write!(f, "br label %L{label}"),
            Instruction::BranchCond { condition, true_label, false_label } => {
                write!(f, "br {condition}, label %L{true_label}, label %L{false_label}")
            }
            Instruction::Phi { result, incoming, result_type } => {
                write!(f, "%{result} = phi {result_type} ")?;
                for (i, (value, label)) in incoming.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "[{value}, %L{label}]")?;
                }
                Ok(())
            }
            Instruction::Cast { result, value, target_type } => {
                write!(f, "%{result} = cast {value} to {target_type}")
            }
            Instruction::Select { result, condition, true_value, false_value, result_type } => {
                write!(
                    f,
                    "%{result} = select {condition}, {result_type} {true_value}, {result_type} {false_value}",
                )
            }
            Instruction::Intrinsic { result, intrinsic, args, .. } => {
                if let Some(result) = result {
                    write!(f, "%{result} = ")?;
                }
                write!(f, "call @{intrinsic}(")?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Instruction::DebugLoc { location } => write!(f, "!dbg {location}"),
            Instruction::InlineAsm { assembly, .. } => write!(f, "asm \"{assembly}\""),
            Instruction::Comment(text) => write!(f, "; {text}"),
        }
    }
}
