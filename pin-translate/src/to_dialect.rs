//! Native IR to dialect

use log::{debug, trace};
use pin_dialect::{
    BinOp, Block, BlockId, CmpPred, ConvKind, DialectModule, FuncAttrs, FuncOp, GlobalInit,
    GlobalOp, OpKind, Operand, Operation, Param, UnOp, ValueId,
};
use pin_native::{Function, Instruction, IrBinaryOp, IrUnaryOp, Module, Value};
use crate::types::{hint_to_dialect, linkage_to_dialect, type_to_dialect};
use crate::TranslateError;

/// Translate a native module into its dialect form
pub fn to_dialect(module: &Module) -> Result<DialectModule, TranslateError> {
    let mut out = DialectModule::new(&module.name);

    for (name, ty) in &module.type_definitions {
        out.type_defs.insert(name.clone(), type_to_dialect(ty));
    }

    for global in &module.globals {
        let init = match &global.initializer {
            None => None,
            Some(value) => Some(global_init(&global.name, value)?),
        };
        out.globals.push(GlobalOp {
            symbol: global.name.clone(),
            ty: type_to_dialect(&global.var_type),
            constant: global.is_constant,
            init,
            linkage: linkage_to_dialect(global.linkage),
        });
    }

    for function in &module.functions {
        out.functions.push(FunctionTranslator::new(function).translate()?);
    }

    debug!(
        "translated module '{}' to dialect: {} functions, {} globals",
        module.name,
        out.functions.len(),
        out.globals.len()
    );
    Ok(out)
}

fn global_init(global: &str, value: &Value) -> Result<GlobalInit, TranslateError> {
    Ok(match value {
        Value::Constant(c) => GlobalInit::Int(*c),
        Value::ConstantArray(values) => GlobalInit::Array(values.clone()),
        Value::Global(name) => GlobalInit::Global(name.clone()),
        Value::Function(name) => GlobalInit::Func(name.clone()),
        Value::Undef => GlobalInit::Undef,
        Value::Temp(_) => {
            return Err(TranslateError::unsupported(global, "temporary used as global initializer"))
        }
    })
}

fn bin_op(op: IrBinaryOp) -> Result<BinOp, CmpPred> {
    Ok(match op {
        IrBinaryOp::Add => BinOp::Add,
        IrBinaryOp::Sub => BinOp::Sub,
        IrBinaryOp::Mul => BinOp::Mul,
        IrBinaryOp::SDiv => BinOp::DivS,
        IrBinaryOp::UDiv => BinOp::DivU,
        IrBinaryOp::SRem => BinOp::RemS,
        IrBinaryOp::URem => BinOp::RemU,
        IrBinaryOp::And => BinOp::And,
        IrBinaryOp::Or => BinOp::Or,
        IrBinaryOp::Xor => BinOp::Xor,
        IrBinaryOp::Shl => BinOp::Shl,
        IrBinaryOp::LShr => BinOp::ShrL,
        IrBinaryOp::AShr => BinOp::ShrA,
        IrBinaryOp::Eq => return Err(CmpPred::Eq),
        IrBinaryOp::Ne => return Err(CmpPred::Ne),
        IrBinaryOp::Slt => return Err(CmpPred::Slt),
        IrBinaryOp::Sle => return Err(CmpPred::Sle),
        IrBinaryOp::Sgt => return Err(CmpPred::Sgt),
        IrBinaryOp::Sge => return Err(CmpPred::Sge),
        IrBinaryOp::Ult => return Err(CmpPred::Ult),
        IrBinaryOp::Ule => return Err(CmpPred::Ule),
        IrBinaryOp::Ugt => return Err(CmpPred::Ugt),
        IrBinaryOp::Uge => return Err(CmpPred::Uge),
    })
}

fn un_op(op: IrUnaryOp) -> Result<UnOp, ConvKind> {
    Ok(match op {
        IrUnaryOp::Not => UnOp::Not,
        IrUnaryOp::Neg => UnOp::Neg,
        IrUnaryOp::ZExt => return Err(ConvKind::ZeroExtend),
        IrUnaryOp::SExt => return Err(ConvKind::SignExtend),
        IrUnaryOp::Trunc => return Err(ConvKind::Truncate),
        IrUnaryOp::PtrToInt => return Err(ConvKind::PtrToInt),
        IrUnaryOp::IntToPtr => return Err(ConvKind::IntToPtr),
    })
}

struct FunctionTranslator<'a> {
    function: &'a Function,
}

impl<'a> FunctionTranslator<'a> {
    fn new(function: &'a Function) -> Self {
        Self { function }
    }

    fn unsupported(&self, construct: &str) -> TranslateError {
        TranslateError::unsupported(&self.function.name, construct)
    }

    fn translate(&self) -> Result<FuncOp, TranslateError> {
        let function = self.function;
        if function.is_external && !function.blocks.is_empty() {
            return Err(self.unsupported("external function with a body"));
        }

        let mut out = FuncOp::new(&function.name, type_to_dialect(&function.return_type));
        out.vararg = function.is_vararg;
        out.attrs = FuncAttrs {
            inline: hint_to_dialect(function.inline_hint),
            external: function.is_external,
            loc: function.source_location.clone(),
        };
        out.params = function
            .parameters
            .iter()
            .map(|(id, ty)| Param { value: ValueId(*id), ty: type_to_dialect(ty) })
            .collect();

        for block in &function.blocks {
            let mut b = Block::new(BlockId(block.id));
            b.preds = block.predecessors.iter().map(|l| BlockId(*l)).collect();
            b.succs = block.successors.iter().map(|l| BlockId(*l)).collect();
            for instr in &block.instructions {
                b.push(self.instruction(instr)?);
            }
            out.blocks.push(b);
        }

        trace!("translated function '{}' ({} blocks)", function.name, out.blocks.len());
        Ok(out)
    }

    fn operand(&self, value: &Value) -> Result<Operand, TranslateError> {
        Ok(match value {
            Value::Temp(id) => Operand::Value(ValueId(*id)),
            Value::Constant(c) => Operand::Const(*c),
            Value::Global(name) => Operand::Global(name.clone()),
            Value::Function(name) => Operand::Func(name.clone()),
            Value::Undef => Operand::Undef,
            Value::ConstantArray(_) => {
                return Err(self.unsupported("constant array used as operand"));
            }
        })
    }

    fn operands(&self, values: &[Value]) -> Result<Vec<Operand>, TranslateError> {
        values.iter().map(|v| self.operand(v)).collect()
    }

    fn instruction(&self, instr: &Instruction) -> Result<Operation, TranslateError> {
        let op = match instr {
            Instruction::Binary { result, op, lhs, rhs, result_type } => {
                let lhs = self.operand(lhs)?;
                let rhs = self.operand(rhs)?;
                let kind = match bin_op(*op) {
                    Ok(op) => OpKind::Binary { op, lhs, rhs },
                    Err(pred) => OpKind::Cmp { pred, lhs, rhs },
                };
                Operation::new(Some(ValueId(*result)), type_to_dialect(result_type), kind)
            }
            Instruction::Unary { result, op, operand, result_type } => {
                let operand = self.operand(operand)?;
                let kind = match un_op(*op) {
                    Ok(op) => OpKind::Unary { op, operand },
                    Err(kind) => OpKind::Convert { kind, operand },
                };
                Operation::new(Some(ValueId(*result)), type_to_dialect(result_type), kind)
            }
            Instruction::Load { result, ptr, result_type } => Operation::new(
                Some(ValueId(*result)),
                type_to_dialect(result_type),
                OpKind::Load { ptr: self.operand(ptr)? },
            ),
            Instruction::Store { value, ptr } => Operation::void(OpKind::Store {
                value: self.operand(value)?,
                ptr: self.operand(ptr)?,
            }),
            Instruction::GetElementPtr { result, ptr, indices, result_type } => Operation::new(
                Some(ValueId(*result)),
                type_to_dialect(result_type),
                OpKind::ElementPtr {
                    base: self.operand(ptr)?,
                    indices: self.operands(indices)?,
                },
            ),
            Instruction::Alloca { result, alloc_type, count, result_type } => Operation::new(
                Some(ValueId(*result)),
                type_to_dialect(result_type),
                OpKind::Alloca {
                    alloc_ty: type_to_dialect(alloc_type),
                    count: count.as_ref().map(|c| self.operand(c)).transpose()?,
                },
            ),
            Instruction::Call { result, function, args, result_type, known_inlined } => {
                let args = self.operands(args)?;
                let kind = match function {
                    Value::Function(callee) => OpKind::Call {
                        callee: callee.clone(),
                        args,
                        known_inlined: *known_inlined,
                    },
                    _ if *known_inlined => {
                        return Err(self.unsupported("indirect call marked as inlined"))
                    }
                    target => OpKind::CallIndirect { target: self.operand(target)?, args },
                };
                Operation::new(result.map(ValueId), type_to_dialect(result_type), kind)
            }
            Instruction::Return(value) => Operation::void(OpKind::Ret {
                value: value.as_ref().map(|v| self.operand(v)).transpose()?,
            }),
            Instruction::Branch(label) => Operation::void(OpKind::Br { dest: BlockId(*label) }),
            Instruction::BranchCond { condition, true_label, false_label } => {
                Operation::void(OpKind::CondBr {
                    cond: self.operand(condition)?,
                    on_true: BlockId(*true_label),
                    on_false: BlockId(*false_label),
                })
            }
            Instruction::Phi { result, incoming, result_type } => {
                let incoming = incoming
                    .iter()
                    .map(|(v, l)| Ok((self.operand(v)?, BlockId(*l))))
                    .collect::<Result<Vec<_>, TranslateError>>()?;
                Operation::new(
                    Some(ValueId(*result)),
                    type_to_dialect(result_type),
                    OpKind::Phi { incoming },
                )
            }
            Instruction::Cast { result, value, target_type } => Operation::new(
                Some(ValueId(*result)),
                type_to_dialect(target_type),
                OpKind::Cast { operand: self.operand(value)? },
            ),
            Instruction::Select { result, condition, true_value, false_value, result_type } => {
                Operation::new(
                    Some(ValueId(*result)),
                    type_to_dialect(result_type),
                    OpKind::Select {
                        cond: self.operand(condition)?,
                        on_true: self.operand(true_value)?,
                        on_false: self.operand(false_value)?,
                    },
                )
            }
            Instruction::Intrinsic { result, intrinsic, args, result_type } => Operation::new(
                result.map(ValueId),
                type_to_dialect(result_type),
                OpKind::Intrinsic { name: intrinsic.clone(), args: self.operands(args)? },
            ),
            Instruction::DebugLoc { location } => {
                Operation::void(OpKind::DebugLoc { loc: location.clone() })
            }
            Instruction::Comment(text) => Operation::void(OpKind::Comment { text: text.clone() }),
            Instruction::InlineAsm { .. } => return Err(self.unsupported("inline assembly")),
        };
        Ok(op)
    }
}
