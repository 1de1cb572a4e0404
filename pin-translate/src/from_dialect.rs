//! Dialect to native IR

use log::{debug, trace};
use pin_common::TempId;
use pin_dialect::{
    verify, BinOp, CmpPred, ConvKind, DialectModule, FuncOp, GlobalInit, OpKind, Operand,
    Operation, UnOp,
};
use pin_native::{
    BasicBlock, Function, GlobalVariable, Instruction, IrBinaryOp, IrUnaryOp, Module, Value,
};
use crate::types::{hint_from_dialect, linkage_from_dialect, type_from_dialect};
use crate::TranslateError;

/// Translate a dialect module back into native IR.
///
/// The module is verified first; a module that fails verification is
/// rejected as a whole and nothing is rebuilt.
pub fn from_dialect(module: &DialectModule) -> Result<Module, TranslateError> {
    verify(module)?;

    let mut out = Module::new(module.name.clone());

    for (name, ty) in &module.type_defs {
        out.type_definitions.insert(name.clone(), type_from_dialect(ty)?);
    }

    for global in &module.globals {
        out.add_global(GlobalVariable {
            name: global.symbol.clone(),
            var_type: type_from_dialect(&global.ty)?,
            is_constant: global.constant,
            initializer: global.init.as_ref().map(global_init),
            linkage: linkage_from_dialect(global.linkage),
        });
    }

    for function in &module.functions {
        out.add_function(FunctionRebuilder { function }.rebuild()?);
    }

    debug!(
        "rebuilt native module '{}': {} functions, {} globals",
        module.name,
        out.functions.len(),
        out.globals.len()
    );
    Ok(out)
}

fn global_init(init: &GlobalInit) -> Value {
    match init {
        GlobalInit::Int(c) => Value::Constant(*c),
        GlobalInit::Array(values) => Value::ConstantArray(values.clone()),
        GlobalInit::Global(name) => Value::Global(name.clone()),
        GlobalInit::Func(name) => Value::Function(name.clone()),
        GlobalInit::Undef => Value::Undef,
    }
}

fn value(operand: &Operand) -> Value {
    match operand {
        Operand::Value(id) => Value::Temp(id.0),
        Operand::Const(c) => Value::Constant(*c),
        Operand::Global(name) => Value::Global(name.clone()),
        Operand::Func(name) => Value::Function(name.clone()),
        Operand::Undef => Value::Undef,
    }
}

fn values(operands: &[Operand]) -> Vec<Value> {
    operands.iter().map(value).collect()
}

fn binary_op(op: BinOp) -> IrBinaryOp {
    match op {
        BinOp::Add => IrBinaryOp::Add,
        BinOp::Sub => IrBinaryOp::Sub,
        BinOp::Mul => IrBinaryOp::Mul,
        BinOp::DivS => IrBinaryOp::SDiv,
        BinOp::DivU => IrBinaryOp::UDiv,
        BinOp::RemS => IrBinaryOp::SRem,
        BinOp::RemU => IrBinaryOp::URem,
        BinOp::And => IrBinaryOp::And,
        BinOp::Or => IrBinaryOp::Or,
        BinOp::Xor => IrBinaryOp::Xor,
        BinOp::Shl => IrBinaryOp::Shl,
        BinOp::ShrL => IrBinaryOp::LShr,
        BinOp::ShrA => IrBinaryOp::AShr,
    }
}

fn compare_op(pred: CmpPred) -> IrBinaryOp {
    match pred {
        CmpPred::Eq => IrBinaryOp::Eq,
        CmpPred::Ne => IrBinaryOp::Ne,
        CmpPred::Slt => IrBinaryOp::Slt,
        CmpPred::Sle => IrBinaryOp::Sle,
        CmpPred::Sgt => IrBinaryOp::Sgt,
        CmpPred::Sge => IrBinaryOp::Sge,
        CmpPred::Ult => IrBinaryOp::Ult,
        CmpPred::Ule => IrBinaryOp::Ule,
        CmpPred::Ugt => IrBinaryOp::Ugt,
        CmpPred::Uge => IrBinaryOp::Uge,
    }
}

fn unary_op(op: UnOp) -> IrUnaryOp {
    match op {
        UnOp::Not => IrUnaryOp::Not,
        UnOp::Neg => IrUnaryOp::Neg,
    }
}

fn convert_op(kind: ConvKind) -> IrUnaryOp {
    match kind {
        ConvKind::ZeroExtend => IrUnaryOp::ZExt,
        ConvKind::SignExtend => IrUnaryOp::SExt,
        ConvKind::Truncate => IrUnaryOp::Trunc,
        ConvKind::PtrToInt => IrUnaryOp::PtrToInt,
        ConvKind::IntToPtr => IrUnaryOp::IntToPtr,
    }
}

struct FunctionRebuilder<'a> {
    function: &'a FuncOp,
}

impl FunctionRebuilder<'_> {
    fn rebuild(&self) -> Result<Function, TranslateError> {
        let function = self.function;
        let mut out = Function::new(function.symbol.clone(), type_from_dialect(&function.ret)?);
        out.is_vararg = function.vararg;
        out.is_external = function.attrs.external;
        out.inline_hint = hint_from_dialect(function.attrs.inline);
        out.source_location = function.attrs.loc.clone();
        out.parameters = function
            .params
            .iter()
            .map(|p| Ok((p.value.0, type_from_dialect(&p.ty)?)))
            .collect::<Result<_, TranslateError>>()?;

        for block in &function.blocks {
            let mut b = BasicBlock::new(block.id.0);
            b.predecessors = block.preds.iter().map(|id| id.0).collect();
            b.successors = block.succs.iter().map(|id| id.0).collect();
            for op in &block.ops {
                b.add_instruction(self.instruction(op)?);
            }
            out.blocks.push(b);
        }

        trace!("rebuilt function '{}' ({} blocks)", function.symbol, out.blocks.len());
        Ok(out)
    }

    fn invalid(&self, op: &Operation, reason: &str) -> TranslateError {
        TranslateError::InvalidOperation {
            function: self.function.symbol.clone(),
            op: op.name(),
            reason: reason.to_string(),
        }
    }

    /// Result of an operation that must define a value
    fn result(&self, op: &Operation) -> Result<TempId, TranslateError> {
        op.result
            .map(|id| id.0)
            .ok_or_else(|| self.invalid(op, "missing result value"))
    }

    fn no_result(&self, op: &Operation) -> Result<(), TranslateError> {
        match op.result {
            Some(_) => Err(self.invalid(op, "operation cannot define a value")),
            None => Ok(()),
        }
    }

    fn instruction(&self, op: &Operation) -> Result<Instruction, TranslateError> {
        let instr = match &op.kind {
            OpKind::Binary { op: bin, lhs, rhs } => Instruction::Binary {
                result: self.result(op)?,
                op: binary_op(*bin),
                lhs: value(lhs),
                rhs: value(rhs),
                result_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Cmp { pred, lhs, rhs } => Instruction::Binary {
                result: self.result(op)?,
                op: compare_op(*pred),
                lhs: value(lhs),
                rhs: value(rhs),
                result_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Unary { op: un, operand } => Instruction::Unary {
                result: self.result(op)?,
                op: unary_op(*un),
                operand: value(operand),
                result_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Convert { kind, operand } => Instruction::Unary {
                result: self.result(op)?,
                op: convert_op(*kind),
                operand: value(operand),
                result_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Load { ptr } => Instruction::Load {
                result: self.result(op)?,
                ptr: value(ptr),
                result_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Store { value: stored, ptr } => {
                self.no_result(op)?;
                Instruction::Store { value: value(stored), ptr: value(ptr) }
            }
            OpKind::ElementPtr { base, indices } => Instruction::GetElementPtr {
                result: self.result(op)?,
                ptr: value(base),
                indices: values(indices),
                result_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Alloca { alloc_ty, count } => Instruction::Alloca {
                result: self.result(op)?,
                alloc_type: type_from_dialect(alloc_ty)?,
                count: count.as_ref().map(value),
                result_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Call { callee, args, known_inlined } => Instruction::Call {
                result: op.result.map(|id| id.0),
                function: Value::Function(callee.clone()),
                args: values(args),
                result_type: type_from_dialect(&op.ty)?,
                known_inlined: *known_inlined,
            },
            OpKind::CallIndirect { target, args } => {
                if matches!(target, Operand::Func(_)) {
                    return Err(self.invalid(op, "indirect call through a function symbol"));
                }
                Instruction::Call {
                    result: op.result.map(|id| id.0),
                    function: value(target),
                    args: values(args),
                    result_type: type_from_dialect(&op.ty)?,
                    known_inlined: false,
                }
            }
            OpKind::Intrinsic { name, args } => Instruction::Intrinsic {
                result: op.result.map(|id| id.0),
                intrinsic: name.clone(),
                args: values(args),
                result_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Cast { operand } => Instruction::Cast {
                result: self.result(op)?,
                value: value(operand),
                target_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Select { cond, on_true, on_false } => Instruction::Select {
                result: self.result(op)?,
                condition: value(cond),
                true_value: value(on_true),
                false_value: value(on_false),
                result_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Phi { incoming } => Instruction::Phi {
                result: self.result(op)?,
                incoming: incoming.iter().map(|(v, b)| (value(v), b.0)).collect(),
                result_type: type_from_dialect(&op.ty)?,
            },
            OpKind::Ret { value: returned } => {
                self.no_result(op)?;
                Instruction::Return(returned.as_ref().map(value))
            }
            OpKind::Br { dest } => {
                self.no_result(op)?;
                Instruction::Branch(dest.0)
            }
            OpKind::CondBr { cond, on_true, on_false } => {
                self.no_result(op)?;
                Instruction::BranchCond {
                    condition: value(cond),
                    true_label: on_true.0,
                    false_label: on_false.0,
                }
            }
            OpKind::DebugLoc { loc } => Instruction::DebugLoc { location: loc.clone() },
            OpKind::Comment { text } => Instruction::Comment(text.clone()),
        };
        Ok(instr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pin_dialect::{Block, BlockId, Type, ValueId};
    use pretty_assertions::assert_eq;

    fn single_block(ops: Vec<Operation>) -> DialectModule {
        let mut function = FuncOp::new("f", Type::int(32));
        let mut block = Block::new(BlockId(0));
        block.ops = ops;
        function.blocks.push(block);
        let mut module = DialectModule::new("m");
        module.functions.push(function);
        module
    }

    #[test]
    fn test_unverified_module_is_rejected() {
        let module = single_block(vec![Operation::void(OpKind::Ret {
            value: Some(Operand::Value(ValueId(7))),
        })]);
        assert!(matches!(from_dialect(&module), Err(TranslateError::Malformed(_))));
    }

    #[test]
    fn test_missing_result_is_invalid() {
        let module = single_block(vec![
            Operation::new(
                None,
                Type::int(32),
                OpKind::Binary { op: BinOp::Add, lhs: Operand::Const(1), rhs: Operand::Const(2) },
            ),
            Operation::void(OpKind::Ret { value: None }),
        ]);
        match from_dialect(&module) {
            Err(TranslateError::InvalidOperation { function, op, .. }) => {
                assert_eq!(function, "f");
                assert_eq!(op, "pin.binary");
            }
            other => panic!("expected invalid operation, got {:?}", other),
        }
    }

    #[test]
    fn test_odd_integer_width_is_rejected() {
        let module = single_block(vec![
            Operation::new(
                Some(ValueId(0)),
                Type::int(24),
                OpKind::Load { ptr: Operand::Undef },
            ),
            Operation::void(OpKind::Ret { value: None }),
        ]);
        let error = from_dialect(&module).unwrap_err();
        assert_eq!(error, TranslateError::InvalidType { bits: 24 });
        assert_eq!(
            error.into_plugin_error(pin_common::InjectPoint::AfterInline),
            pin_common::PluginError::MalformedResult {
                inject_point: pin_common::InjectPoint::AfterInline,
                reason: "integer width 24 has no native type".to_string(),
            }
        );
    }

    #[test]
    fn test_compare_rebuilds_as_binary() {
        let module = single_block(vec![
            Operation::new(
                Some(ValueId(0)),
                Type::Bool,
                OpKind::Cmp { pred: CmpPred::Ult, lhs: Operand::Const(1), rhs: Operand::Const(2) },
            ),
            Operation::void(OpKind::Ret { value: None }),
        ]);
        let native = from_dialect(&module).unwrap();
        assert_eq!(
            native.functions[0].blocks[0].instructions[0],
            Instruction::Binary {
                result: 0,
                op: IrBinaryOp::Ult,
                lhs: Value::Constant(1),
                rhs: Value::Constant(2),
                result_type: pin_native::IrType::I1,
            }
        );
    }
}
