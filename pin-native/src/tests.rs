//! Unit tests for the native IR

use super::*;
use pretty_assertions::assert_eq;

fn build_max() -> Function {
    let mut builder = IrBuilder::new();
    builder.create_function("max", IrType::I32);
    let a = builder.add_parameter(IrType::I32).unwrap();
    let b = builder.add_parameter(IrType::I32).unwrap();

    let entry = builder.create_block().unwrap();
    let then_bb = builder.create_block().unwrap();
    let else_bb = builder.create_block().unwrap();
    let join = builder.create_block().unwrap();

    builder.switch_to_block(entry).unwrap();
    let cond = builder
        .build_binary(IrBinaryOp::Sgt, Value::Temp(a), Value::Temp(b), IrType::I1)
        .unwrap();
    builder.build_branch_cond(Value::Temp(cond), then_bb, else_bb).unwrap();

    builder.switch_to_block(then_bb).unwrap();
    builder.build_branch(join).unwrap();
    builder.switch_to_block(else_bb).unwrap();
    builder.build_branch(join).unwrap();

    builder.switch_to_block(join).unwrap();
    let phi = builder
        .build_phi(vec![(Value::Temp(a), then_bb), (Value::Temp(b), else_bb)], IrType::I32)
        .unwrap();
    builder.build_return(Some(Value::Temp(phi))).unwrap();
    builder.finish_function().unwrap()
}

#[test]
fn test_ir_values() {
    assert_eq!(format!("{}", Value::Temp(5)), "%5");
    assert_eq!(format!("{}", Value::Constant(42)), "42");
    assert_eq!(format!("{}", Value::Global("main".to_string())), "@main");
    assert_eq!(format!("{}", Value::ConstantArray(vec![1, 2])), "[1, 2]");
}

#[test]
fn test_basic_block() {
    let mut block = BasicBlock::new(0);
    assert!(block.is_empty());
    assert!(!block.has_terminator());

    block.add_instruction(Instruction::Comment("test".to_string()));
    assert!(!block.is_empty());
    assert!(!block.has_terminator());

    block.add_instruction(Instruction::Return(Some(Value::Constant(0))));
    assert!(block.has_terminator());
}

#[test]
fn test_builder_fills_cfg_edges() {
    let function = build_max();
    assert_eq!(function.parameters, vec![(0, IrType::I32), (1, IrType::I32)]);
    assert_eq!(function.blocks.len(), 4);

    let entry = &function.blocks[0];
    assert_eq!(entry.successors, vec![1, 2]);
    assert!(entry.predecessors.is_empty());

    let join = function.get_block(3).unwrap();
    assert_eq!(join.predecessors, vec![1, 2]);
    assert!(join.successors.is_empty());
}

#[test]
fn test_builder_requires_function_and_block() {
    let mut builder = IrBuilder::new();
    assert!(builder.build_return(None).is_err());
    assert!(builder.add_parameter(IrType::I32).is_err());

    builder.create_function("f", IrType::Void);
    assert_eq!(builder.build_return(None), Err("No current block".to_string()));
    assert!(builder.switch_to_block(7).is_err());
    assert!(!builder.current_block_has_terminator());
}

#[test]
fn test_instruction_results() {
    let call = Instruction::Call {
        result: None,
        function: Value::Function("f".to_string()),
        args: vec![],
        result_type: IrType::Void,
        known_inlined: false,
    };
    assert_eq!(call.result(), None);
    assert_eq!(Instruction::Alloca {
        result: 3,
        alloc_type: IrType::I8,
        count: None,
        result_type: IrType::Ptr(Box::new(IrType::I8)),
    }
    .result(), Some(3));
    assert!(Instruction::Branch(1).is_terminator());
    assert_eq!(Instruction::Branch(1).successors(), vec![1]);
}

#[test]
fn test_module_json_snapshot() {
    let mut module = Module::new("unit".to_string());
    module.add_function(build_max());
    module.add_global(GlobalVariable {
        name: "table".to_string(),
        var_type: IrType::Array { size: 2, element_type: Box::new(IrType::I16) },
        is_constant: true,
        initializer: Some(Value::ConstantArray(vec![1, 2])),
        linkage: Linkage::Internal,
    });

    let text = module.to_json().unwrap();
    let back = Module::from_json(&text).unwrap();
    assert_eq!(back, module);
    assert!(module.get_function("max").is_some());
    assert!(module.get_global("table").is_some());
}

#[test]
fn test_module_display() {
    let mut module = Module::new("unit".to_string());
    module.add_function(build_max());
    let text = module.to_string();
    assert!(text.starts_with("; module unit\n"));
    assert!(text.contains("define i32 @max(i32 %0, i32 %1) {"));
    assert!(text.contains("  %3 = phi i32 [%0, %L1], [%1, %L2]"));
}
