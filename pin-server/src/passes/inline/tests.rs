use super::*;
use pin_common::InjectPoint;
use pin_dialect::{verify, BinOp, CmpPred, Param, Type};
use pretty_assertions::assert_eq;

fn ctx() -> PassContext {
    PassContext { inject_point: InjectPoint::BeforeIpa }
}

fn v(id: u32) -> Operand {
    Operand::Value(ValueId(id))
}

fn call(result: Option<u32>, callee: &str, args: Vec<Operand>) -> Operation {
    Operation::new(
        result.map(ValueId),
        if result.is_some() { Type::int(32) } else { Type::Void },
        OpKind::Call { callee: callee.to_string(), args, known_inlined: false },
    )
}

fn ret(value: Option<Operand>) -> Operation {
    Operation::void(OpKind::Ret { value })
}

fn add(result: u32, lhs: Operand, rhs: Operand) -> Operation {
    Operation::new(
        Some(ValueId(result)),
        Type::int(32),
        OpKind::Binary { op: BinOp::Add, lhs, rhs },
    )
}

/// Single-block function taking `params` i32 parameters
fn function(name: &str, params: u32, ops: Vec<Operation>) -> FuncOp {
    let mut f = FuncOp::new(name, Type::int(32));
    for i in 0..params {
        f.params.push(Param { value: ValueId(i), ty: Type::int(32) });
    }
    let mut entry = Block::new(BlockId(0));
    entry.ops = ops;
    f.blocks.push(entry);
    f.recompute_edges();
    f
}

fn add_one() -> FuncOp {
    function("add_one", 1, vec![add(1, v(0), Operand::Const(1)), ret(Some(v(1)))])
}

fn module(functions: Vec<FuncOp>) -> DialectModule {
    let mut module = DialectModule::new("m");
    module.functions = functions;
    module
}

fn calls_in(module: &DialectModule, name: &str) -> usize {
    let Some(f) = module.function(name) else {
        return 0;
    };
    f.blocks.iter().flat_map(|b| b.ops.iter()).filter(|op| op.callee().is_some()).count()
}

fn run(module: &mut DialectModule, config: InlineConfig) -> PassOutcome {
    InlineFunctionPass::new(config).optimize(module, &ctx()).unwrap()
}

#[test]
fn test_single_return_is_substituted() {
    let main = function("main", 1, vec![call(Some(1), "add_one", vec![v(0)]), ret(Some(v(1)))]);
    let mut m = module(vec![add_one(), main]);

    assert_eq!(run(&mut m, InlineConfig::default()), PassOutcome::Changed);
    assert_eq!(verify(&m), Ok(()));

    let main = m.function("main").unwrap();
    let ids: Vec<BlockId> = main.blocks.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![BlockId(0), BlockId(2), BlockId(1)]);
    assert_eq!(main.blocks[0].ops, vec![Operation::void(OpKind::Br { dest: BlockId(2) })]);
    assert_eq!(
        main.blocks[1].ops,
        vec![add(2, v(0), Operand::Const(1)), Operation::void(OpKind::Br { dest: BlockId(1) })]
    );
    assert_eq!(main.blocks[2].ops, vec![ret(Some(v(2)))]);
    assert_eq!(main.blocks[1].preds, vec![BlockId(0)]);
    assert_eq!(main.blocks[2].preds, vec![BlockId(2)]);

    // The callee itself is left in place
    assert_eq!(m.function("add_one"), Some(&add_one()));
}

#[test]
fn test_multiple_returns_merge_through_phi() {
    let mut pick = FuncOp::new("pick", Type::int(32));
    pick.params.push(Param { value: ValueId(0), ty: Type::int(32) });
    let mut entry = Block::new(BlockId(0));
    entry.push(Operation::new(
        Some(ValueId(1)),
        Type::Bool,
        OpKind::Cmp { pred: CmpPred::Sgt, lhs: v(0), rhs: Operand::Const(0) },
    ));
    entry.push(Operation::void(OpKind::CondBr {
        cond: v(1),
        on_true: BlockId(1),
        on_false: BlockId(2),
    }));
    let mut positive = Block::new(BlockId(1));
    positive.push(ret(Some(Operand::Const(1))));
    let mut other = Block::new(BlockId(2));
    other.push(ret(Some(v(0))));
    pick.blocks = vec![entry, positive, other];
    pick.recompute_edges();

    let main = function("main", 1, vec![call(Some(1), "pick", vec![v(0)]), ret(Some(v(1)))]);
    let mut m = module(vec![pick, main]);

    assert_eq!(run(&mut m, InlineConfig::default()), PassOutcome::Changed);
    assert_eq!(verify(&m), Ok(()));

    let main = m.function("main").unwrap();
    let cont = main.block(BlockId(1)).unwrap();
    assert_eq!(
        cont.ops[0],
        Operation::new(
            Some(ValueId(1)),
            Type::int(32),
            OpKind::Phi { incoming: vec![(Operand::Const(1), BlockId(3)), (v(0), BlockId(4))] },
        )
    );
    assert_eq!(cont.preds, vec![BlockId(3), BlockId(4)]);
    assert_eq!(calls_in(&m, "main"), 0);
}

#[test]
fn test_successor_phis_follow_the_split() {
    let mut main = FuncOp::new("main", Type::int(32));
    main.params.push(Param { value: ValueId(0), ty: Type::int(32) });
    let mut entry = Block::new(BlockId(0));
    entry.push(call(Some(1), "add_one", vec![v(0)]));
    entry.push(Operation::void(OpKind::Br { dest: BlockId(1) }));
    let mut exit = Block::new(BlockId(1));
    exit.push(Operation::new(
        Some(ValueId(2)),
        Type::int(32),
        OpKind::Phi { incoming: vec![(v(1), BlockId(0))] },
    ));
    exit.push(ret(Some(v(2))));
    main.blocks = vec![entry, exit];
    main.recompute_edges();

    let mut m = module(vec![add_one(), main]);
    assert_eq!(run(&mut m, InlineConfig::default()), PassOutcome::Changed);
    assert_eq!(verify(&m), Ok(()));

    let exit = m.function("main").unwrap().block(BlockId(1)).unwrap();
    assert_eq!(exit.ops[0].kind, OpKind::Phi { incoming: vec![(v(3), BlockId(2))] });
    assert_eq!(exit.preds, vec![BlockId(2)]);
}

#[test]
fn test_chain_reaches_fixed_point() {
    let g = function("g", 1, vec![add(1, v(0), Operand::Const(2)), ret(Some(v(1)))]);
    let f = function("f", 1, vec![call(Some(1), "g", vec![v(0)]), ret(Some(v(1)))]);
    let main = function("main", 1, vec![call(Some(1), "f", vec![v(0)]), ret(Some(v(1)))]);
    let mut m = module(vec![main, f, g]);

    assert_eq!(run(&mut m, InlineConfig::default()), PassOutcome::Changed);
    assert_eq!(verify(&m), Ok(()));
    assert_eq!(calls_in(&m, "main"), 0);
    assert_eq!(calls_in(&m, "f"), 0);

    // A second run finds nothing left to do
    assert_eq!(run(&mut m, InlineConfig::default()), PassOutcome::NoChange);
}

#[test]
fn test_iteration_cap_stops_early() {
    let g = function("g", 1, vec![add(1, v(0), Operand::Const(2)), ret(Some(v(1)))]);
    let f = function("f", 1, vec![call(Some(1), "g", vec![v(0)]), ret(Some(v(1)))]);
    let main = function("main", 1, vec![call(Some(1), "f", vec![v(0)]), ret(Some(v(1)))]);
    let mut m = module(vec![main, f, g]);

    let config = InlineConfig { max_iterations: 1, ..InlineConfig::default() };
    assert_eq!(run(&mut m, config), PassOutcome::Changed);
    assert_eq!(verify(&m), Ok(()));
    // main picked up f's body before f itself was flattened
    assert_eq!(calls_in(&m, "main"), 1);
    assert_eq!(calls_in(&m, "f"), 0);
}

#[test]
fn test_recursion_is_never_inlined() {
    let fact = function("fact", 1, vec![call(Some(1), "fact", vec![v(0)]), ret(Some(v(1)))]);
    let a = function("a", 1, vec![call(Some(1), "b", vec![v(0)]), ret(Some(v(1)))]);
    let b = function("b", 1, vec![call(Some(1), "a", vec![v(0)]), ret(Some(v(1)))]);
    let main = function(
        "main",
        1,
        vec![call(Some(1), "fact", vec![v(0)]), call(Some(2), "a", vec![v(1)]), ret(Some(v(2)))],
    );
    let mut m = module(vec![fact, a, b, main]);
    let before = m.clone();

    assert_eq!(run(&mut m, InlineConfig::default()), PassOutcome::NoChange);
    assert_eq!(m, before);
}

#[test]
fn test_illegal_sites_are_skipped() {
    let mut no_inline = add_one();
    no_inline.symbol = "no_inline".to_string();
    no_inline.attrs.inline = InlineHint::NoInline;

    let mut external = FuncOp::new("external", Type::int(32));
    external.params.push(Param { value: ValueId(0), ty: Type::int(32) });
    external.attrs.external = true;

    let mut handled = call(Some(3), "add_one", vec![v(0)]);
    handled.kind = OpKind::Call {
        callee: "add_one".to_string(),
        args: vec![v(0)],
        known_inlined: true,
    };

    let main = function(
        "main",
        1,
        vec![
            call(Some(1), "no_inline", vec![v(0)]),
            call(Some(2), "external", vec![v(0)]),
            handled,
            call(Some(4), "add_one", vec![v(0), v(1)]),
            ret(Some(v(4))),
        ],
    );
    let mut m = module(vec![add_one(), no_inline, external, main]);
    let before = m.clone();

    assert_eq!(run(&mut m, InlineConfig::default()), PassOutcome::NoChange);
    assert_eq!(m, before);
}

#[test]
fn test_size_threshold_and_always_inline() {
    let main = function(
        "main",
        1,
        vec![
            call(Some(1), "add_one", vec![v(0)]),
            call(Some(2), "add_one", vec![v(1)]),
            ret(Some(v(2))),
        ],
    );
    let config = InlineConfig { size_threshold: 1, ..InlineConfig::default() };

    let mut m = module(vec![add_one(), main.clone()]);
    assert_eq!(run(&mut m, config.clone()), PassOutcome::NoChange);

    let mut hinted = add_one();
    hinted.attrs.inline = InlineHint::AlwaysInline;
    let mut m = module(vec![hinted, main]);
    assert_eq!(run(&mut m, config), PassOutcome::Changed);
    assert_eq!(verify(&m), Ok(()));
    assert_eq!(calls_in(&m, "main"), 0);
}

#[test]
fn test_single_call_site_is_worth_inlining() {
    let main = function("main", 1, vec![call(Some(1), "add_one", vec![v(0)]), ret(Some(v(1)))]);
    let mut m = module(vec![add_one(), main]);
    let config = InlineConfig { size_threshold: 0, ..InlineConfig::default() };
    assert_eq!(run(&mut m, config), PassOutcome::Changed);
}

#[test]
fn test_caller_growth_limit() {
    let main = function("main", 1, vec![call(Some(1), "add_one", vec![v(0)]), ret(Some(v(1)))]);
    let mut m = module(vec![add_one(), main]);
    let config = InlineConfig { max_caller_size: 3, ..InlineConfig::default() };
    assert_eq!(run(&mut m, config), PassOutcome::NoChange);
}

#[test]
fn test_gate_always_opens() {
    let pass = InlineFunctionPass::new(InlineConfig::default());
    let m = DialectModule::new("empty");
    for point in InjectPoint::ALL {
        assert!(pass.gate(&GateContext { inject_point: point, module: &m }));
    }
    assert_eq!(pass.name(), "inline");
}
