//! Registry, scheduler and configuration tests

use super::*;
use pin_common::{InjectPoint, PluginError};
use pin_dialect::{
    Block, BlockId, DialectModule, FuncOp, GlobalOp, Linkage, OpKind, Operation, Type, VerifyError,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Appends a global named after itself
struct Tagger {
    name: &'static str,
    open: bool,
}

impl Pass for Tagger {
    fn name(&self) -> &str {
        self.name
    }

    fn gate(&self, _ctx: &GateContext<'_>) -> bool {
        self.open
    }

    fn optimize(
        &mut self,
        module: &mut DialectModule,
        _ctx: &PassContext,
    ) -> Result<PassOutcome, PassError> {
        module.globals.push(GlobalOp {
            symbol: self.name.to_string(),
            ty: Type::int(32),
            constant: false,
            init: None,
            linkage: Linkage::Internal,
        });
        Ok(PassOutcome::Changed)
    }
}

enum Breakage {
    Error,
    Panic,
    DropTerminator,
}

struct Vandal(Breakage);

impl Pass for Vandal {
    fn name(&self) -> &str {
        "vandal"
    }

    fn gate(&self, _ctx: &GateContext<'_>) -> bool {
        true
    }

    fn optimize(
        &mut self,
        module: &mut DialectModule,
        _ctx: &PassContext,
    ) -> Result<PassOutcome, PassError> {
        module.functions[0].blocks[0].ops.clear();
        match self.0 {
            Breakage::Error => Err(PassError::failed("gave up")),
            Breakage::Panic => panic!("vandal panicked on purpose"),
            Breakage::DropTerminator => Ok(PassOutcome::Changed),
        }
    }
}

/// Empties `main` but claims it left the module alone
struct Liar;

impl Pass for Liar {
    fn name(&self) -> &str {
        "liar"
    }

    fn gate(&self, _ctx: &GateContext<'_>) -> bool {
        true
    }

    fn optimize(
        &mut self,
        module: &mut DialectModule,
        _ctx: &PassContext,
    ) -> Result<PassOutcome, PassError> {
        module.functions[0].blocks[0].ops.clear();
        Ok(PassOutcome::NoChange)
    }
}

/// Counts how often it was run
struct Witness(Arc<AtomicUsize>);

impl Pass for Witness {
    fn name(&self) -> &str {
        "witness"
    }

    fn gate(&self, _ctx: &GateContext<'_>) -> bool {
        true
    }

    fn optimize(
        &mut self,
        _module: &mut DialectModule,
        _ctx: &PassContext,
    ) -> Result<PassOutcome, PassError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(PassOutcome::NoChange)
    }
}

fn witness(runs: &Arc<AtomicUsize>) -> impl Fn() -> Box<dyn Pass> + Send + Sync {
    let runs = Arc::clone(runs);
    move || -> Box<dyn Pass> { Box::new(Witness(Arc::clone(&runs))) }
}

fn tagger(name: &'static str) -> impl Fn() -> Box<dyn Pass> + Send + Sync {
    move || -> Box<dyn Pass> { Box::new(Tagger { name, open: true }) }
}

fn sample() -> DialectModule {
    let mut main = FuncOp::new("main", Type::Void);
    let mut entry = Block::new(BlockId(0));
    entry.push(Operation::void(OpKind::Ret { value: None }));
    main.blocks.push(entry);
    let mut module = DialectModule::new("sample");
    module.functions.push(main);
    module
}

fn global_names(module: &DialectModule) -> Vec<&str> {
    module.globals.iter().map(|g| g.symbol.as_str()).collect()
}

#[test]
fn test_registry_rejects_duplicate_names() {
    let mut registry = PassRegistry::new();
    registry.register(InjectPoint::BeforeIpa, "a", tagger("a")).unwrap();
    assert_eq!(
        registry.register(InjectPoint::AfterIpa, "a", tagger("a")),
        Err(RegistryError::DuplicateName("a".to_string()))
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_registry_orders_by_priority_then_sequence() {
    let mut registry = PassRegistry::new();
    registry.register_with_priority(InjectPoint::BeforeIpa, "late", 5, tagger("late")).unwrap();
    registry.register(InjectPoint::BeforeIpa, "first", tagger("first")).unwrap();
    registry.register(InjectPoint::CompileEnd, "other", tagger("other")).unwrap();
    registry.register(InjectPoint::BeforeIpa, "second", tagger("second")).unwrap();
    let frozen = registry.freeze();

    let names: Vec<&str> =
        frozen.records_for(InjectPoint::BeforeIpa).map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "late"]);
    assert_eq!(
        frozen.describe(),
        vec!["before-ipa:first", "before-ipa:second", "before-ipa:late", "compile-end:other"]
    );
}

#[test]
fn test_batch_runs_in_key_order() {
    let mut registry = PassRegistry::new();
    registry.register_with_priority(InjectPoint::BeforeIpa, "c", 5, tagger("c")).unwrap();
    registry.register(InjectPoint::BeforeIpa, "a", tagger("a")).unwrap();
    registry.register(InjectPoint::BeforeIpa, "b", tagger("b")).unwrap();
    registry.register(InjectPoint::AfterIpa, "elsewhere", tagger("elsewhere")).unwrap();
    let mut scheduler = Scheduler::new(&registry.freeze());

    let module = sample();
    match scheduler.dispatch(InjectPoint::BeforeIpa, &module).unwrap() {
        BatchOutcome::Changed(changed) => assert_eq!(global_names(&changed), vec!["a", "b", "c"]),
        other => panic!("expected a change, got {:?}", other),
    }
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}

#[test]
fn test_unbound_point_and_closed_gate_mean_no_change() {
    let mut registry = PassRegistry::new();
    registry
        .register(InjectPoint::BeforeIpa, "closed", || -> Box<dyn Pass> {
            Box::new(Tagger { name: "closed", open: false })
        })
        .unwrap();
    let mut scheduler = Scheduler::new(&registry.freeze());

    assert_eq!(scheduler.dispatch(InjectPoint::Pragmas, &sample()), Ok(BatchOutcome::NoChange));
    assert_eq!(scheduler.dispatch(InjectPoint::BeforeIpa, &sample()), Ok(BatchOutcome::NoChange));
}

fn run_with_vandal(breakage: Breakage) -> BatchOutcome {
    let mut registry = PassRegistry::new();
    registry.register(InjectPoint::AfterInline, "tag", tagger("tag")).unwrap();
    let breakage = std::sync::Mutex::new(Some(breakage));
    registry
        .register(InjectPoint::AfterInline, "vandal", move || -> Box<dyn Pass> {
            let kind = breakage.lock().ok().and_then(|mut b| b.take()).unwrap_or(Breakage::Error);
            Box::new(Vandal(kind))
        })
        .unwrap();
    let mut scheduler = Scheduler::new(&registry.freeze());

    let module = sample();
    let outcome = scheduler.dispatch(InjectPoint::AfterInline, &module).unwrap();
    assert_eq!(module, sample());
    assert_eq!(scheduler.state(), SchedulerState::Idle);
    outcome
}

#[test]
fn test_failing_pass_rolls_back_the_batch() {
    match run_with_vandal(Breakage::Error) {
        BatchOutcome::Failed { pass, error } => {
            assert_eq!(pass, "vandal");
            assert_eq!(
                error,
                PluginError::PassFailure {
                    inject_point: InjectPoint::AfterInline,
                    pass: "vandal".to_string(),
                    message: "gave up".to_string(),
                }
            );
            assert!(error.is_recoverable());
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_panicking_pass_is_contained() {
    match run_with_vandal(Breakage::Panic) {
        BatchOutcome::Failed { error: PluginError::PassFailure { message, .. }, .. } => {
            assert!(message.contains("vandal panicked on purpose"), "{message}");
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_invalid_ir_is_a_pass_failure() {
    match run_with_vandal(Breakage::DropTerminator) {
        BatchOutcome::Failed { error: PluginError::PassFailure { message, .. }, .. } => {
            assert!(message.contains("invalid"), "{message}");
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_failure_in_the_middle_of_a_batch_stops_it() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut registry = PassRegistry::new();
    registry.register(InjectPoint::AfterIpa, "tag", tagger("tag")).unwrap();
    registry
        .register(
            InjectPoint::AfterIpa,
            "vandal",
            || -> Box<dyn Pass> { Box::new(Vandal(Breakage::Error)) },
        )
        .unwrap();
    registry.register(InjectPoint::AfterIpa, "witness", witness(&runs)).unwrap();
    let mut scheduler = Scheduler::new(&registry.freeze());

    let module = sample();
    match scheduler.dispatch(InjectPoint::AfterIpa, &module).unwrap() {
        BatchOutcome::Failed { pass, .. } => assert_eq!(pass, "vandal"),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(module, sample());
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unreported_change_is_a_pass_failure() {
    let mut registry = PassRegistry::new();
    registry.register(InjectPoint::AfterIpa, "tag", tagger("tag")).unwrap();
    let liar = || -> Box<dyn Pass> { Box::new(Liar) };
    registry.register(InjectPoint::AfterIpa, "liar", liar).unwrap();
    let mut scheduler = Scheduler::new(&registry.freeze());

    let module = sample();
    match scheduler.dispatch(InjectPoint::AfterIpa, &module).unwrap() {
        BatchOutcome::Failed { pass, error: PluginError::PassFailure { message, .. } } => {
            assert_eq!(pass, "liar");
            assert!(message.contains("reported no change"), "{message}");
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(module, sample());
}

#[test]
fn test_malformed_input_is_refused_before_any_pass() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut registry = builtin_registry(&ServerConfig::default()).unwrap();
    registry.register(InjectPoint::BeforeIpa, "witness", witness(&runs)).unwrap();
    let mut scheduler = Scheduler::new(&registry.freeze());

    let mut module = sample();
    module.functions[0].blocks[0].ops.insert(
        0,
        Operation::void(OpKind::Call {
            callee: "puts".to_string(),
            args: Vec::new(),
            known_inlined: false,
        }),
    );

    assert_eq!(
        scheduler.dispatch(InjectPoint::BeforeIpa, &module),
        Err(SchedulerError::MalformedInput {
            inject_point: InjectPoint::BeforeIpa,
            error: VerifyError::DanglingCall {
                function: "main".to_string(),
                callee: "puts".to_string(),
            },
        })
    );
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(scheduler.state(), SchedulerState::Idle);

    // The scheduler stays usable
    assert_eq!(scheduler.dispatch(InjectPoint::BeforeIpa, &sample()), Ok(BatchOutcome::NoChange));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_aborted_scheduler_refuses_work() {
    let mut scheduler = Scheduler::new(&PassRegistry::new().freeze());
    scheduler.abort();
    assert_eq!(scheduler.state(), SchedulerState::Aborted);
    assert_eq!(scheduler.dispatch(InjectPoint::BeforeIpa, &sample()), Err(SchedulerError::Aborted));
}

#[test]
fn test_builtin_registry_follows_config() {
    let frozen = builtin_registry(&ServerConfig::default()).unwrap().freeze();
    assert_eq!(frozen.describe(), vec!["before-ipa:inline"]);

    let config = ServerConfig { inline_point: InjectPoint::AfterInline, ..ServerConfig::default() };
    let frozen = builtin_registry(&config).unwrap().freeze();
    assert_eq!(frozen.describe(), vec!["after-inline:inline"]);
}

#[test]
fn test_config_defaults_fill_missing_fields() {
    let json = r#"{"inline": {"size_threshold": 10}, "inline_point": "after-ipa"}"#;
    let config = ServerConfig::from_json(json).unwrap();
    assert_eq!(
        config.inline,
        InlineConfig { size_threshold: 10, max_iterations: 8, max_caller_size: 2000 }
    );
    assert_eq!(config.inline_point, InjectPoint::AfterIpa);
    assert_eq!(config.invoke_budget_ms, 30_000);

    assert!(matches!(ServerConfig::from_json("{\"inline\": 3}"), Err(ConfigError::Parse(_))));
}
