//! Batch scheduler
//!
//! Runs the passes bound to one injection point as a single atomic batch:
//!
//! ```text
//! Idle -> AtInjectPoint(p) -> Dispatching(p) -> Idle
//!   \__________________ abort() __________________-> Aborted
//! ```
//!
//! Passes work on a copy of the module. When any of them fails, panics,
//! leaves the module invalid or changes it while reporting no change, the
//! copy is thrown away and the caller keeps the module it passed in. A
//! module that is already invalid on arrival is refused before any pass
//! sees it.

use log::{debug, info, warn};
use pin_common::{InjectPoint, PluginError};
use pin_dialect::{verify, DialectModule, VerifyError};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;
use crate::{FrozenRegistry, GateContext, Pass, PassContext, PassError, PassOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    AtInjectPoint(InjectPoint),
    Dispatching(InjectPoint),
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    NoChange,
    Changed(DialectModule),
    /// The batch was rolled back because of `pass`
    Failed { pass: String, error: PluginError },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("session was aborted")]
    Aborted,

    /// The incoming module broke an invariant before any pass ran
    #[error("module received at {inject_point} is malformed: {error}")]
    MalformedInput {
        inject_point: InjectPoint,
        error: VerifyError,
    },
}

struct ScheduledPass {
    inject_point: InjectPoint,
    pass: Box<dyn Pass>,
}

pub struct Scheduler {
    state: SchedulerState,
    passes: Vec<ScheduledPass>,
}

impl Scheduler {
    /// Instantiate every registered pass for a new session
    pub fn new(registry: &FrozenRegistry) -> Self {
        let passes = registry
            .records()
            .iter()
            .map(|record| ScheduledPass {
                inject_point: record.inject_point,
                pass: record.instantiate(),
            })
            .collect();
        Self { state: SchedulerState::Idle, passes }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn abort(&mut self) {
        self.state = SchedulerState::Aborted;
    }

    /// Run the batch bound to `point` against `module`
    pub fn dispatch(
        &mut self,
        point: InjectPoint,
        module: &DialectModule,
    ) -> Result<BatchOutcome, SchedulerError> {
        if self.state == SchedulerState::Aborted {
            return Err(SchedulerError::Aborted);
        }
        self.state = SchedulerState::AtInjectPoint(point);

        if let Err(error) = verify(module) {
            warn!("refusing malformed module at {point}: {error}");
            self.state = SchedulerState::Idle;
            return Err(SchedulerError::MalformedInput { inject_point: point, error });
        }

        let bound: Vec<usize> = (0..self.passes.len())
            .filter(|&i| self.passes[i].inject_point == point)
            .collect();
        if bound.is_empty() {
            debug!("no passes bound at {point}");
            self.state = SchedulerState::Idle;
            return Ok(BatchOutcome::NoChange);
        }

        self.state = SchedulerState::Dispatching(point);
        info!("dispatching {} pass(es) at {point} on module @{}", bound.len(), module.name);

        let mut working = module.clone();
        let mut changed = false;
        let ctx = PassContext { inject_point: point };

        for index in bound {
            let pass = &mut self.passes[index].pass;
            let name = pass.name().to_string();

            let gate = GateContext { inject_point: point, module: &working };
            let wants_to_run = match catch_unwind(AssertUnwindSafe(|| pass.gate(&gate))) {
                Ok(run) => run,
                Err(payload) => {
                    self.state = SchedulerState::Idle;
                    return Ok(failed(
                        point,
                        name,
                        format!("panicked in gate: {}", panic_message(&*payload)),
                    ));
                }
            };
            if !wants_to_run {
                debug!("pass '{name}' gated off at {point}");
                continue;
            }

            let before = working.clone();
            let result = catch_unwind(AssertUnwindSafe(|| pass.optimize(&mut working, &ctx)));
            let error = match result {
                Ok(Ok(PassOutcome::NoChange)) if working == before => {
                    debug!("pass '{name}' made no change");
                    continue;
                }
                Ok(Ok(PassOutcome::NoChange)) => {
                    "reported no change but modified the module".to_string()
                }
                Ok(Ok(PassOutcome::Changed)) => match verify(&working) {
                    Ok(()) => {
                        debug!("pass '{name}' changed the module");
                        changed = true;
                        continue;
                    }
                    Err(e) => PassError::from(e).to_string(),
                },
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("panicked: {}", panic_message(&*payload)),
            };

            self.state = SchedulerState::Idle;
            return Ok(failed(point, name, error));
        }

        self.state = SchedulerState::Idle;
        info!("batch at {point} finished ({})", if changed { "changed" } else { "no change" });
        Ok(if changed { BatchOutcome::Changed(working) } else { BatchOutcome::NoChange })
    }
}

fn failed(inject_point: InjectPoint, pass: String, message: String) -> BatchOutcome {
    warn!("pass '{pass}' failed at {inject_point}: {message}; batch rolled back");
    BatchOutcome::Failed {
        error: PluginError::PassFailure { inject_point, pass: pass.clone(), message },
        pass,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
