//! Injection-point registry
//!
//! Passes are registered once at server startup, then the registry is
//! frozen and shared read-only by every session.

use log::debug;
use pin_common::InjectPoint;
use std::sync::Arc;
use thiserror::Error;
use crate::Pass;

pub type PassFactory = Box<dyn Fn() -> Box<dyn Pass> + Send + Sync>;

/// Execution order within an injection point: lower priority first, then
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey {
    pub priority: i32,
    pub seq: u64,
}

pub struct PassRecord {
    pub name: String,
    pub inject_point: InjectPoint,
    pub key: OrderKey,
    factory: PassFactory,
}

impl PassRecord {
    /// Fresh pass object for a new session
    pub fn instantiate(&self) -> Box<dyn Pass> {
        (self.factory)()
    }
}

impl std::fmt::Debug for PassRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassRecord")
            .field("name", &self.name)
            .field("inject_point", &self.inject_point)
            .field("key", &self.key)
            .finish()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a pass named '{0}' is already registered")]
    DuplicateName(String),
}

#[derive(Default)]
pub struct PassRegistry {
    records: Vec<PassRecord>,
    next_seq: u64,
}

impl PassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(
        &mut self,
        point: InjectPoint,
        name: &str,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Pass> + Send + Sync + 'static,
    {
        self.register_with_priority(point, name, 0, factory)
    }

    pub fn register_with_priority<F>(
        &mut self,
        point: InjectPoint,
        name: &str,
        priority: i32,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Pass> + Send + Sync + 'static,
    {
        if self.records.iter().any(|r| r.name == name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        let key = OrderKey { priority, seq: self.next_seq };
        self.next_seq += 1;
        debug!("registered pass '{name}' at {point} (priority {priority})");
        self.records.push(PassRecord {
            name: name.to_string(),
            inject_point: point,
            key,
            factory: Box::new(factory),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stop accepting registrations
    pub fn freeze(mut self) -> Arc<FrozenRegistry> {
        self.records.sort_by_key(|r| r.key);
        Arc::new(FrozenRegistry { records: self.records })
    }
}

/// Immutable registry shared across sessions. Records are kept in
/// [`OrderKey`] order.
#[derive(Debug)]
pub struct FrozenRegistry {
    records: Vec<PassRecord>,
}

impl FrozenRegistry {
    pub fn records(&self) -> &[PassRecord] {
        &self.records
    }

    /// Records bound to `point`, in execution order
    pub fn records_for(&self, point: InjectPoint) -> impl Iterator<Item = &PassRecord> {
        self.records.iter().filter(move |r| r.inject_point == point)
    }

    /// `point:name` per record, in pipeline order of the points
    pub fn describe(&self) -> Vec<String> {
        InjectPoint::ALL
            .iter()
            .flat_map(|point| self.records_for(*point))
            .map(|r| format!("{}:{}", r.inject_point, r.name))
            .collect()
    }
}
