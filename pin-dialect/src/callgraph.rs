//! Call graph over a dialect module
//!
//! Nodes are function indices into `DialectModule::functions`; edges are
//! direct call sites resolved through the module's symbol table. Cycles in
//! the source program are just index loops here, so every traversal is a
//! visited-set walk.

use std::collections::{BTreeSet, VecDeque};
use crate::DialectModule;

/// One direct call site, addressed by position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub caller: usize,
    pub block: usize,
    pub op: usize,
    pub callee: usize,
}

#[derive(Debug, Clone)]
pub struct CallGraph {
    /// Call sites per caller, in block and op order
    sites: Vec<Vec<CallSite>>,
    /// Number of call sites targeting each function
    incoming: Vec<usize>,
}

impl CallGraph {
    pub fn build(module: &DialectModule) -> Self {
        let table = module.symbol_table();
        let mut sites = vec![Vec::new(); module.functions.len()];
        let mut incoming = vec![0; module.functions.len()];

        for (caller, function) in module.functions.iter().enumerate() {
            for (block, b) in function.blocks.iter().enumerate() {
                for (op, operation) in b.ops.iter().enumerate() {
                    let Some(callee) = operation.callee().and_then(|c| table.get(c).copied()) else {
                        continue;
                    };
                    sites[caller].push(CallSite { caller, block, op, callee });
                    incoming[callee] += 1;
                }
            }
        }

        Self { sites, incoming }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Call sites inside `caller`
    pub fn sites(&self, caller: usize) -> &[CallSite] {
        self.sites.get(caller).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every call site in the module, callers in module order
    pub fn all_sites(&self) -> impl Iterator<Item = &CallSite> {
        self.sites.iter().flatten()
    }

    /// Number of call sites that target `callee`
    pub fn call_count(&self, callee: usize) -> usize {
        self.incoming.get(callee).copied().unwrap_or(0)
    }

    /// Every call site targeting `callee`
    pub fn call_sites_of(&self, callee: usize) -> impl Iterator<Item = &CallSite> {
        self.all_sites().filter(move |s| s.callee == callee)
    }

    pub fn callees(&self, caller: usize) -> BTreeSet<usize> {
        self.sites(caller).iter().map(|s| s.callee).collect()
    }

    /// Whether `to` is reachable from `from` through one or more call edges
    pub fn reaches(&self, from: usize, to: usize) -> bool {
        let mut visited = vec![false; self.sites.len()];
        let mut queue: VecDeque<usize> = self.callees(from).into_iter().collect();

        while let Some(node) = queue.pop_front() {
            if node == to {
                return true;
            }
            if std::mem::replace(&mut visited[node], true) {
                continue;
            }
            queue.extend(self.callees(node));
        }
        false
    }

    /// Whether `function` takes part in a call cycle, including self recursion
    pub fn is_recursive(&self, function: usize) -> bool {
        self.reaches(function, function)
    }
}
