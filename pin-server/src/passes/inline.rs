//! Interprocedural inlining
//!
//! Each round rebuilds the call graph, picks call sites in caller, block
//! and op order, and splices the callee body into the caller:
//!
//! ```text
//! ^bb0:  a; %r = call @g(x); b        ^bb0:  a; br ^g0
//!                               ==>   ^g0..: body of @g, ret v => br ^cont
//!                                     ^cont: %r = phi [v, ^gN]...; b
//! ```
//!
//! Rounds repeat until nothing more is inlined or the iteration cap is
//! hit. Callees are never deleted afterwards.

use log::{debug, info};
use pin_dialect::{
    Block, BlockId, CallGraph, CallSite, DialectModule, FuncOp, InlineHint, OpKind, Operand,
    Operation, ValueId,
};
use std::collections::HashMap;
use crate::{GateContext, InlineConfig, Pass, PassContext, PassError, PassOutcome};

pub struct InlineFunctionPass {
    config: InlineConfig,
}

impl InlineFunctionPass {
    pub const NAME: &'static str = "inline";

    pub fn new(config: InlineConfig) -> Self {
        Self { config }
    }

    /// Why `site` cannot be inlined, if it cannot
    fn illegal(
        &self,
        graph: &CallGraph,
        site: &CallSite,
        call: &Operation,
        callee: &FuncOp,
    ) -> Option<&'static str> {
        let OpKind::Call { args, known_inlined, .. } = &call.kind else {
            return Some("not a direct call");
        };
        if *known_inlined {
            return Some("already handled by the host inliner");
        }
        if site.callee == site.caller {
            return Some("self-recursive call");
        }
        if !callee.has_body() {
            return Some("callee body is not available");
        }
        if callee.attrs.inline == InlineHint::NoInline {
            return Some("callee is noinline");
        }
        if callee.vararg {
            return Some("callee is variadic");
        }
        if args.len() != callee.params.len() {
            return Some("argument count does not match the callee");
        }
        if call.result.is_some() && callee.ret.is_void() {
            return Some("call uses the result of a void callee");
        }
        if graph.reaches(site.callee, site.caller) {
            return Some("callee can reach the caller");
        }
        if graph.is_recursive(site.callee) {
            return Some("callee is recursive");
        }
        None
    }

    fn is_beneficial(&self, graph: &CallGraph, site: &CallSite, callee: &FuncOp) -> bool {
        callee.attrs.inline == InlineHint::AlwaysInline
            || callee.size_estimate() <= self.config.size_threshold
            || graph.call_count(site.callee) == 1
    }

    /// Sites of `caller` to inline this round, in program order
    fn select(&self, module: &DialectModule, graph: &CallGraph, caller: usize) -> Vec<CallSite> {
        let caller_fn = &module.functions[caller];
        let mut size = caller_fn.size_estimate();
        let mut chosen = Vec::new();

        for site in graph.sites(caller) {
            let callee = &module.functions[site.callee];
            let call = &caller_fn.blocks[site.block].ops[site.op];

            if let Some(reason) = self.illegal(graph, site, call, callee) {
                debug!("not inlining @{} into @{}: {reason}", callee.symbol, caller_fn.symbol);
                continue;
            }
            if !self.is_beneficial(graph, site, callee) {
                debug!("not inlining @{} into @{}: too large", callee.symbol, caller_fn.symbol);
                continue;
            }
            let grown = size + callee.size_estimate();
            if grown > self.config.max_caller_size {
                debug!(
                    "not inlining @{} into @{}: caller would grow to {grown}",
                    callee.symbol,
                    caller_fn.symbol
                );
                continue;
            }
            size = grown;
            chosen.push(*site);
        }
        chosen
    }

    /// One round over every caller. Returns the number of sites inlined.
    fn run_round(&self, module: &mut DialectModule) -> Result<usize, PassError> {
        let graph = CallGraph::build(module);
        let mut inlined = 0;

        for caller in 0..module.functions.len() {
            let sites = self.select(module, &graph, caller);
            // Back to front, so earlier positions stay valid after each split
            for site in sites.iter().rev() {
                let callee = module.functions[site.callee].clone();
                let caller_fn = &mut module.functions[caller];
                debug!("inlining @{} into @{}", callee.symbol, caller_fn.symbol);
                inline_call(caller_fn, site.block, site.op, &callee)?;
                inlined += 1;
            }
        }
        Ok(inlined)
    }
}

impl Pass for InlineFunctionPass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn gate(&self, _ctx: &GateContext<'_>) -> bool {
        true
    }

    fn optimize(
        &mut self,
        module: &mut DialectModule,
        ctx: &PassContext,
    ) -> Result<PassOutcome, PassError> {
        let mut total = 0;
        for round in 1..=self.config.max_iterations {
            let inlined = self.run_round(module)?;
            debug!("inline round {round}: {inlined} site(s)");
            if inlined == 0 {
                break;
            }
            total += inlined;
            if round == self.config.max_iterations {
                debug!("inline iteration cap reached");
            }
        }

        info!("inlined {total} call site(s) at {}", ctx.inject_point);
        Ok(if total > 0 { PassOutcome::Changed } else { PassOutcome::NoChange })
    }
}

/// Replace the call at `block_index`/`op_index` in `caller` with a copy of
/// `callee`'s body
fn inline_call(
    caller: &mut FuncOp,
    block_index: usize,
    op_index: usize,
    callee: &FuncOp,
) -> Result<(), PassError> {
    let split_id = caller.blocks[block_index].id;
    let mut next_value = caller.next_value_id().0;
    let mut next_block = caller.next_block_id().0;

    let tail = caller.blocks[block_index].ops.split_off(op_index + 1);
    let call = caller.blocks[block_index]
        .ops
        .pop()
        .ok_or_else(|| PassError::failed("call site out of range"))?;
    let args = match &call.kind {
        OpKind::Call { args, .. } => args.clone(),
        _ => return Err(PassError::failed("call site is not a direct call")),
    };

    let cont_id = BlockId(next_block);
    next_block += 1;
    let block_map: HashMap<BlockId, BlockId> = callee
        .blocks
        .iter()
        .map(|b| {
            let id = BlockId(next_block);
            next_block += 1;
            (b.id, id)
        })
        .collect();

    let mut values: HashMap<ValueId, Operand> =
        callee.params.iter().map(|p| p.value).zip(args).collect();
    for op in callee.blocks.iter().flat_map(|b| b.ops.iter()) {
        if let Some(result) = op.result {
            values.insert(result, Operand::Value(ValueId(next_value)));
            next_value += 1;
        }
    }

    let mut returns = Vec::new();
    let mut cloned = Vec::with_capacity(callee.blocks.len());
    for block in &callee.blocks {
        let id = block_map.get(&block.id).copied().unwrap_or(block.id);
        let mut copy = Block::new(id);
        for op in &block.ops {
            let mut op = op.clone();
            op.result = op.result.and_then(|r| values.get(&r)).and_then(Operand::as_value);
            for operand in op.operands_mut() {
                if let Some(value) = operand.as_value() {
                    *operand = values
                        .get(&value)
                        .cloned()
                        .ok_or_else(|| {
                            PassError::failed(format!(
                                "@{} uses undefined value {value}",
                                callee.symbol
                            ))
                        })?;
                }
            }
            op.remap_blocks(|b| block_map.get(&b).copied().unwrap_or(b));

            if let OpKind::Ret { value } = &op.kind {
                returns.push((value.clone().unwrap_or(Operand::Undef), id));
                op = Operation::void(OpKind::Br { dest: cont_id });
            }
            copy.push(op);
        }
        cloned.push(copy);
    }

    let entry = cloned
        .first()
        .map(|b| b.id)
        .ok_or_else(|| PassError::failed(format!("@{} has no body", callee.symbol)))?;
    caller.blocks[block_index].push(Operation::void(OpKind::Br { dest: entry }));

    let mut cont = Block::new(cont_id);
    cont.ops = tail;

    // The call's result becomes a phi over the returns, or the returned
    // operand itself when there is only one
    let mut substitution = None;
    if let Some(result) = call.result {
        match returns.len() {
            0 => substitution = Some((result, Operand::Undef)),
            1 => substitution = Some((result, returns[0].0.clone())),
            _ => {
                let phi = OpKind::Phi { incoming: returns };
                cont.ops.insert(0, Operation::new(Some(result), call.ty.clone(), phi));
            }
        }
    }

    // Successors of the split block now see the continuation as predecessor
    let successors = cont.terminator().map(Operation::successors).unwrap_or_default();

    let at = block_index + 1;
    caller.blocks.splice(at..at, cloned.into_iter().chain(std::iter::once(cont)));

    for block in caller.blocks.iter_mut().filter(|b| successors.contains(&b.id)) {
        for op in block.ops.iter_mut().filter(|op| matches!(op.kind, OpKind::Phi { .. })) {
            op.remap_blocks(|b| if b == split_id { cont_id } else { b });
        }
    }

    if let Some((result, replacement)) = substitution {
        for op in caller.blocks.iter_mut().flat_map(|b| b.ops.iter_mut()) {
            for operand in op.operands_mut() {
                if operand.as_value() == Some(result) {
                    *operand = replacement.clone();
                }
            }
        }
    }

    caller.recompute_edges();
    Ok(())
}

#[cfg(test)]
mod tests;
