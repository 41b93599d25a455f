// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Batch Orchestrator: runs one batch through
//! `Validating -> Accounting -> Executing -> Reconciling -> Done`. A call
//! failure that policy does not tolerate moves the batch to `Aborted` and
//! surfaces as an error, which makes the ledger roll back the whole
//! invocation. Callers never see a partial outcome list.

use crate::{
    abi::{emit, IBatchExecutor},
    accounting::ValueBudget,
    call::execute_sub_call,
    error::{BatchError, Result},
    guard::{self, ReentrancyLock},
    policy::AuthorizationPolicy,
    resolver::ResolvedCall,
    storage_layout,
    types::{FailureReason, SubCall, SubCallOutcome},
};
use alloy_primitives::{Address, Bytes, U256};
use batch_ledger::{CallRequest, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Accounting,
    Executing,
    Reconciling,
    Done,
    Aborted,
}

/// A decoded batch invocation.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub items: Vec<SubCall>,
    /// Per-item gas caps, parallel to `items`.
    pub gas_limits: Option<Vec<U256>>,
    pub stop_on_failure: bool,
}

struct BatchRun {
    stage: Stage,
    initiator: Address,
    forwarder: Option<Address>,
    batch_id: U256,
}

impl BatchRun {
    fn advance(&mut self, stage: Stage) {
        trace!(
            "Batch {} stage: {:?} -> {:?}",
            self.batch_id,
            self.stage,
            stage
        );
        self.stage = stage;
    }

    fn execute(
        &mut self, context: &mut Context, items: &[SubCall],
        gas_caps: Option<&[u64]>, stop_on_failure: bool,
    ) -> Result<Vec<SubCallOutcome>> {
        let mut outcomes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let gas_cap = gas_caps.map(|caps| caps[index]);
            let outcome = execute_sub_call(
                context,
                item.target,
                item.value,
                item.payload.clone(),
                gas_cap,
            )?;

            if !outcome.succeeded && (item.require_success || stop_on_failure) {
                self.advance(Stage::Aborted);
                let reason =
                    FailureReason::from_revert_data(&outcome.return_data);
                debug!(
                    "Batch {} aborted: call {} failed: {}",
                    self.batch_id, index, reason
                );
                return Err(BatchError::CallFailed { index, reason });
            }

            emit(
                context,
                &IBatchExecutor::CallExecuted {
                    batchId: self.batch_id,
                    index: U256::from(index),
                    target: item.target,
                    success: outcome.succeeded,
                    gasUsed: U256::from(outcome.resource_used),
                },
            )?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Refunds the unspent value. The initiator must be able to take it.
    fn reconcile(
        &mut self, context: &mut Context, budget: &ValueBudget,
        outcomes: &[SubCallOutcome],
    ) -> Result<()> {
        let refund = budget.refund();
        if !refund.is_zero() {
            let result = context.call(CallRequest {
                to: self.initiator,
                value: refund,
                data: Bytes::new(),
                gas_limit: None,
            })?;
            if !result.is_success() {
                return Err(BatchError::RefundFailed {
                    recipient: self.initiator,
                    amount: refund,
                });
            }
        }

        let success_count = outcomes.iter().filter(|o| o.succeeded).count();
        emit(
            context,
            &IBatchExecutor::BatchExecuted {
                executor: self.initiator,
                batchId: self.batch_id,
                successCount: U256::from(success_count),
                totalCount: U256::from(outcomes.len()),
            },
        )?;
        if let Some(forwarder) = self.forwarder {
            emit(
                context,
                &IBatchExecutor::MetaTransactionExecuted {
                    forwarder,
                    sender: self.initiator,
                    batchId: self.batch_id,
                },
            )?;
        }
        debug!(
            "Batch {} executed: {}/{} calls succeeded, refund {}",
            self.batch_id,
            success_count,
            outcomes.len(),
            refund
        );
        Ok(())
    }
}

/// Runs one batch for `caller`. The reentrancy lock is held from admission
/// until the refund has been made.
pub fn run_batch<A: AuthorizationPolicy>(
    lock: &ReentrancyLock, policy: &A, context: &mut Context,
    caller: &ResolvedCall, request: BatchRequest,
) -> Result<Vec<SubCallOutcome>> {
    let BatchRequest {
        items,
        gas_limits,
        stop_on_failure,
    } = request;
    let mut run = BatchRun {
        stage: Stage::Validating,
        initiator: caller.effective_caller,
        forwarder: caller.forwarder,
        batch_id: U256::ZERO,
    };

    let _guard = guard::admit(
        lock,
        policy,
        context,
        &caller.effective_caller,
        items.len(),
    )?;
    let gas_caps = match &gas_limits {
        Some(limits) => {
            guard::ensure_arity(items.len(), limits.len())?;
            let max = storage_layout::max_gas_per_call(context)?;
            Some(guard::ensure_gas_caps(limits, max)?)
        }
        None => None,
    };
    guard::ensure_targets(items.iter().map(|item| &item.target))?;

    run.advance(Stage::Accounting);
    let values = items.iter().map(|item| &item.value);
    let budget = ValueBudget::reserve(context.value(), values)?;
    run.batch_id = storage_layout::batch_counter(context)? + U256::from(1);
    storage_layout::set_batch_counter(context, run.batch_id)?;
    storage_layout::set_batch_initiator(
        context,
        &run.batch_id,
        &run.initiator,
    )?;

    run.advance(Stage::Executing);
    let outcomes =
        run.execute(context, &items, gas_caps.as_deref(), stop_on_failure)?;

    run.advance(Stage::Reconciling);
    run.reconcile(context, &budget, &outcomes)?;

    run.advance(Stage::Done);
    Ok(outcomes)
}
