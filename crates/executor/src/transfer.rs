// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{
    abi::{emit, IBatchExecutor},
    accounting::ValueBudget,
    error::Result,
    guard::{self, ReentrancyLock},
    policy::AuthorizationPolicy,
    resolver::ResolvedCall,
};
use alloy_primitives::{Address, Bytes, U256};
use batch_ledger::{CallRequest, Context};

/// Sends `amounts[i]` to `recipients[i]`, each transfer on its own. A failed
/// transfer is reported as `false` and its amount stays with the executor.
/// The refund of unspent value is best-effort as well: a failed refund is
/// logged and announced but does not fail the call.
pub fn batch_transfer<A: AuthorizationPolicy>(
    lock: &ReentrancyLock, policy: &A, context: &mut Context,
    caller: &ResolvedCall, recipients: &[Address], amounts: &[U256],
) -> Result<Vec<bool>> {
    let sender = caller.effective_caller;
    let size = recipients.len();
    let _guard = guard::admit(lock, policy, context, &sender, size)?;
    guard::ensure_arity(recipients.len(), amounts.len())?;
    guard::ensure_targets(recipients)?;
    let budget = ValueBudget::reserve(context.value(), amounts)?;

    let mut results = Vec::with_capacity(recipients.len());
    for (recipient, amount) in recipients.iter().zip(amounts) {
        let succeeded = context
            .call(CallRequest {
                to: *recipient,
                value: *amount,
                data: Bytes::new(),
                gas_limit: None,
            })?
            .is_success();
        if !succeeded {
            debug!("Transfer of {} to {:?} failed", amount, recipient);
            emit(
                context,
                &IBatchExecutor::TransferFailed {
                    recipient: *recipient,
                    amount: *amount,
                },
            )?;
        }
        results.push(succeeded);
    }

    let refund = budget.refund();
    if !refund.is_zero() {
        let refunded = context
            .call(CallRequest {
                to: sender,
                value: refund,
                data: Bytes::new(),
                gas_limit: None,
            })?
            .is_success();
        if !refunded {
            warn!("Refund of {} to {:?} failed", refund, sender);
            emit(
                context,
                &IBatchExecutor::RefundFailed {
                    recipient: sender,
                    amount: refund,
                },
            )?;
        }
    }

    let success_count = results.iter().filter(|ok| **ok).count();
    emit(
        context,
        &IBatchExecutor::BatchTransferExecuted {
            sender,
            successCount: U256::from(success_count),
            totalCount: U256::from(results.len()),
        },
    )?;
    debug!(
        "Batch transfer: {}/{} transfers succeeded",
        success_count,
        results.len()
    );
    Ok(results)
}
