// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{error::Result, types::SubCallOutcome};
use alloy_primitives::{Address, Bytes, U256};
use batch_ledger::{CallRequest, Context, MessageCallResult};

/// Performs exactly one call to `target`, bounded by `gas_cap` if given.
/// Whatever happens inside the callee ends up in the outcome; only the
/// executor itself running out of gas is an error.
pub fn execute_sub_call(
    context: &mut Context, target: Address, value: U256, payload: Bytes,
    gas_cap: Option<u64>,
) -> Result<SubCallOutcome> {
    let gas_before = context.gas_left();
    let result = context.call(CallRequest {
        to: target,
        value,
        data: payload,
        gas_limit: gas_cap,
    })?;
    // Stipends can hand back more than the callee was charged.
    let resource_used = gas_before.saturating_sub(context.gas_left());

    let (succeeded, return_data) = match result {
        MessageCallResult::Success(data) => (true, data),
        MessageCallResult::Reverted(data) => (false, data),
        MessageCallResult::Failed(e) => {
            debug!("Sub-call trapped: target={:?} err={:?}", target, e);
            (false, Bytes::new())
        }
    };
    trace!(
        "Sub-call: target={:?} value={} success={} gas_used={}",
        target,
        value,
        succeeded,
        resource_used
    );
    Ok(SubCallOutcome {
        succeeded,
        return_data,
        resource_used,
    })
}
