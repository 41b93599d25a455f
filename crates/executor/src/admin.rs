// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Owner-only operations. Callers hold the reentrancy lock and have passed
//! `ensure_owner` before any of these run.

use crate::{
    abi::{emit, IBatchExecutor},
    error::{BatchError, Result},
    storage_layout, MAX_BATCH_SIZE_LIMIT,
};
use alloy_primitives::{Address, Bytes, U256};
use batch_ledger::{CallRequest, Context};

pub fn ensure_owner(context: &mut Context, caller: &Address) -> Result<()> {
    if storage_layout::owner(context)? != *caller {
        return Err(BatchError::NotOwner);
    }
    Ok(())
}

fn ensure_non_zero(address: &Address) -> Result<()> {
    if address.is_zero() {
        return Err(BatchError::InvalidAddress);
    }
    Ok(())
}

pub fn set_trusted_forwarder(
    context: &mut Context, forwarder: Address, trusted: bool,
) -> Result<()> {
    ensure_non_zero(&forwarder)?;
    storage_layout::set_trusted_forwarder(context, &forwarder, trusted)?;
    info!("Trusted forwarder {:?}: trusted={}", forwarder, trusted);
    if trusted {
        emit(context, &IBatchExecutor::TrustedForwarderAdded { forwarder })
    } else {
        emit(context, &IBatchExecutor::TrustedForwarderRemoved { forwarder })
    }
}

pub fn set_authorized_caller(
    context: &mut Context, caller: Address, authorized: bool,
) -> Result<()> {
    ensure_non_zero(&caller)?;
    storage_layout::set_authorized(context, &caller, authorized)?;
    info!("Authorized caller {:?}: authorized={}", caller, authorized);
    if authorized {
        emit(context, &IBatchExecutor::AuthorizedCallerAdded { caller })
    } else {
        emit(context, &IBatchExecutor::AuthorizedCallerRemoved { caller })
    }
}

pub fn set_max_batch_size(context: &mut Context, new_size: U256) -> Result<()> {
    let size = u64::try_from(new_size)
        .ok()
        .filter(|size| (1..=MAX_BATCH_SIZE_LIMIT).contains(size))
        .ok_or(BatchError::InvalidMaxBatchSize(new_size))?;
    let old_size = storage_layout::max_batch_size(context)?;
    storage_layout::set_max_batch_size(context, size)?;
    info!("Max batch size updated: {} -> {}", old_size, size);
    emit(
        context,
        &IBatchExecutor::MaxBatchSizeUpdated {
            oldSize: U256::from(old_size),
            newSize: new_size,
        },
    )
}

pub fn set_max_gas_per_call(
    context: &mut Context, new_limit: U256,
) -> Result<()> {
    let limit = u64::try_from(new_limit)
        .ok()
        .filter(|limit| *limit > 0)
        .ok_or(BatchError::InvalidGasLimit(new_limit))?;
    let old_limit = storage_layout::max_gas_per_call(context)?;
    storage_layout::set_max_gas_per_call(context, limit)?;
    info!("Max gas per call updated: {} -> {}", old_limit, limit);
    emit(
        context,
        &IBatchExecutor::MaxGasPerCallUpdated {
            oldLimit: U256::from(old_limit),
            newLimit: new_limit,
        },
    )
}

pub fn transfer_ownership(
    context: &mut Context, new_owner: Address,
) -> Result<()> {
    ensure_non_zero(&new_owner)?;
    let previous_owner = storage_layout::owner(context)?;
    storage_layout::set_owner(context, &new_owner)?;
    info!("Ownership transferred: {:?} -> {:?}", previous_owner, new_owner);
    emit(
        context,
        &IBatchExecutor::OwnershipTransferred {
            previousOwner: previous_owner,
            newOwner: new_owner,
        },
    )
}

/// Sets the pause flag. Setting it to its current value is allowed and
/// still announced.
pub fn set_paused(
    context: &mut Context, account: Address, paused: bool,
) -> Result<()> {
    storage_layout::set_paused(context, paused)?;
    info!("Executor paused={} by {:?}", paused, account);
    if paused {
        emit(context, &IBatchExecutor::Paused { account })
    } else {
        emit(context, &IBatchExecutor::Unpaused { account })
    }
}

pub fn emergency_withdraw(
    context: &mut Context, to: Address, amount: U256,
) -> Result<()> {
    ensure_non_zero(&to)?;
    let executor = context.address();
    let available = context.balance(&executor)?;
    if amount > available {
        return Err(BatchError::InsufficientBalance {
            requested: amount,
            available,
        });
    }
    let result = context.call(CallRequest {
        to,
        value: amount,
        data: Bytes::new(),
        gas_limit: None,
    })?;
    if !result.is_success() {
        return Err(BatchError::WithdrawalFailed);
    }
    warn!("Emergency withdrawal of {} to {:?}", amount, to);
    emit(context, &IBatchExecutor::EmergencyWithdrawal { to, amount })
}
