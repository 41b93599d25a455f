// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! The checks every batch entry point runs before touching anything, in a
//! fixed order: pause flag, reentrancy lock, authorization, batch size.
//! Which error a malformed call gets depends on that order.

use crate::{
    error::{BatchError, Result},
    policy::AuthorizationPolicy,
    storage_layout,
};
use alloy_primitives::{Address, U256};
use batch_ledger::Context;
use parking_lot::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Idle,
    Locked,
}

/// The reentrancy lock of one executor instance. It is held for the whole
/// of a mutating entry point, nested calls included, so a nested call that
/// re-enters the executor finds it taken.
#[derive(Debug, Default)]
pub struct ReentrancyLock {
    inner: Mutex<()>,
}

/// Holding a `ReentrancyGuard` means holding the lock. Dropping it releases
/// the lock, whichever way the entry point exits.
#[must_use]
pub struct ReentrancyGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl ReentrancyLock {
    pub fn new() -> Self { Self::default() }

    pub fn enter(&self) -> Result<ReentrancyGuard<'_>> {
        match self.inner.try_lock() {
            Some(guard) => Ok(ReentrancyGuard { _guard: guard }),
            None => {
                warn!("Reentrant call rejected");
                Err(BatchError::Reentrant)
            }
        }
    }

    pub fn status(&self) -> LockStatus {
        if self.inner.is_locked() {
            LockStatus::Locked
        } else {
            LockStatus::Idle
        }
    }
}

pub fn ensure_not_paused(paused: bool) -> Result<()> {
    if paused {
        return Err(BatchError::Paused);
    }
    Ok(())
}

pub fn ensure_authorized(caller: &Address, permitted: bool) -> Result<()> {
    if !permitted {
        return Err(BatchError::Unauthorized(*caller));
    }
    Ok(())
}

pub fn ensure_batch_size(size: usize, max: u64) -> Result<()> {
    if size == 0 || size as u64 > max {
        return Err(BatchError::InvalidBatchSize { size, max });
    }
    Ok(())
}

/// A parallel array has to match the number of calls.
pub fn ensure_arity(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(BatchError::ArityMismatch { expected, got });
    }
    Ok(())
}

/// Checks every per-call gas cap against `max` and narrows them to `u64`.
pub fn ensure_gas_caps(caps: &[U256], max: u64) -> Result<Vec<u64>> {
    caps.iter()
        .enumerate()
        .map(|(index, cap)| {
            u64::try_from(*cap).ok().filter(|cap| *cap <= max).ok_or(
                BatchError::ResourceCapTooHigh {
                    index,
                    limit: *cap,
                    max,
                },
            )
        })
        .collect()
}

/// No call is ever dispatched to the zero address.
pub fn ensure_targets<'a, I>(targets: I) -> Result<()>
where I: IntoIterator<Item = &'a Address> {
    match targets.into_iter().position(|target| target.is_zero()) {
        Some(index) => Err(BatchError::InvalidTarget { index }),
        None => Ok(()),
    }
}

/// Runs the admission pipeline of a batch entry point. The returned guard
/// must be held until the entry point returns.
pub fn admit<'l, A: AuthorizationPolicy>(
    lock: &'l ReentrancyLock, policy: &A, context: &mut Context,
    caller: &Address, batch_size: usize,
) -> Result<ReentrancyGuard<'l>> {
    ensure_not_paused(storage_layout::paused(context)?)?;
    let guard = lock.enter().map_err(|e| {
        debug!(
            "Admission refused at depth {}: executor re-entered={}",
            context.depth(),
            context.callstack().in_reentrancy()
        );
        e
    })?;
    ensure_authorized(caller, policy.is_authorized(context, caller)?)?;
    ensure_batch_size(batch_size, storage_layout::max_batch_size(context)?)?;
    debug!("Batch admitted: caller={:?} size={}", caller, batch_size);
    Ok(guard)
}
