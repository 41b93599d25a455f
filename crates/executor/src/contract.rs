// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{
    abi::{self, IBatchExecutor},
    admin,
    error::{BatchError, Result},
    guard::{self, LockStatus, ReentrancyLock},
    orchestrator::{run_batch, BatchRequest},
    policy::{AllowListPolicy, AuthorizationPolicy, OpenAccess},
    resolver::{
        CallerResolver, DirectCaller, ResolvedCall, TrustedForwarderResolver,
    },
    storage_layout, transfer,
    types::{SubCall, SubCallOutcome},
};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolInterface};
use batch_ledger::{ActionParams, Context, ContractTrait};
use IBatchExecutor::IBatchExecutorCalls as Calls;

/// Which administrative entry points an executor exposes. Selectors of the
/// others are treated like any unknown call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminMode {
    /// No administration at all.
    Immutable,
    /// The owner manages the allow-list and nothing else.
    AllowListOnly,
    /// The full owner surface.
    OwnerControlled,
}

impl AdminMode {
    fn enables(&self, call: &Calls) -> bool {
        match call {
            Calls::addAuthorizedCaller(_)
            | Calls::removeAuthorizedCaller(_) => *self != AdminMode::Immutable,
            Calls::addTrustedForwarder(_)
            | Calls::removeTrustedForwarder(_)
            | Calls::setMaxBatchSize(_)
            | Calls::setMaxGasPerCall(_)
            | Calls::transferOwnership(_)
            | Calls::pause(_)
            | Calls::unpause(_)
            | Calls::emergencyWithdraw(_) => {
                *self == AdminMode::OwnerControlled
            }
            _ => true,
        }
    }
}

/// The batch executor contract, generic over who may submit batches and how
/// the submitter is identified.
pub struct BatchExecutor<A, R> {
    address: Address,
    mode: AdminMode,
    lock: ReentrancyLock,
    policy: A,
    resolver: R,
}

/// Admits allow-listed direct callers.
pub type DirectAccessExecutor = BatchExecutor<AllowListPolicy, DirectCaller>;

/// Admits anyone and honours calls relayed by trusted forwarders.
pub type MetaTxExecutor = BatchExecutor<OpenAccess, TrustedForwarderResolver>;

impl DirectAccessExecutor {
    pub fn direct_access(address: Address, allow_list_mutable: bool) -> Self {
        let mode = if allow_list_mutable {
            AdminMode::AllowListOnly
        } else {
            AdminMode::Immutable
        };
        BatchExecutor::new(address, mode, AllowListPolicy, DirectCaller)
    }
}

impl MetaTxExecutor {
    pub fn meta_tx(address: Address) -> Self {
        BatchExecutor::new(
            address,
            AdminMode::OwnerControlled,
            OpenAccess,
            TrustedForwarderResolver,
        )
    }
}

fn is_batch_entry_point(selector: [u8; 4]) -> bool {
    selector == IBatchExecutor::executeBatchCall::SELECTOR
        || selector == IBatchExecutor::executeBatchWithGasLimitsCall::SELECTOR
        || selector == IBatchExecutor::batchTransferCall::SELECTOR
}

fn into_results(outcomes: Vec<SubCallOutcome>) -> Vec<abi::CallResult> {
    outcomes.into_iter().map(Into::into).collect()
}

impl<A: AuthorizationPolicy, R: CallerResolver> BatchExecutor<A, R> {
    pub fn new(
        address: Address, mode: AdminMode, policy: A, resolver: R,
    ) -> Self {
        BatchExecutor {
            address,
            mode,
            lock: ReentrancyLock::new(),
            policy,
            resolver,
        }
    }

    pub fn mode(&self) -> AdminMode { self.mode }

    pub fn lock_status(&self) -> LockStatus { self.lock.status() }

    /// Receiving value without a call, and unknown calls, just keep the
    /// value.
    fn fallback(
        &self, context: &Context, resolved: &ResolvedCall,
    ) -> Result<Vec<u8>> {
        trace!(
            "Fallback: sender={:?} value={} payload_len={}",
            resolved.effective_caller,
            context.value(),
            resolved.payload.len()
        );
        Ok(Vec::new())
    }

    /// Runs an owner-only operation under the reentrancy lock.
    fn as_owner<F>(
        &self, context: &mut Context, caller: &Address, operation: F,
    ) -> Result<Vec<u8>>
    where F: FnOnce(&mut Context) -> Result<()> {
        let _guard = self.lock.enter()?;
        admin::ensure_owner(context, caller)?;
        operation(context)?;
        Ok(Vec::new())
    }

    fn dispatch(
        &self, params: &ActionParams, context: &mut Context,
    ) -> Result<Bytes> {
        let resolved = self.resolver.resolve(context, &params.data)?;
        let selector = resolved
            .payload
            .get(..4)
            .and_then(|selector| <[u8; 4]>::try_from(selector).ok());
        let selector = match selector {
            Some(selector) if Calls::valid_selector(selector) => selector,
            _ => return self.fallback(context, &resolved).map(Into::into),
        };
        // Paused comes before anything else a batch entry point can report,
        // malformed arguments included.
        if is_batch_entry_point(selector) {
            guard::ensure_not_paused(storage_layout::paused(context)?)?;
        }
        let call = Calls::abi_decode(resolved.payload, true).map_err(|e| {
            debug!("Invalid call data for selector {:?}: {}", selector, e);
            BatchError::InvalidCallData
        })?;
        if !self.mode.enables(&call) {
            return self.fallback(context, &resolved).map(Into::into);
        }

        let caller = resolved.effective_caller;
        let output = match call {
            Calls::executeBatch(call) => {
                let request = BatchRequest {
                    items: call.calls.into_iter().map(SubCall::from).collect(),
                    gas_limits: None,
                    stop_on_failure: call.stopOnFailure,
                };
                let outcomes = run_batch(
                    &self.lock,
                    &self.policy,
                    context,
                    &resolved,
                    request,
                )?;
                IBatchExecutor::executeBatchCall::abi_encode_returns(&(
                    into_results(outcomes),
                ))
            }
            Calls::executeBatchWithGasLimits(call) => {
                let request = BatchRequest {
                    items: call.calls.into_iter().map(SubCall::from).collect(),
                    gas_limits: Some(call.gasLimits),
                    stop_on_failure: call.stopOnFailure,
                };
                let outcomes = run_batch(
                    &self.lock,
                    &self.policy,
                    context,
                    &resolved,
                    request,
                )?;
                IBatchExecutor::executeBatchWithGasLimitsCall
                    ::abi_encode_returns(&(into_results(outcomes),))
            }
            Calls::batchTransfer(call) => {
                let results = transfer::batch_transfer(
                    &self.lock,
                    &self.policy,
                    context,
                    &resolved,
                    &call.recipients,
                    &call.amounts,
                )?;
                IBatchExecutor::batchTransferCall::abi_encode_returns(&(
                    results,
                ))
            }

            Calls::balance(_) => {
                let executor = context.address();
                let balance = context.balance(&executor)?;
                IBatchExecutor::balanceCall::abi_encode_returns(&(balance,))
            }
            Calls::isAuthorized(call) => {
                let authorized =
                    storage_layout::is_authorized(context, &call.account)?;
                IBatchExecutor::isAuthorizedCall::abi_encode_returns(&(
                    authorized,
                ))
            }
            Calls::isTrustedForwarder(call) => {
                let trusted = storage_layout::is_trusted_forwarder(
                    context,
                    &call.forwarder,
                )?;
                IBatchExecutor::isTrustedForwarderCall::abi_encode_returns(&(
                    trusted,
                ))
            }
            Calls::owner(_) => {
                let owner = storage_layout::owner(context)?;
                IBatchExecutor::ownerCall::abi_encode_returns(&(owner,))
            }
            Calls::paused(_) => {
                let paused = storage_layout::paused(context)?;
                IBatchExecutor::pausedCall::abi_encode_returns(&(paused,))
            }
            Calls::batchCounter(_) => {
                let counter = storage_layout::batch_counter(context)?;
                IBatchExecutor::batchCounterCall::abi_encode_returns(&(
                    counter,
                ))
            }
            Calls::batchInitiator(call) => {
                let initiator =
                    storage_layout::batch_initiator(context, &call.batchId)?;
                IBatchExecutor::batchInitiatorCall::abi_encode_returns(&(
                    initiator,
                ))
            }
            Calls::maxBatchSize(_) => {
                let size = storage_layout::max_batch_size(context)?;
                IBatchExecutor::maxBatchSizeCall::abi_encode_returns(&(
                    U256::from(size),
                ))
            }
            Calls::maxGasPerCall(_) => {
                let limit = storage_layout::max_gas_per_call(context)?;
                IBatchExecutor::maxGasPerCallCall::abi_encode_returns(&(
                    U256::from(limit),
                ))
            }

            Calls::addTrustedForwarder(call) => {
                self.as_owner(context, &caller, |context| {
                    admin::set_trusted_forwarder(context, call.forwarder, true)
                })?
            }
            Calls::removeTrustedForwarder(call) => {
                self.as_owner(context, &caller, |context| {
                    admin::set_trusted_forwarder(context, call.forwarder, false)
                })?
            }
            Calls::addAuthorizedCaller(call) => {
                self.as_owner(context, &caller, |context| {
                    admin::set_authorized_caller(context, call.caller, true)
                })?
            }
            Calls::removeAuthorizedCaller(call) => {
                self.as_owner(context, &caller, |context| {
                    admin::set_authorized_caller(context, call.caller, false)
                })?
            }
            Calls::setMaxBatchSize(call) => {
                self.as_owner(context, &caller, |context| {
                    admin::set_max_batch_size(context, call.newSize)
                })?
            }
            Calls::setMaxGasPerCall(call) => {
                self.as_owner(context, &caller, |context| {
                    admin::set_max_gas_per_call(context, call.newLimit)
                })?
            }
            Calls::transferOwnership(call) => {
                self.as_owner(context, &caller, |context| {
                    admin::transfer_ownership(context, call.newOwner)
                })?
            }
            Calls::pause(_) => self.as_owner(context, &caller, |context| {
                admin::set_paused(context, caller, true)
            })?,
            Calls::unpause(_) => self.as_owner(context, &caller, |context| {
                admin::set_paused(context, caller, false)
            })?,
            Calls::emergencyWithdraw(call) => {
                self.as_owner(context, &caller, |context| {
                    admin::emergency_withdraw(context, call.to, call.amount)
                })?
            }
        };
        Ok(output.into())
    }
}

impl<A, R> ContractTrait for BatchExecutor<A, R>
where
    A: AuthorizationPolicy,
    R: CallerResolver,
{
    fn address(&self) -> &Address { &self.address }

    fn execute(
        &self, params: &ActionParams, context: &mut Context,
    ) -> batch_ledger::Result<Bytes> {
        trace!(
            "BatchExecutor::execute(sender={:?}, value={}, data_len={})",
            params.sender,
            params.value,
            params.data.len()
        );
        self.dispatch(params, context).map_err(|e| {
            debug!("BatchExecutor call failed: {}", e);
            e.into()
        })
    }
}
