// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

// Contract execution environment.
use crate::{
    error::{Error, Result},
    spec::Spec,
    stack::{exec_frame, ActionParams, CallStackInfo, RuntimeRes},
    substate::{LogEntry, Substate},
};
use alloy_primitives::{Address, Bytes, LogData, U256};

/// A nested call issued by a running contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRequest {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    /// Upper bound on the gas given to the callee. The callee never gets
    /// more than `Spec::callee_gas_allowance` allows.
    pub gas_limit: Option<u64>,
}

/// The outcome of a nested call as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageCallResult {
    /// The callee returned normally.
    Success(Bytes),
    /// The callee explicitly reverted with the given payload.
    Reverted(Bytes),
    /// The callee trapped or could not be entered.
    Failed(Error),
}

impl MessageCallResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MessageCallResult::Success(_))
    }
}

/// What a running contract can see and do. One `Context` exists per frame.
pub struct Context<'a> {
    address: Address,
    sender: Address,
    value: U256,
    depth: usize,
    gas_left: u64,
    substate: Substate,
    resources: RuntimeRes<'a>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        params: &ActionParams, depth: usize, resources: RuntimeRes<'a>,
    ) -> Self {
        Context {
            address: params.address,
            sender: params.sender,
            value: params.value,
            depth,
            gas_left: params.gas,
            substate: Substate::new(),
            resources,
        }
    }

    pub(crate) fn finish(self) -> (u64, Substate) {
        (self.gas_left, self.substate)
    }

    /// The address of the executing contract.
    pub fn address(&self) -> Address { self.address }

    /// The direct caller of this frame.
    pub fn sender(&self) -> Address { self.sender }

    /// The value attached to this frame.
    pub fn value(&self) -> U256 { self.value }

    pub fn depth(&self) -> usize { self.depth }

    pub fn gas_left(&self) -> u64 { self.gas_left }

    pub fn spec(&self) -> &Spec { self.resources.spec }

    pub fn callstack(&self) -> &CallStackInfo { &*self.resources.callstack }

    pub fn charge_gas(&mut self, amount: u64) -> Result<()> {
        if self.gas_left < amount {
            self.gas_left = 0;
            return Err(Error::OutOfGas);
        }
        self.gas_left -= amount;
        Ok(())
    }

    pub fn balance(&mut self, address: &Address) -> Result<U256> {
        self.charge_gas(self.spec().balance_gas)?;
        Ok(self.resources.state.balance(address))
    }

    /// Reads a slot of the executing contract's storage.
    pub fn storage_at(&mut self, key: &[u8]) -> Result<U256> {
        self.charge_gas(self.spec().sload_gas)?;
        Ok(self.resources.state.storage_at(&self.address, key))
    }

    /// Writes a slot of the executing contract's storage.
    pub fn set_storage(&mut self, key: Vec<u8>, value: U256) -> Result<()> {
        let current = self.resources.state.storage_at(&self.address, &key);
        let cost = if current.is_zero() && !value.is_zero() {
            self.spec().sstore_set_gas
        } else {
            self.spec().sstore_reset_gas
        };
        self.charge_gas(cost)?;
        self.resources.state.set_storage(&self.address, key, value);
        Ok(())
    }

    /// Emits an event from the executing contract.
    pub fn log(&mut self, data: LogData) -> Result<()> {
        let cost = self.spec().log_cost(data.topics().len(), data.data.len());
        self.charge_gas(cost)?;
        self.substate.logs.push(LogEntry {
            address: self.address,
            data,
        });
        Ok(())
    }

    /// Calls another account. Only a failure to pay for the call itself is
    /// reported as an error; whatever happens inside the callee is described
    /// by the returned `MessageCallResult`, and its state changes are already
    /// reverted if it did not succeed.
    pub fn call(&mut self, request: CallRequest) -> Result<MessageCallResult> {
        let transfers_value = !request.value.is_zero();
        let mut cost = self.spec().call_gas;
        if transfers_value {
            cost += self.spec().call_value_transfer_gas;
        }
        self.charge_gas(cost)?;

        if self.depth + 1 >= self.spec().max_depth {
            debug!("Call depth limit reached: depth={}", self.depth);
            return Ok(MessageCallResult::Failed(Error::DepthLimit));
        }

        let allowance = self.spec().callee_gas_allowance(self.gas_left);
        let callee_gas = request
            .gas_limit
            .map_or(allowance, |limit| limit.min(allowance));
        self.gas_left -= callee_gas;
        let stipend = if transfers_value {
            self.spec().call_stipend
        } else {
            0
        };

        let params = ActionParams {
            sender: self.address,
            address: request.to,
            value: request.value,
            data: request.data,
            gas: callee_gas + stipend,
        };
        let frame =
            exec_frame(&params, self.depth + 1, self.resources.reborrow());
        self.gas_left += frame.gas_left;

        Ok(match frame.result {
            Ok(output) => {
                if let Some(child) = frame.substate {
                    self.substate.accrue(child);
                }
                MessageCallResult::Success(output)
            }
            Err(Error::Reverted(data)) => MessageCallResult::Reverted(data),
            Err(e) => MessageCallResult::Failed(e),
        })
    }
}
