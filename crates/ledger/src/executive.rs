// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{
    contract::{ContractMap, ContractTrait},
    error::{Error, Result},
    spec::Spec,
    stack::{exec_frame, ActionParams, CallStackInfo, RuntimeRes},
    state::State,
    substate::LogEntry,
};
use alloy_primitives::{Address, Bytes, U256};
use std::sync::Arc;

/// A top-level transaction submitted to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub sender: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
}

/// The result of executing a transaction.
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// The output of the called contract, or why the transaction failed.
    pub result: Result<Bytes>,
    pub gas_used: u64,
    /// Logs emitted by the transaction. Empty if it failed.
    pub logs: Vec<LogEntry>,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool { self.result.is_ok() }

    pub fn output(&self) -> Option<&Bytes> { self.result.as_ref().ok() }

    /// The revert payload of a failed transaction. Empty on success and for
    /// failures other than an explicit revert.
    pub fn revert_data(&self) -> Bytes {
        match &self.result {
            Ok(_) => Bytes::new(),
            Err(e) => e.revert_data(),
        }
    }
}

/// The ledger: its state, the contracts deployed on it and the gas schedule.
#[derive(Default)]
pub struct Ledger {
    state: State,
    contracts: ContractMap,
    spec: Spec,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    pub fn with_spec(spec: Spec) -> Self {
        Ledger {
            spec,
            ..Default::default()
        }
    }

    pub fn spec(&self) -> &Spec { &self.spec }

    pub fn state(&self) -> &State { &self.state }

    /// Direct state access, for genesis-style initialization.
    pub fn state_mut(&mut self) -> &mut State { &mut self.state }

    pub fn contracts(&self) -> &ContractMap { &self.contracts }

    /// Makes `contract` callable at its address.
    pub fn deploy(&mut self, contract: Arc<dyn ContractTrait>) {
        info!("Deploy contract at {:?}", contract.address());
        self.contracts.insert(contract);
    }

    pub fn balance(&self, address: &Address) -> U256 {
        self.state.balance(address)
    }

    /// Credits `amount` to `address` out of thin air.
    pub fn mint(&mut self, address: &Address, amount: U256) -> Result<()> {
        self.state.add_balance(address, &amount)
    }

    pub fn storage_at(&self, address: &Address, key: &[u8]) -> U256 {
        self.state.storage_at(address, key)
    }

    /// Executes `tx` atomically: either every effect of the call tree is
    /// kept, or none is.
    pub fn transact(&mut self, tx: &Transaction) -> ExecutionOutcome {
        if tx.gas_limit < self.spec.tx_gas {
            return ExecutionOutcome {
                result: Err(Error::OutOfGas),
                gas_used: tx.gas_limit,
                logs: Vec::new(),
            };
        }
        let params = ActionParams {
            sender: tx.sender,
            address: tx.to,
            value: tx.value,
            data: tx.data.clone(),
            gas: tx.gas_limit - self.spec.tx_gas,
        };

        let mut callstack = CallStackInfo::new();
        let resources = RuntimeRes {
            state: &mut self.state,
            callstack: &mut callstack,
            contracts: &self.contracts,
            spec: &self.spec,
        };
        let frame = exec_frame(&params, 0, resources);
        debug_assert_eq!(self.state.checkpoint_depth(), 0);

        // Stipends never make a frame gain gas overall.
        let gas_used = tx.gas_limit - frame.gas_left.min(params.gas);
        let logs = frame.substate.map(|s| s.logs).unwrap_or_default();
        trace!(
            "Transaction executed: success={} gas_used={} logs={}",
            frame.result.is_ok(),
            gas_used,
            logs.len()
        );
        ExecutionOutcome {
            result: frame.result,
            gas_used,
            logs,
        }
    }
}
