// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

mod batch;

use crate::{
    abi::{self, IBatchExecutor},
    config::{deploy_direct_access, deploy_meta_tx, ExecutorConfig},
    contract::{DirectAccessExecutor, MetaTxExecutor},
    storage_layout::ExecutorView,
    types::FailureReason,
};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{
    GenericContractError, Revert, SolCall, SolEvent, SolInterface,
};
use batch_ledger::{
    ActionParams, CallRequest, Context, ContractTrait, Error, ExecutionOutcome,
    Ledger, MessageCallResult, Result, Transaction,
};
use std::sync::Arc;

pub const GAS: u64 = 10_000_000;
pub const INITIAL_FUNDS: u64 = 1_000_000_000;

pub fn get_test_address(n: u8) -> Address { Address::repeat_byte(n) }

pub fn deployer() -> Address { get_test_address(0x01) }

pub fn executor_address() -> Address { get_test_address(0xee) }

/// Addresses of the `Target` contracts every environment starts with.
pub fn target(n: u8) -> Address { get_test_address(0xa0 + n) }

/// Counts its calls and echoes its input. Some inputs make it fail:
/// `fail` reverts with a reason, `raw` reverts with a bare payload, `trap`
/// traps and `burn` runs out of gas.
pub struct Target {
    address: Address,
}

impl ContractTrait for Target {
    fn address(&self) -> &Address { &self.address }

    fn execute(
        &self, params: &ActionParams, context: &mut Context,
    ) -> Result<Bytes> {
        let calls = context.storage_at(b"calls")? + U256::from(1);
        context.set_storage(b"calls".to_vec(), calls)?;
        match params.data.as_ref() {
            b"fail" => {
                let revert = GenericContractError::Revert(Revert {
                    reason: "target failed".into(),
                });
                Err(Error::Reverted(revert.abi_encode().into()))
            }
            b"raw" => Err(Error::Reverted(Bytes::from_static(&[
                0xde, 0xad, 0xbe, 0xef,
            ]))),
            b"trap" => Err("trap".into()),
            b"burn" => loop {
                context.charge_gas(10_000)?;
            },
            _ => Ok(params.data.clone()),
        }
    }
}

/// Calls the executor back with `payload` and records how that went under
/// `reentry`: 1 for a `Reentrant call` rejection, 2 for success, 3 for
/// anything else.
pub struct Reenterer {
    pub address: Address,
    pub payload: Bytes,
}

impl ContractTrait for Reenterer {
    fn address(&self) -> &Address { &self.address }

    fn execute(
        &self, _params: &ActionParams, context: &mut Context,
    ) -> Result<Bytes> {
        let result = context.call(CallRequest {
            to: executor_address(),
            value: U256::ZERO,
            data: self.payload.clone(),
            gas_limit: None,
        })?;
        let code = match result {
            MessageCallResult::Success(_) => 2,
            MessageCallResult::Reverted(data)
                if FailureReason::from_revert_data(&data)
                    == FailureReason::Structured("Reentrant call".into()) =>
            {
                1
            }
            _ => 3,
        };
        context.set_storage(b"reentry".to_vec(), U256::from(code))?;
        Ok(Bytes::new())
    }
}

/// Forwards its input and value to the executor and relays the result back.
/// With `reject_refunds`, value sent back by the executor is refused.
pub struct Relay {
    pub address: Address,
    pub reject_refunds: bool,
}

impl ContractTrait for Relay {
    fn address(&self) -> &Address { &self.address }

    fn execute(
        &self, params: &ActionParams, context: &mut Context,
    ) -> Result<Bytes> {
        if params.sender == executor_address() && params.data.is_empty() {
            if self.reject_refunds {
                return Err(Error::Reverted(Bytes::new()));
            }
            return Ok(Bytes::new());
        }
        match context.call(CallRequest {
            to: executor_address(),
            value: params.value,
            data: params.data.clone(),
            gas_limit: None,
        })? {
            MessageCallResult::Success(output) => Ok(output),
            MessageCallResult::Reverted(data) => Err(Error::Reverted(data)),
            MessageCallResult::Failed(e) => Err(e),
        }
    }
}

pub struct Env {
    pub ledger: Ledger,
}

impl Env {
    /// A ledger with a funded deployer and three `Target` contracts.
    pub fn new() -> Self {
        let mut ledger = Ledger::new();
        ledger
            .mint(&deployer(), U256::from(INITIAL_FUNDS))
            .unwrap();
        for n in 1..=3 {
            ledger.deploy(Arc::new(Target { address: target(n) }));
        }
        Env { ledger }
    }

    pub fn direct(config: ExecutorConfig) -> (Self, Arc<DirectAccessExecutor>) {
        let mut env = Env::new();
        let executor = deploy_direct_access(
            &mut env.ledger,
            executor_address(),
            deployer(),
            &config,
        )
        .unwrap();
        (env, executor)
    }

    pub fn meta(config: ExecutorConfig) -> (Self, Arc<MetaTxExecutor>) {
        let mut env = Env::new();
        let executor = deploy_meta_tx(
            &mut env.ledger,
            executor_address(),
            deployer(),
            &config,
        )
        .unwrap();
        (env, executor)
    }

    pub fn fund(&mut self, account: Address, amount: u64) {
        self.ledger.mint(&account, U256::from(amount)).unwrap();
    }

    pub fn deploy(&mut self, contract: Arc<dyn ContractTrait>) {
        self.ledger.deploy(contract);
    }

    pub fn transact(
        &mut self, from: Address, to: Address, value: u64, data: Vec<u8>,
    ) -> ExecutionOutcome {
        self.ledger.transact(&Transaction {
            sender: from,
            to,
            value: U256::from(value),
            data: data.into(),
            gas_limit: GAS,
        })
    }

    /// Calls the executor.
    pub fn send(
        &mut self, from: Address, value: u64, data: Vec<u8>,
    ) -> ExecutionOutcome {
        self.transact(from, executor_address(), value, data)
    }

    /// Calls a view of the executor and decodes its return value.
    pub fn view_call<C: SolCall>(&mut self, call: C) -> C::Return {
        let outcome = self.send(deployer(), 0, call.abi_encode());
        C::abi_decode_returns(outcome.output().unwrap(), true).unwrap()
    }

    pub fn view(&self) -> ExecutorView<'_> {
        ExecutorView::new(self.ledger.state(), executor_address())
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.ledger.balance(&account)
    }

    /// How often `Target` `n` has been called, as far as the ledger knows.
    pub fn target_calls(&self, n: u8) -> U256 {
        self.ledger.storage_at(&target(n), b"calls")
    }
}

pub fn item(
    target: Address, value: u64, data: &[u8], require_success: bool,
) -> abi::Call {
    abi::Call {
        target,
        value: U256::from(value),
        data: Bytes::copy_from_slice(data),
        requireSuccess: require_success,
    }
}

pub fn execute_batch(calls: Vec<abi::Call>, stop_on_failure: bool) -> Vec<u8> {
    IBatchExecutor::executeBatchCall {
        calls,
        stopOnFailure: stop_on_failure,
    }
    .abi_encode()
}

pub fn execute_batch_with_gas_limits(
    calls: Vec<abi::Call>, gas_limits: Vec<u64>, stop_on_failure: bool,
) -> Vec<u8> {
    IBatchExecutor::executeBatchWithGasLimitsCall {
        calls,
        gasLimits: gas_limits.into_iter().map(U256::from).collect(),
        stopOnFailure: stop_on_failure,
    }
    .abi_encode()
}

pub fn batch_transfer(recipients: Vec<Address>, amounts: Vec<u64>) -> Vec<u8> {
    IBatchExecutor::batchTransferCall {
        recipients,
        amounts: amounts.into_iter().map(U256::from).collect(),
    }
    .abi_encode()
}

pub fn batch_results(outcome: &ExecutionOutcome) -> Vec<abi::CallResult> {
    assert!(
        outcome.is_success(),
        "batch failed: {:?}",
        revert_reason(outcome)
    );
    let output = outcome.output().unwrap();
    IBatchExecutor::executeBatchCall::abi_decode_returns(output, true)
        .unwrap()
        .results
}

pub fn transfer_results(outcome: &ExecutionOutcome) -> Vec<bool> {
    assert!(
        outcome.is_success(),
        "transfer failed: {:?}",
        revert_reason(outcome)
    );
    let output = outcome.output().unwrap();
    IBatchExecutor::batchTransferCall::abi_decode_returns(output, true)
        .unwrap()
        .results
}

pub fn revert_reason(outcome: &ExecutionOutcome) -> FailureReason {
    FailureReason::from_revert_data(&outcome.revert_data())
}

pub fn assert_reverted_with(outcome: &ExecutionOutcome, reason: &str) {
    assert!(!outcome.is_success());
    assert_eq!(
        revert_reason(outcome),
        FailureReason::Structured(reason.into())
    );
}

pub fn events<E: SolEvent>(outcome: &ExecutionOutcome) -> Vec<E> {
    outcome
        .logs
        .iter()
        .filter(|log| log.data.topics().first() == Some(&E::SIGNATURE_HASH))
        .map(|log| E::decode_log_data(&log.data, true).unwrap())
        .collect()
}
