// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::*;
use crate::{
    contract::{AdminMode, BatchExecutor},
    error::BatchError,
    guard::LockStatus,
    policy::AllowListPolicy,
    resolver::DirectCaller,
    storage_layout::{self, InitialState},
};

#[test]
fn test_all_required_calls_succeed() {
    let (mut env, executor) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(
            vec![
                item(target(1), 0, b"one", true),
                item(target(2), 0, b"two", true),
            ],
            false,
        ),
    );

    let results = batch_results(&outcome);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success));
    assert_eq!(results[0].returnData, Bytes::from_static(b"one"));
    assert_eq!(results[1].returnData, Bytes::from_static(b"two"));
    assert!(results.iter().all(|r| r.gasUsed > U256::ZERO));

    assert_eq!(env.view().batch_counter(), U256::from(1));
    assert_eq!(env.view().batch_initiator(1), deployer());
    assert_eq!(env.target_calls(1), U256::from(1));
    assert_eq!(env.target_calls(2), U256::from(1));
    assert_eq!(executor.lock_status(), LockStatus::Idle);

    let executed = events::<IBatchExecutor::CallExecuted>(&outcome);
    assert_eq!(executed.len(), 2);
    assert_eq!(executed[1].index, U256::from(1));
    assert_eq!(executed[1].target, target(2));
    assert_eq!(executed[1].gasUsed, results[1].gasUsed);
    let batch = events::<IBatchExecutor::BatchExecuted>(&outcome);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].executor, deployer());
    assert_eq!(batch[0].batchId, U256::from(1));
    assert_eq!(batch[0].successCount, U256::from(2));
    assert_eq!(batch[0].totalCount, U256::from(2));
    let relayed = events::<IBatchExecutor::MetaTransactionExecuted>(&outcome);
    assert!(relayed.is_empty());
}

#[test]
fn test_tolerated_failure() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(
            vec![
                item(target(1), 0, b"", false),
                item(target(2), 0, b"fail", false),
                item(target(3), 0, b"", false),
            ],
            false,
        ),
    );

    let results = batch_results(&outcome);
    assert_eq!(
        results.iter().map(|r| r.success).collect::<Vec<_>>(),
        vec![true, false, true]
    );
    assert_eq!(
        FailureReason::from_revert_data(&results[1].returnData),
        FailureReason::Structured("target failed".into())
    );
    // The failed call's own effects are gone, the others stay.
    assert_eq!(env.target_calls(1), U256::from(1));
    assert_eq!(env.target_calls(2), U256::ZERO);
    assert_eq!(env.target_calls(3), U256::from(1));

    let batch = events::<IBatchExecutor::BatchExecuted>(&outcome);
    assert_eq!(batch[0].successCount, U256::from(2));
    assert_eq!(batch[0].totalCount, U256::from(3));
}

#[test]
fn test_required_failure_aborts() {
    let (mut env, executor) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(vec![item(target(1), 0, b"fail", true)], false),
    );

    assert_reverted_with(&outcome, "Call 0 failed: target failed");
    assert!(outcome.logs.is_empty());
    assert_eq!(env.view().batch_counter(), U256::ZERO);
    assert_eq!(env.view().batch_initiator(1), Address::ZERO);
    assert_eq!(executor.lock_status(), LockStatus::Idle);
}

#[test]
fn test_abort_rolls_back_earlier_calls() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let before = env.balance(deployer());
    let outcome = env.send(
        deployer(),
        500,
        execute_batch(
            vec![
                item(target(1), 100, b"", true),
                item(get_test_address(0x55), 200, b"", false),
                item(target(2), 0, b"fail", true),
            ],
            false,
        ),
    );

    assert_reverted_with(&outcome, "Call 2 failed: target failed");
    assert_eq!(env.target_calls(1), U256::ZERO);
    assert_eq!(env.balance(target(1)), U256::ZERO);
    assert_eq!(env.balance(get_test_address(0x55)), U256::ZERO);
    assert_eq!(env.balance(executor_address()), U256::ZERO);
    assert_eq!(env.balance(deployer()), before);
}

#[test]
fn test_stop_on_failure() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(
            vec![
                item(target(1), 0, b"", false),
                item(target(2), 0, b"fail", false),
                item(target(3), 0, b"", false),
            ],
            true,
        ),
    );

    assert_reverted_with(&outcome, "Call 1 failed: target failed");
    assert_eq!(env.target_calls(1), U256::ZERO);
    assert_eq!(env.target_calls(3), U256::ZERO);
    assert_eq!(env.view().batch_counter(), U256::ZERO);
}

#[test]
fn test_unstructured_failures() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(
            vec![
                item(target(1), 0, b"raw", false),
                item(target(2), 0, b"trap", false),
            ],
            false,
        ),
    );
    let results = batch_results(&outcome);
    assert_eq!(
        FailureReason::from_revert_data(&results[0].returnData),
        FailureReason::Raw(Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]))
    );
    assert!(results[1].returnData.is_empty());

    let outcome = env.send(
        deployer(),
        0,
        execute_batch(vec![item(target(1), 0, b"raw", true)], false),
    );
    assert_reverted_with(
        &outcome,
        "Call 0 failed: low-level call failed (0xdeadbeef)",
    );

    let outcome = env.send(
        deployer(),
        0,
        execute_batch(vec![item(target(1), 0, b"trap", true)], false),
    );
    assert_reverted_with(&outcome, "Call 0 failed: low-level call failed");
}

#[test]
fn test_empty_item_is_dispatched() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(
            vec![
                item(target(1), 0, b"", true),
                item(get_test_address(0x66), 0, b"", true),
            ],
            false,
        ),
    );
    let results = batch_results(&outcome);
    assert!(results.iter().all(|r| r.success));
    assert_eq!(env.target_calls(1), U256::from(1));
}

#[test]
fn test_value_and_refund() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let before = env.balance(deployer());
    let outcome = env.send(
        deployer(),
        1_000,
        execute_batch(
            vec![
                item(target(1), 100, b"", true),
                item(get_test_address(0x55), 200, b"", true),
                item(target(2), 300, b"fail", false),
            ],
            false,
        ),
    );
    batch_results(&outcome);

    assert_eq!(env.balance(target(1)), U256::from(100));
    assert_eq!(env.balance(get_test_address(0x55)), U256::from(200));
    assert_eq!(env.balance(target(2)), U256::ZERO);
    // The value of the failed call stays with the executor; the rest of
    // what was not spent goes back.
    assert_eq!(env.balance(executor_address()), U256::from(300));
    assert_eq!(env.balance(deployer()), before - U256::from(600));
}

#[test]
fn test_insufficient_funds() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        299,
        execute_batch(
            vec![
                item(target(1), 100, b"", true),
                item(target(2), 200, b"", true),
            ],
            false,
        ),
    );
    assert_reverted_with(
        &outcome,
        &BatchError::InsufficientFunds {
            required: U256::from(300),
            attached: U256::from(299),
        }
        .to_string(),
    );
    assert_eq!(env.target_calls(1), U256::ZERO);
}

#[test]
fn test_value_overflow() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let mut calls = vec![
        item(target(1), 0, b"", true),
        item(target(2), 0, b"", true),
    ];
    calls[0].value = U256::MAX;
    calls[1].value = U256::from(1);
    let outcome = env.send(deployer(), 0, execute_batch(calls, false));
    assert_reverted_with(&outcome, "Total value overflow");
}

#[test]
fn test_batch_size_limits() {
    let (mut env, _) = Env::direct(ExecutorConfig {
        max_batch_size: 3,
        ..Default::default()
    });
    let outcome = env.send(deployer(), 0, execute_batch(vec![], false));
    assert_reverted_with(
        &outcome,
        "Invalid batch size 0. Size must be within [1, 3].",
    );

    let calls = (0..4).map(|_| item(target(1), 0, b"", false)).collect();
    let outcome = env.send(deployer(), 0, execute_batch(calls, false));
    assert_reverted_with(
        &outcome,
        "Invalid batch size 4. Size must be within [1, 3].",
    );

    let calls = (0..3).map(|_| item(target(1), 0, b"", false)).collect();
    let outcome = env.send(deployer(), 0, execute_batch(calls, false));
    assert_eq!(batch_results(&outcome).len(), 3);
    assert_eq!(env.view().batch_counter(), U256::from(1));
}

#[test]
fn test_zero_target() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(
            vec![
                item(target(1), 0, b"", false),
                item(Address::ZERO, 0, b"", false),
            ],
            false,
        ),
    );
    assert_reverted_with(&outcome, "Invalid target address for call 1");
    assert_eq!(env.target_calls(1), U256::ZERO);
}

#[test]
fn test_unauthorized_caller() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let stranger = get_test_address(0x77);
    env.fund(stranger, 1_000);
    let outcome = env.send(
        stranger,
        0,
        execute_batch(vec![item(target(1), 0, b"", true)], false),
    );
    let unauthorized = BatchError::Unauthorized(stranger).to_string();
    assert_reverted_with(&outcome, &unauthorized);
    assert_eq!(env.target_calls(1), U256::ZERO);
}

#[test]
fn test_configured_callers_are_authorized() {
    let caller = get_test_address(0x77);
    let (mut env, _) = Env::direct(ExecutorConfig {
        authorized_callers: vec![caller],
        ..Default::default()
    });
    env.fund(caller, 1_000);
    let outcome = env.send(
        caller,
        0,
        execute_batch(vec![item(target(1), 0, b"", true)], false),
    );
    assert_eq!(batch_results(&outcome).len(), 1);
    assert_eq!(env.view().batch_initiator(1), caller);
}

/// A direct-access executor with the full owner surface, so that it can be
/// paused.
fn pausable_direct_env() -> Env {
    let mut env = Env::new();
    storage_layout::initialize(
        env.ledger.state_mut(),
        &executor_address(),
        &InitialState {
            owner: deployer(),
            max_batch_size: 50,
            max_gas_per_call: 5_000_000,
            authorized_callers: vec![deployer()],
            trusted_forwarders: vec![],
        },
    );
    env.deploy(Arc::new(BatchExecutor::new(
        executor_address(),
        AdminMode::OwnerControlled,
        AllowListPolicy,
        DirectCaller,
    )));
    env
}

#[test]
fn test_admission_order() {
    let mut env = pausable_direct_env();
    let stranger = get_test_address(0x77);
    env.fund(stranger, 1_000);
    let pause = IBatchExecutor::pauseCall {}.abi_encode();
    assert!(env.send(deployer(), 0, pause).is_success());

    // Paused beats everything.
    let outcome = env.send(stranger, 0, execute_batch(vec![], false));
    assert_reverted_with(&outcome, "Batch execution is paused");

    let unpause = IBatchExecutor::unpauseCall {}.abi_encode();
    assert!(env.send(deployer(), 0, unpause).is_success());

    // Then authorization, then the batch size.
    let outcome = env.send(stranger, 0, execute_batch(vec![], false));
    let unauthorized = BatchError::Unauthorized(stranger).to_string();
    assert_reverted_with(&outcome, &unauthorized);
    let outcome = env.send(deployer(), 0, execute_batch(vec![], false));
    assert_reverted_with(
        &outcome,
        "Invalid batch size 0. Size must be within [1, 50].",
    );
}

#[test]
fn test_paused_before_call_data_checks() {
    let (mut env, _) = Env::meta(ExecutorConfig::default());
    let pause = IBatchExecutor::pauseCall {}.abi_encode();
    assert!(env.send(deployer(), 0, pause).is_success());

    let malformed = [
        IBatchExecutor::executeBatchCall::SELECTOR,
        IBatchExecutor::executeBatchWithGasLimitsCall::SELECTOR,
        IBatchExecutor::batchTransferCall::SELECTOR,
    ]
    .map(|selector| {
        let mut data = selector.to_vec();
        data.extend_from_slice(&[0u8; 7]);
        data
    });
    for data in &malformed {
        let outcome = env.send(deployer(), 0, data.clone());
        assert_reverted_with(&outcome, "Batch execution is paused");
    }

    let unpause = IBatchExecutor::unpauseCall {}.abi_encode();
    assert!(env.send(deployer(), 0, unpause).is_success());
    for data in malformed {
        let outcome = env.send(deployer(), 0, data);
        assert_reverted_with(&outcome, "Invalid call data");
    }
}

#[test]
fn test_paused_batch_does_nothing() {
    let (mut env, _) = Env::meta(ExecutorConfig::default());
    let pause = IBatchExecutor::pauseCall {}.abi_encode();
    assert!(env.send(deployer(), 0, pause).is_success());
    assert!(env.view().paused());

    let before = env.balance(deployer());
    let outcome = env.send(
        deployer(),
        100,
        execute_batch(vec![item(target(1), 100, b"", true)], false),
    );
    assert_reverted_with(&outcome, "Batch execution is paused");
    assert_eq!(env.view().batch_counter(), U256::ZERO);
    assert_eq!(env.target_calls(1), U256::ZERO);
    assert_eq!(env.balance(deployer()), before);
}

#[test]
fn test_gas_limits() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        0,
        execute_batch_with_gas_limits(
            vec![
                item(target(1), 0, b"", true),
                item(target(2), 0, b"burn", false),
            ],
            vec![100_000, 60_000],
            false,
        ),
    );
    assert!(outcome.is_success());
    let results =
        IBatchExecutor::executeBatchWithGasLimitsCall::abi_decode_returns(
            outcome.output().unwrap(),
            true,
        )
        .unwrap()
        .results;
    assert!(results[0].success);
    assert!(!results[1].success);
    // The burner took all it was allowed and not much more.
    assert!(results[1].gasUsed >= U256::from(60_000));
    assert!(results[1].gasUsed < U256::from(100_000));
    assert_eq!(env.target_calls(2), U256::ZERO);
}

#[test]
fn test_gas_limit_errors() {
    let (mut env, _) = Env::direct(ExecutorConfig {
        max_gas_per_call: 1_000_000,
        ..Default::default()
    });
    let outcome = env.send(
        deployer(),
        0,
        execute_batch_with_gas_limits(
            vec![item(target(1), 0, b"", true), item(target(2), 0, b"", true)],
            vec![100_000],
            false,
        ),
    );
    assert_reverted_with(&outcome, "Array length mismatch: 2 calls, 1 entries");

    let outcome = env.send(
        deployer(),
        0,
        execute_batch_with_gas_limits(
            vec![item(target(1), 0, b"", true), item(target(2), 0, b"", true)],
            vec![100_000, 1_000_001],
            false,
        ),
    );
    assert_reverted_with(
        &outcome,
        "Gas limit 1000001 of call 1 exceeds maximum 1000000",
    );
    assert_eq!(env.target_calls(1), U256::ZERO);
}

#[test]
fn test_out_of_gas_call_without_cap() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(
            vec![
                item(target(1), 0, b"burn", false),
                item(target(2), 0, b"", true),
            ],
            false,
        ),
    );
    let results = batch_results(&outcome);
    assert!(!results[0].success);
    assert!(results[0].returnData.is_empty());
    assert!(results[1].success);
}

#[test]
fn test_batch_ids_are_sequential() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    for expected in 1..=3u64 {
        let outcome = env.send(
            deployer(),
            0,
            execute_batch(vec![item(target(1), 0, b"fail", false)], false),
        );
        let batch = events::<IBatchExecutor::BatchExecuted>(&outcome);
        assert_eq!(batch[0].batchId, U256::from(expected));
        assert_eq!(batch[0].successCount, U256::ZERO);
    }
    // Rejected and aborted batches consume nothing.
    env.send(deployer(), 0, execute_batch(vec![], false));
    env.send(
        deployer(),
        0,
        execute_batch(vec![item(target(1), 0, b"fail", true)], false),
    );
    assert_eq!(env.view().batch_counter(), U256::from(3));

    let counter = env.view_call(IBatchExecutor::batchCounterCall {});
    assert_eq!(counter.counter, U256::from(3));
    let initiator = env.view_call(IBatchExecutor::batchInitiatorCall {
        batchId: U256::from(2),
    });
    assert_eq!(initiator.initiator, deployer());
}

#[test]
fn test_reentrant_batch_is_rejected() {
    let (mut env, executor) = Env::direct(ExecutorConfig::default());
    let reenterer = get_test_address(0xbb);
    env.deploy(Arc::new(Reenterer {
        address: reenterer,
        payload: execute_batch(vec![item(target(1), 0, b"", true)], false)
            .into(),
    }));

    let outcome = env.send(
        deployer(),
        0,
        execute_batch(
            vec![item(reenterer, 0, b"", true), item(target(2), 0, b"", true)],
            false,
        ),
    );
    let results = batch_results(&outcome);
    assert!(results.iter().all(|r| r.success));
    assert_eq!(env.ledger.storage_at(&reenterer, b"reentry"), U256::from(1));
    assert_eq!(env.target_calls(1), U256::ZERO);
    assert_eq!(env.target_calls(2), U256::from(1));
    assert_eq!(env.view().batch_counter(), U256::from(1));
    assert_eq!(executor.lock_status(), LockStatus::Idle);
}

#[test]
fn test_reentrant_transfer_is_rejected() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let reenterer = get_test_address(0xbb);
    env.deploy(Arc::new(Reenterer {
        address: reenterer,
        payload: batch_transfer(vec![target(1)], vec![0]).into(),
    }));
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(vec![item(reenterer, 0, b"", true)], false),
    );
    batch_results(&outcome);
    assert_eq!(env.ledger.storage_at(&reenterer, b"reentry"), U256::from(1));
}

#[test]
fn test_reentrant_admin_call_is_rejected() {
    let (mut env, executor) = Env::meta(ExecutorConfig::default());
    assert!(env.send(deployer(), 500, vec![]).is_success());
    let admin_calls = [
        IBatchExecutor::pauseCall {}.abi_encode(),
        IBatchExecutor::emergencyWithdrawCall {
            to: get_test_address(0xbc),
            amount: U256::from(100),
        }
        .abi_encode(),
    ];
    for (n, payload) in admin_calls.into_iter().enumerate() {
        let reenterer = get_test_address(0xb0 + n as u8);
        env.deploy(Arc::new(Reenterer {
            address: reenterer,
            payload: payload.into(),
        }));
        let outcome = env.send(
            deployer(),
            0,
            execute_batch(vec![item(reenterer, 0, b"", true)], false),
        );
        batch_results(&outcome);
        assert_eq!(
            env.ledger.storage_at(&reenterer, b"reentry"),
            U256::from(1)
        );
    }
    assert!(!env.view().paused());
    assert_eq!(env.balance(executor_address()), U256::from(500));
    assert_eq!(env.balance(get_test_address(0xbc)), U256::ZERO);
    assert_eq!(executor.lock_status(), LockStatus::Idle);
}

#[test]
fn test_views_during_batch() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let reenterer = get_test_address(0xbb);
    env.deploy(Arc::new(Reenterer {
        address: reenterer,
        payload: IBatchExecutor::batchCounterCall {}.abi_encode().into(),
    }));
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(vec![item(reenterer, 0, b"", true)], false),
    );
    batch_results(&outcome);
    assert_eq!(env.ledger.storage_at(&reenterer, b"reentry"), U256::from(2));
}

#[test]
fn test_lock_released_after_abort() {
    let (mut env, executor) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(
        deployer(),
        0,
        execute_batch(vec![item(target(1), 0, b"fail", true)], false),
    );
    assert!(!outcome.is_success());
    assert_eq!(executor.lock_status(), LockStatus::Idle);

    let outcome = env.send(
        deployer(),
        0,
        execute_batch(vec![item(target(1), 0, b"", true)], false),
    );
    assert_eq!(batch_results(&outcome).len(), 1);
}

#[test]
fn test_executor_out_of_gas_traps() {
    let (mut env, executor) = Env::direct(ExecutorConfig::default());
    let outcome = env.ledger.transact(&Transaction {
        sender: deployer(),
        to: executor_address(),
        value: U256::ZERO,
        data: execute_batch(vec![item(target(1), 0, b"", true)], false).into(),
        gas_limit: 22_000,
    });
    assert_eq!(outcome.result, Err(Error::OutOfGas));
    assert_eq!(outcome.gas_used, 22_000);
    assert_eq!(executor.lock_status(), LockStatus::Idle);
}

#[test]
fn test_receive_and_fallback() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let outcome = env.send(deployer(), 250, vec![]);
    assert!(outcome.is_success());
    let outcome = env.send(deployer(), 50, vec![0x12, 0x34, 0x56, 0x78, 0x9a]);
    assert!(outcome.is_success());
    let outcome = env.send(deployer(), 0, vec![0x01]);
    assert!(outcome.is_success());
    assert_eq!(env.balance(executor_address()), U256::from(300));

    let balance = env.view_call(IBatchExecutor::balanceCall {});
    assert_eq!(balance.amount, U256::from(300));
}

#[test]
fn test_invalid_call_data() {
    let (mut env, _) = Env::direct(ExecutorConfig::default());
    let mut data = IBatchExecutor::executeBatchCall::SELECTOR.to_vec();
    data.extend_from_slice(&[0xff; 7]);
    let outcome = env.send(deployer(), 0, data);
    assert_reverted_with(&outcome, "Invalid call data");
}
