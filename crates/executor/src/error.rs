// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::types::FailureReason;
use alloy_primitives::{Address, U256};
use alloy_sol_types::{GenericContractError, Revert, SolInterface};
use batch_ledger::Error as VmError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("Batch execution is paused")]
    Paused,

    #[error("Reentrant call")]
    Reentrant,

    #[error("Caller {0} is not authorized")]
    Unauthorized(Address),

    #[error("Invalid batch size {size}. Size must be within [1, {max}].")]
    InvalidBatchSize { size: usize, max: u64 },

    #[error("Array length mismatch: {expected} calls, {got} entries")]
    ArityMismatch { expected: usize, got: usize },

    #[error("Gas limit {limit} of call {index} exceeds maximum {max}")]
    ResourceCapTooHigh { index: usize, limit: U256, max: u64 },

    #[error("Insufficient value: required {required}, attached {attached}")]
    InsufficientFunds { required: U256, attached: U256 },

    #[error("Invalid target address for call {index}")]
    InvalidTarget { index: usize },

    #[error("Total value overflow")]
    ValueOverflow,

    #[error("Call {index} failed: {reason}")]
    CallFailed { index: usize, reason: FailureReason },

    #[error("Refund of {amount} to {recipient} failed")]
    RefundFailed { recipient: Address, amount: U256 },

    #[error("Caller is not the owner")]
    NotOwner,

    #[error("Invalid address")]
    InvalidAddress,

    #[error("Invalid max batch size {0}")]
    InvalidMaxBatchSize(U256),

    #[error("Invalid gas limit {0}")]
    InvalidGasLimit(U256),

    #[error(
        "Insufficient balance: requested {requested}, \
         available {available}"
    )]
    InsufficientBalance { requested: U256, available: U256 },

    #[error("Withdrawal failed")]
    WithdrawalFailed,

    #[error("Invalid call data")]
    InvalidCallData,

    #[error(transparent)]
    Vm(#[from] VmError),
}

pub type Result<T> = std::result::Result<T, BatchError>;

impl From<BatchError> for VmError {
    /// Vm errors keep their meaning. Everything else reverts with an
    /// `Error(string)` payload carrying the message.
    fn from(e: BatchError) -> Self {
        match e {
            BatchError::Vm(e) => e,
            e => {
                let revert = GenericContractError::Revert(Revert {
                    reason: e.to_string(),
                });
                VmError::Reverted(revert.abi_encode().into())
            }
        }
    }
}
