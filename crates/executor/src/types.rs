// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::abi;
use alloy_primitives::{hex, Address, Bytes, U256};
use alloy_sol_types::{GenericContractError, SolInterface};
use std::fmt;

/// One caller-supplied batch item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubCall {
    /// Must be non-zero.
    pub target: Address,
    pub value: U256,
    pub payload: Bytes,
    /// A failure of this item aborts and rolls back the whole batch.
    pub require_success: bool,
}

impl From<abi::Call> for SubCall {
    fn from(call: abi::Call) -> Self {
        SubCall {
            target: call.target,
            value: call.value,
            payload: call.data,
            require_success: call.requireSuccess,
        }
    }
}

impl From<SubCall> for abi::Call {
    fn from(call: SubCall) -> Self {
        abi::Call {
            target: call.target,
            value: call.value,
            data: call.payload,
            requireSuccess: call.require_success,
        }
    }
}

/// The outcome of one batch item, in the same position as the item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubCallOutcome {
    pub succeeded: bool,
    /// Return data on success, the raw revert payload otherwise.
    pub return_data: Bytes,
    /// Gas consumed by the item, sampled around the call.
    pub resource_used: u64,
}

impl SubCallOutcome {
    /// Why the item failed, `None` if it succeeded.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        (!self.succeeded)
            .then(|| FailureReason::from_revert_data(&self.return_data))
    }
}

impl From<SubCallOutcome> for abi::CallResult {
    fn from(outcome: SubCallOutcome) -> Self {
        abi::CallResult {
            success: outcome.succeeded,
            returnData: outcome.return_data,
            gasUsed: U256::from(outcome.resource_used),
        }
    }
}

/// Why a callee failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The callee rejected the call with an `Error(string)` reason.
    Structured(String),
    /// The callee reverted with a payload that is not a reason string.
    Raw(Bytes),
    /// No payload at all: the callee trapped, ran out of gas or reverted
    /// without data.
    Empty,
}

impl FailureReason {
    pub fn from_revert_data(data: &[u8]) -> Self {
        if data.is_empty() {
            return FailureReason::Empty;
        }
        match GenericContractError::abi_decode(data, true) {
            Ok(GenericContractError::Revert(revert)) => {
                FailureReason::Structured(revert.reason)
            }
            _ => FailureReason::Raw(Bytes::copy_from_slice(data)),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, FailureReason::Structured(_))
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Structured(reason) => f.write_str(reason),
            FailureReason::Raw(data) => {
                write!(f, "low-level call failed (0x{})", hex::encode(data))
            }
            FailureReason::Empty => f.write_str("low-level call failed"),
        }
    }
}
