// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use alloy_primitives::{Bytes, U256};
use thiserror::Error;

/// Reasons a frame can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The frame ran out of gas. All gas given to the frame is consumed.
    #[error("Out of gas")]
    OutOfGas,

    /// The contract explicitly rejected the call. Unused gas is returned to
    /// the caller and the payload is handed back as revert data.
    #[error("Reverted")]
    Reverted(Bytes),

    /// The sender cannot cover the attached value. The callee never runs.
    #[error("Not enough balance: required {required}, available {available}")]
    NotEnoughBalance { required: U256, available: U256 },

    #[error("Balance overflow")]
    BalanceOverflow,

    /// The call stack is already at `Spec::max_depth`.
    #[error("Call depth limit exceeded")]
    DepthLimit,

    /// A contract trapped for a reason of its own.
    #[error("Internal contract error: {0}")]
    InternalContract(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the failed frame hands its unused gas back to the caller.
    /// Traps consume everything they were given.
    pub fn returns_gas(&self) -> bool {
        matches!(
            self,
            Error::Reverted(_)
                | Error::NotEnoughBalance { .. }
                | Error::DepthLimit
        )
    }

    /// The revert payload, empty for anything but an explicit revert.
    pub fn revert_data(&self) -> Bytes {
        match self {
            Error::Reverted(data) => data.clone(),
            _ => Bytes::new(),
        }
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self { Error::InternalContract(e) }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self { Error::InternalContract(e.into()) }
}
