// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Batch Executor: a contract hosted on the batch ledger that executes an
//! ordered list of sub-calls within one invocation. Each item either has to
//! succeed or is allowed to fail; a failure that policy does not tolerate
//! rolls back the whole invocation. Value attached to the invocation funds
//! the sub-calls and whatever is left is refunded to the initiator.
//!
//! Two variants share one implementation, [`BatchExecutor`], parameterized
//! over an [`AuthorizationPolicy`] and a [`CallerResolver`]:
//! [`DirectAccessExecutor`] admits allow-listed callers only, while
//! [`MetaTxExecutor`] admits anyone and recovers the effective caller of calls
//! relayed through a trusted forwarder.

#[macro_use]
extern crate log;

/// Solidity ABI of the executor: call, return and event encodings.
pub mod abi;

/// Executor configuration and deployment onto a ledger.
pub mod config;

/// Admission guards: pause flag, reentrancy lock and batch ceilings.
pub mod guard;

/// Who may submit batches.
pub mod policy;

/// Effective-caller resolution for relayed calls.
pub mod resolver;

/// Persistent executor state inside the executor account's storage.
pub mod storage_layout;

/// Sub-calls, their outcomes and failure reasons.
pub mod types;

mod accounting;
mod admin;
mod call;
mod contract;
mod error;
mod orchestrator;
mod transfer;

#[cfg(test)]
mod tests;

pub use accounting::{total_value, ValueBudget};
pub use config::{
    deploy_direct_access, deploy_meta_tx, ConfigError, ExecutorConfig,
};
pub use contract::{
    AdminMode, BatchExecutor, DirectAccessExecutor, MetaTxExecutor,
};
pub use error::{BatchError, Result};
pub use guard::{LockStatus, ReentrancyGuard, ReentrancyLock};
pub use policy::{AllowListPolicy, AuthorizationPolicy, OpenAccess};
pub use resolver::{
    CallerResolver, DirectCaller, ResolvedCall, TrustedForwarderResolver,
};
pub use storage_layout::ExecutorView;
pub use types::{FailureReason, SubCall, SubCallOutcome};

/// Upper bound for the configurable maximum batch size.
pub const MAX_BATCH_SIZE_LIMIT: u64 = 100;
/// Maximum batch size of a freshly deployed executor.
pub const DEFAULT_MAX_BATCH_SIZE: u64 = 50;
/// Per-call gas ceiling of a freshly deployed executor.
pub const DEFAULT_MAX_GAS_PER_CALL: u64 = 5_000_000;
