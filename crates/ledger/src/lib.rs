// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Batch Ledger: a small in-memory account ledger that hosts contracts written
//! in Rust. It provides just enough of a blockchain execution environment for
//! the batch executor: balances, contract storage, nested call frames with
//! checkpoint-based rollback, a gas meter and event logs.

#[macro_use]
extern crate log;

/// Execution Context: what a running contract can observe and do, including
/// issuing nested calls.
pub mod context;

/// Contract Interface: the trait implemented by contracts hosted on the
/// ledger and the registry mapping addresses to them.
pub mod contract;

/// Transaction Execution Entry: the `Ledger` object and top-level
/// transaction processing.
pub mod executive;

/// Gas schedule and execution limits.
pub mod spec;

/// Stack Management: frame execution and call stack bookkeeping.
pub mod stack;

/// Ledger State: accounts, storage and nested checkpoints.
pub mod state;

/// Execution side effects accumulated per frame (event logs).
pub mod substate;

mod error;

pub use alloy_primitives::{Address, Bytes, LogData, B256, U256};
pub use context::{CallRequest, Context, MessageCallResult};
pub use contract::{ContractMap, ContractTrait};
pub use error::{Error, Result};
pub use executive::{ExecutionOutcome, Ledger, Transaction};
pub use spec::Spec;
pub use stack::{ActionParams, CallStackInfo};
pub use state::{Account, State};
pub use substate::{LogEntry, Substate};
