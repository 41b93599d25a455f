// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use alloy_primitives::{Address, LogData};

/// An event emitted by a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// The emitting contract.
    pub address: Address,
    pub data: LogData,
}

/// Side effects of a frame which only become visible to the parent frame
/// when the frame succeeds.
#[derive(Debug, Default)]
pub struct Substate {
    pub logs: Vec<LogEntry>,
}

impl Substate {
    pub fn new() -> Self { Substate::default() }

    /// Merge the substate of a successful child frame.
    pub fn accrue(&mut self, child: Substate) { self.logs.extend(child.logs); }
}
