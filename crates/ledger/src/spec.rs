// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

/// Gas schedule and limits applied by the ledger during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spec {
    /// Intrinsic gas charged for every top-level transaction.
    pub tx_gas: u64,
    /// Base cost of a nested call.
    pub call_gas: u64,
    /// Surcharge for a nested call carrying non-zero value.
    pub call_value_transfer_gas: u64,
    /// Free gas handed to a callee receiving value.
    pub call_stipend: u64,
    pub balance_gas: u64,
    pub sload_gas: u64,
    /// Cost of writing a non-zero value into an empty slot.
    pub sstore_set_gas: u64,
    /// Cost of any other storage write.
    pub sstore_reset_gas: u64,
    pub log_gas: u64,
    pub log_topic_gas: u64,
    pub log_data_gas: u64,
    /// Maximum depth of nested frames, the top-level frame included.
    pub max_depth: usize,
    /// A nested call may receive at most `gas_left - gas_left / divisor`.
    /// `None` forwards everything.
    pub sub_gas_cap_divisor: Option<u64>,
}

impl Default for Spec {
    fn default() -> Self {
        Spec {
            tx_gas: 21_000,
            call_gas: 700,
            call_value_transfer_gas: 9_000,
            call_stipend: 2_300,
            balance_gas: 700,
            sload_gas: 800,
            sstore_set_gas: 20_000,
            sstore_reset_gas: 5_000,
            log_gas: 375,
            log_topic_gas: 375,
            log_data_gas: 8,
            max_depth: 64,
            sub_gas_cap_divisor: Some(64),
        }
    }
}

impl Spec {
    /// Gas a nested call can be given when the caller has `gas_left`.
    pub fn callee_gas_allowance(&self, gas_left: u64) -> u64 {
        match self.sub_gas_cap_divisor {
            Some(divisor) => gas_left - gas_left / divisor,
            None => gas_left,
        }
    }

    pub fn log_cost(&self, topics: usize, data_len: usize) -> u64 {
        self.log_gas
            + self.log_topic_gas * topics as u64
            + self.log_data_gas * data_len as u64
    }
}
