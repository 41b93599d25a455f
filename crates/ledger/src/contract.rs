// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{context::Context, error::Result, stack::ActionParams};
use alloy_primitives::{Address, Bytes};
use std::{collections::HashMap, sync::Arc};

/// Native contract trait. A contract is stateless as far as the ledger is
/// concerned: everything that must roll back with a failed frame has to be
/// kept in the contract account's storage through the `Context`.
pub trait ContractTrait: Send + Sync {
    /// Address of the contract
    fn address(&self) -> &Address;

    /// Execute the contract. The value in `params` has already been moved to
    /// the contract's balance. Returning an error fails the frame and reverts
    /// everything it did.
    fn execute(
        &self, params: &ActionParams, context: &mut Context,
    ) -> Result<Bytes>;
}

/// A map from address to the contract deployed there.
#[derive(Default)]
pub struct ContractMap {
    map: HashMap<Address, Arc<dyn ContractTrait>>,
}

impl ContractMap {
    pub fn new() -> Self { Self::default() }

    /// Registers `contract` at its own address, replacing whatever was there.
    pub fn insert(&mut self, contract: Arc<dyn ContractTrait>) {
        self.map.insert(*contract.address(), contract);
    }

    pub fn contract(
        &self, address: &Address,
    ) -> Option<Arc<dyn ContractTrait>> {
        self.map.get(address).cloned()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.map.contains_key(address)
    }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }
}
