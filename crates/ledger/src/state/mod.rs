// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Ledger State: accounts with balances and key-value storage, plus a stack
//! of checkpoints so that any frame's modifications can be reverted.

mod checkpoints;

use crate::error::{Error, Result};
use alloy_primitives::{Address, U256};
use checkpoints::CheckpointLayer;
use std::collections::HashMap;

/// An account on the ledger. Contract code is not part of the account; it
/// lives in the `ContractMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    balance: U256,
    storage: HashMap<Vec<u8>, U256>,
}

impl Account {
    pub fn balance(&self) -> &U256 { &self.balance }

    pub fn storage_at(&self, key: &[u8]) -> U256 {
        self.storage.get(key).copied().unwrap_or_default()
    }

    fn set_storage(&mut self, key: Vec<u8>, value: U256) {
        if value.is_zero() {
            self.storage.remove(&key);
        } else {
            self.storage.insert(key, value);
        }
    }
}

#[derive(Debug, Default)]
pub struct State {
    /// Current version of every account that has ever been touched.
    accounts: HashMap<Address, Account>,
    /// Innermost checkpoint is the last element.
    checkpoints: Vec<CheckpointLayer>,
}

impl State {
    pub fn new() -> Self { Self::default() }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn exists(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    pub fn balance(&self, address: &Address) -> U256 {
        self.accounts
            .get(address)
            .map_or(U256::ZERO, |account| account.balance)
    }

    pub fn add_balance(&mut self, address: &Address, by: &U256) -> Result<()> {
        if by.is_zero() {
            return Ok(());
        }
        let balance = self
            .balance(address)
            .checked_add(*by)
            .ok_or(Error::BalanceOverflow)?;
        self.modify_account(address).balance = balance;
        Ok(())
    }

    pub fn sub_balance(&mut self, address: &Address, by: &U256) -> Result<()> {
        if by.is_zero() {
            return Ok(());
        }
        let available = self.balance(address);
        let balance =
            available
                .checked_sub(*by)
                .ok_or(Error::NotEnoughBalance {
                    required: *by,
                    available,
                })?;
        self.modify_account(address).balance = balance;
        Ok(())
    }

    /// Moves `value` from `from` to `to`. On error nothing is modified.
    pub fn transfer_balance(
        &mut self, from: &Address, to: &Address, value: &U256,
    ) -> Result<()> {
        if value.is_zero() || from == to {
            // A self-transfer still has to be affordable.
            let available = self.balance(from);
            if &available < value {
                return Err(Error::NotEnoughBalance {
                    required: *value,
                    available,
                });
            }
            return Ok(());
        }
        if self.balance(to).checked_add(*value).is_none() {
            return Err(Error::BalanceOverflow);
        }
        self.sub_balance(from, value)?;
        self.add_balance(to, value)
    }

    pub fn storage_at(&self, address: &Address, key: &[u8]) -> U256 {
        self.accounts
            .get(address)
            .map_or(U256::ZERO, |account| account.storage_at(key))
    }

    pub fn set_storage(
        &mut self, address: &Address, key: Vec<u8>, value: U256,
    ) {
        if self.storage_at(address, &key) == value {
            return;
        }
        self.modify_account(address).set_storage(key, value);
    }

    /// Returns a mutable reference to the cached account, creating it if
    /// needed. The pre-image is recorded in the innermost checkpoint the
    /// first time the account is modified under it.
    fn modify_account(&mut self, address: &Address) -> &mut Account {
        if let Some(layer) = self.checkpoints.last_mut() {
            layer.record(address, self.accounts.get(address));
        }
        self.accounts.entry(*address).or_default()
    }
}
