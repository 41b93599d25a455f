// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Every piece of executor state that must roll back with a failed
//! invocation lives in the executor account's storage under the keys below.
//! Reads and writes through a `Context` are charged gas; `ExecutorView`
//! reads the same keys from a `State` for free.

use crate::error::Result;
use alloy_primitives::{Address, B256, U256};
use batch_ledger::{Context, State};

const OWNER_KEY: &[u8] = b"owner";
const PAUSED_KEY: &[u8] = b"paused";
const BATCH_COUNTER_KEY: &[u8] = b"batch_counter";
const MAX_BATCH_SIZE_KEY: &[u8] = b"max_batch_size";
const MAX_GAS_PER_CALL_KEY: &[u8] = b"max_gas_per_call";
const AUTHORIZED_PREFIX: &[u8] = b"authorized";
const FORWARDER_PREFIX: &[u8] = b"forwarder";
const BATCH_INITIATOR_PREFIX: &[u8] = b"batch_initiator";

fn prefixed(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(suffix);
    key
}

pub fn authorized_key(account: &Address) -> Vec<u8> {
    prefixed(AUTHORIZED_PREFIX, account.as_slice())
}

pub fn forwarder_key(forwarder: &Address) -> Vec<u8> {
    prefixed(FORWARDER_PREFIX, forwarder.as_slice())
}

pub fn batch_initiator_key(batch_id: &U256) -> Vec<u8> {
    prefixed(BATCH_INITIATOR_PREFIX, &batch_id.to_be_bytes::<32>())
}

pub fn address_to_word(address: &Address) -> U256 {
    U256::from_be_bytes(address.into_word().0)
}

pub fn word_to_address(word: U256) -> Address {
    Address::from_word(B256::from(word.to_be_bytes::<32>()))
}

fn bool_to_word(flag: bool) -> U256 {
    if flag {
        U256::from(1)
    } else {
        U256::ZERO
    }
}

/// Values beyond `u64` never get stored; saturate if one shows up anyway.
fn word_to_u64(word: U256) -> u64 { u64::try_from(word).unwrap_or(u64::MAX) }

pub fn owner(context: &mut Context) -> Result<Address> {
    Ok(word_to_address(context.storage_at(OWNER_KEY)?))
}

pub fn set_owner(context: &mut Context, owner: &Address) -> Result<()> {
    context.set_storage(OWNER_KEY.to_vec(), address_to_word(owner))?;
    Ok(())
}

pub fn paused(context: &mut Context) -> Result<bool> {
    Ok(!context.storage_at(PAUSED_KEY)?.is_zero())
}

pub fn set_paused(context: &mut Context, paused: bool) -> Result<()> {
    context.set_storage(PAUSED_KEY.to_vec(), bool_to_word(paused))?;
    Ok(())
}

pub fn batch_counter(context: &mut Context) -> Result<U256> {
    Ok(context.storage_at(BATCH_COUNTER_KEY)?)
}

pub fn set_batch_counter(context: &mut Context, counter: U256) -> Result<()> {
    context.set_storage(BATCH_COUNTER_KEY.to_vec(), counter)?;
    Ok(())
}

pub fn max_batch_size(context: &mut Context) -> Result<u64> {
    Ok(word_to_u64(context.storage_at(MAX_BATCH_SIZE_KEY)?))
}

pub fn set_max_batch_size(context: &mut Context, size: u64) -> Result<()> {
    context.set_storage(MAX_BATCH_SIZE_KEY.to_vec(), U256::from(size))?;
    Ok(())
}

pub fn max_gas_per_call(context: &mut Context) -> Result<u64> {
    Ok(word_to_u64(context.storage_at(MAX_GAS_PER_CALL_KEY)?))
}

pub fn set_max_gas_per_call(context: &mut Context, limit: u64) -> Result<()> {
    context.set_storage(MAX_GAS_PER_CALL_KEY.to_vec(), U256::from(limit))?;
    Ok(())
}

pub fn is_authorized(context: &mut Context, account: &Address) -> Result<bool> {
    Ok(!context.storage_at(&authorized_key(account))?.is_zero())
}

pub fn set_authorized(
    context: &mut Context, account: &Address, authorized: bool,
) -> Result<()> {
    context.set_storage(authorized_key(account), bool_to_word(authorized))?;
    Ok(())
}

pub fn is_trusted_forwarder(
    context: &mut Context, forwarder: &Address,
) -> Result<bool> {
    Ok(!context.storage_at(&forwarder_key(forwarder))?.is_zero())
}

pub fn set_trusted_forwarder(
    context: &mut Context, forwarder: &Address, trusted: bool,
) -> Result<()> {
    context.set_storage(forwarder_key(forwarder), bool_to_word(trusted))?;
    Ok(())
}

pub fn batch_initiator(
    context: &mut Context, batch_id: &U256,
) -> Result<Address> {
    Ok(word_to_address(
        context.storage_at(&batch_initiator_key(batch_id))?,
    ))
}

pub fn set_batch_initiator(
    context: &mut Context, batch_id: &U256, initiator: &Address,
) -> Result<()> {
    context.set_storage(
        batch_initiator_key(batch_id),
        address_to_word(initiator),
    )?;
    Ok(())
}

/// The storage an executor starts with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitialState {
    pub owner: Address,
    pub max_batch_size: u64,
    pub max_gas_per_call: u64,
    pub authorized_callers: Vec<Address>,
    pub trusted_forwarders: Vec<Address>,
}

/// Writes `initial` into the storage of the executor at `executor`. Meant
/// for deployment, outside of any transaction.
pub fn initialize(
    state: &mut State, executor: &Address, initial: &InitialState,
) {
    state.set_storage(
        executor,
        OWNER_KEY.to_vec(),
        address_to_word(&initial.owner),
    );
    state.set_storage(
        executor,
        MAX_BATCH_SIZE_KEY.to_vec(),
        U256::from(initial.max_batch_size),
    );
    state.set_storage(
        executor,
        MAX_GAS_PER_CALL_KEY.to_vec(),
        U256::from(initial.max_gas_per_call),
    );
    for caller in &initial.authorized_callers {
        state.set_storage(executor, authorized_key(caller), U256::from(1));
    }
    for forwarder in &initial.trusted_forwarders {
        state.set_storage(executor, forwarder_key(forwarder), U256::from(1));
    }
}

/// Read-only access to an executor's state from outside a transaction.
pub struct ExecutorView<'a> {
    state: &'a State,
    address: Address,
}

impl<'a> ExecutorView<'a> {
    pub fn new(state: &'a State, address: Address) -> Self {
        ExecutorView { state, address }
    }

    fn get(&self, key: &[u8]) -> U256 {
        self.state.storage_at(&self.address, key)
    }

    pub fn balance(&self) -> U256 { self.state.balance(&self.address) }

    pub fn owner(&self) -> Address { word_to_address(self.get(OWNER_KEY)) }

    pub fn paused(&self) -> bool { !self.get(PAUSED_KEY).is_zero() }

    pub fn batch_counter(&self) -> U256 { self.get(BATCH_COUNTER_KEY) }

    pub fn max_batch_size(&self) -> u64 {
        word_to_u64(self.get(MAX_BATCH_SIZE_KEY))
    }

    pub fn max_gas_per_call(&self) -> u64 {
        word_to_u64(self.get(MAX_GAS_PER_CALL_KEY))
    }

    pub fn is_authorized(&self, account: &Address) -> bool {
        !self.get(&authorized_key(account)).is_zero()
    }

    pub fn is_trusted_forwarder(&self, forwarder: &Address) -> bool {
        !self.get(&forwarder_key(forwarder)).is_zero()
    }

    /// The initiator of batch `batch_id`, the zero address if there is no
    /// such batch.
    pub fn batch_initiator(&self, batch_id: u64) -> Address {
        word_to_address(self.get(&batch_initiator_key(&U256::from(batch_id))))
    }
}
