// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{
    contract::{DirectAccessExecutor, MetaTxExecutor},
    storage_layout::{self, InitialState},
    DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_GAS_PER_CALL, MAX_BATCH_SIZE_LIMIT,
};
use alloy_primitives::Address;
use batch_ledger::Ledger;
use serde_derive::Deserialize;
use std::{fs::File, io::Read, path::Path, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("Invalid max_batch_size {0}. It must be within [1, 100].")]
    InvalidMaxBatchSize(u64),

    #[error("Invalid max_gas_per_call {0}. It must be positive.")]
    InvalidMaxGasPerCall(u64),

    #[error("Invalid address in {0}: the zero address is not allowed")]
    ZeroAddress(&'static str),
}

/// Deployment parameters of an executor.
///
/// ```toml
/// max_batch_size = 20
/// max_gas_per_call = 1000000
/// allow_list_mutable = true
/// authorized_callers = ["0x1111111111111111111111111111111111111111"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    pub max_batch_size: u64,
    pub max_gas_per_call: u64,
    /// Whether the owner of a direct-access executor can change its
    /// allow-list after deployment.
    pub allow_list_mutable: bool,
    /// Allow-list entries besides the deployer.
    pub authorized_callers: Vec<Address>,
    /// Forwarders trusted from the start (meta-transaction executors).
    pub trusted_forwarders: Vec<Address>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_gas_per_call: DEFAULT_MAX_GAS_PER_CALL,
            allow_list_mutable: false,
            authorized_callers: Vec::new(),
            trusted_forwarders: Vec::new(),
        }
    }
}

impl ExecutorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ExecutorConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_BATCH_SIZE_LIMIT).contains(&self.max_batch_size) {
            return Err(ConfigError::InvalidMaxBatchSize(self.max_batch_size));
        }
        if self.max_gas_per_call == 0 {
            return Err(ConfigError::InvalidMaxGasPerCall(
                self.max_gas_per_call,
            ));
        }
        if self.authorized_callers.iter().any(|a| a.is_zero()) {
            return Err(ConfigError::ZeroAddress("authorized_callers"));
        }
        if self.trusted_forwarders.iter().any(|a| a.is_zero()) {
            return Err(ConfigError::ZeroAddress("trusted_forwarders"));
        }
        Ok(())
    }

    fn initial_state(&self, deployer: Address) -> InitialState {
        let mut authorized_callers = vec![deployer];
        authorized_callers.extend(self.authorized_callers.iter().copied());
        InitialState {
            owner: deployer,
            max_batch_size: self.max_batch_size,
            max_gas_per_call: self.max_gas_per_call,
            authorized_callers,
            trusted_forwarders: self.trusted_forwarders.clone(),
        }
    }
}

/// Deploys a direct-access executor at `address`. The deployer becomes the
/// owner and the first allow-listed caller.
pub fn deploy_direct_access(
    ledger: &mut Ledger, address: Address, deployer: Address,
    config: &ExecutorConfig,
) -> Result<Arc<DirectAccessExecutor>, ConfigError> {
    config.validate()?;
    storage_layout::initialize(
        ledger.state_mut(),
        &address,
        &config.initial_state(deployer),
    );
    let executor = Arc::new(DirectAccessExecutor::direct_access(
        address,
        config.allow_list_mutable,
    ));
    ledger.deploy(executor.clone());
    info!(
        "Direct-access executor deployed at {:?}, owner {:?}",
        address, deployer
    );
    Ok(executor)
}

/// Deploys a meta-transaction executor at `address` owned by `deployer`.
pub fn deploy_meta_tx(
    ledger: &mut Ledger, address: Address, deployer: Address,
    config: &ExecutorConfig,
) -> Result<Arc<MetaTxExecutor>, ConfigError> {
    config.validate()?;
    storage_layout::initialize(
        ledger.state_mut(),
        &address,
        &config.initial_state(deployer),
    );
    let executor = Arc::new(MetaTxExecutor::meta_tx(address));
    ledger.deploy(executor.clone());
    info!(
        "Meta-transaction executor deployed at {:?}, owner {:?}",
        address, deployer
    );
    Ok(executor)
}
