//! Checkpoints: Defines the account entry type within checkpoint layers and
//! implements checkpoint maintenance logic.

use super::{Account, State};
use alloy_primitives::Address;
use std::collections::{hash_map::Entry::*, HashMap};

/// An account entry in the checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum CheckpointEntry {
    /// The account did not exist when it was first modified under this
    /// checkpoint.
    Unchanged,
    /// The recorded state of the account at this checkpoint.
    Recorded(Account),
}
use CheckpointEntry::*;

impl CheckpointEntry {
    fn from_cache(value: Option<&Account>) -> Self {
        match value {
            Some(v) => Recorded(v.clone()),
            None => Unchanged,
        }
    }
}

/// Represents a recoverable point of the state. The addition of account
/// entries to the checkpoint is lazy; they are only added when the account in
/// the cache is modified, at which point the old version is incorporated into
/// the checkpoint. Therefore, if an account does not exist in the checkpoint,
/// it is implied to be the same as in the cache.
#[derive(Debug, Default)]
pub(super) struct CheckpointLayer {
    entries: HashMap<Address, CheckpointEntry>,
}

impl CheckpointLayer {
    /// Keeps the first recorded version only; later modifications under the
    /// same checkpoint do not change what a revert restores.
    pub fn record(&mut self, address: &Address, current: Option<&Account>) {
        if let Vacant(e) = self.entries.entry(*address) {
            e.insert(CheckpointEntry::from_cache(current));
        }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &HashMap<Address, CheckpointEntry> {
        &self.entries
    }
}

impl State {
    /// Create a recoverable checkpoint of this state. Return the checkpoint
    /// index.
    pub fn checkpoint(&mut self) -> usize {
        self.checkpoints.push(CheckpointLayer::default());
        self.checkpoints.len() - 1
    }

    /// Merge last checkpoint with previous.
    pub fn discard_checkpoint(&mut self) {
        let Some(layer) = self.checkpoints.pop() else { return };
        // Without a parent, the modifications become permanent.
        let Some(parent) = self.checkpoints.last_mut() else { return };
        for (address, entry) in layer.entries {
            // The parent keeps its own (older) pre-image if it has one.
            parent.entries.entry(address).or_insert(entry);
        }
    }

    /// Revert to the last checkpoint and discard it.
    pub fn revert_to_checkpoint(&mut self) {
        let Some(layer) = self.checkpoints.pop() else { return };
        for (address, entry) in layer.entries {
            match entry {
                Recorded(account) => {
                    self.accounts.insert(address, account);
                }
                Unchanged => {
                    self.accounts.remove(&address);
                }
            }
        }
    }

    pub fn checkpoint_depth(&self) -> usize { self.checkpoints.len() }

    #[cfg(test)]
    pub(super) fn innermost_checkpoint(&self) -> Option<&CheckpointLayer> {
        self.checkpoints.last()
    }
}
