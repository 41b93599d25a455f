use alloy_primitives::Address;
use std::collections::HashMap;

/// The addresses of the frames currently executing, outermost first.
#[derive(Debug, Default)]
pub struct CallStackInfo {
    frames: Vec<Address>,
    /// How many frames each address currently has on the stack.
    active: HashMap<Address, usize>,
    /// Stack height at which some contract was first re-entered through
    /// another one.
    reentered_at: Option<usize>,
}

impl CallStackInfo {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, address: Address) {
        // Self-calls do not count.
        if self.last() != Some(&address) && self.is_active(&address) {
            self.reentered_at.get_or_insert(self.frames.len());
        }
        self.frames.push(address);
        *self.active.entry(address).or_default() += 1;
    }

    pub fn pop(&mut self) -> Option<Address> {
        let address = self.frames.pop()?;
        if let Some(count) = self.active.get_mut(&address) {
            *count -= 1;
            if *count == 0 {
                self.active.remove(&address);
            }
        }
        if self.reentered_at == Some(self.frames.len()) {
            self.reentered_at = None;
        }
        Some(address)
    }

    pub fn last(&self) -> Option<&Address> { self.frames.last() }

    /// Whether `address` has a frame anywhere on the stack.
    pub fn is_active(&self, address: &Address) -> bool {
        self.active.contains_key(address)
    }

    pub fn frames_of(&self, address: &Address) -> usize {
        self.active.get(address).copied().unwrap_or(0)
    }

    pub fn depth(&self) -> usize { self.frames.len() }

    /// Whether some contract on the stack has been entered again through
    /// another contract.
    pub fn in_reentrancy(&self) -> bool { self.reentered_at.is_some() }
}
