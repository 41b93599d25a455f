// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::error::{BatchError, Result};
use alloy_primitives::U256;

/// Sums the values of a batch. Overflow is an error, never wrapped.
pub fn total_value<'a, I>(values: I) -> Result<U256>
where I: IntoIterator<Item = &'a U256> {
    values.into_iter().try_fold(U256::ZERO, |sum, value| {
        sum.checked_add(*value).ok_or(BatchError::ValueOverflow)
    })
}

/// The value attached to an invocation split into what the items spend and
/// what goes back to the initiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueBudget {
    attached: U256,
    total: U256,
}

impl ValueBudget {
    pub fn reserve<'a, I>(attached: U256, values: I) -> Result<Self>
    where I: IntoIterator<Item = &'a U256> {
        let total = total_value(values)?;
        if attached < total {
            return Err(BatchError::InsufficientFunds {
                required: total,
                attached,
            });
        }
        Ok(ValueBudget { attached, total })
    }

    pub fn attached(&self) -> U256 { self.attached }

    pub fn total(&self) -> U256 { self.total }

    pub fn refund(&self) -> U256 { self.attached - self.total }
}
