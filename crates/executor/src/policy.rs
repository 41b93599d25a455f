// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{error::Result, storage_layout};
use alloy_primitives::Address;
use batch_ledger::Context;

/// Decides whether an effective caller may submit batches.
pub trait AuthorizationPolicy: Send + Sync + 'static {
    fn is_authorized(
        &self, context: &mut Context, caller: &Address,
    ) -> Result<bool>;
}

/// Admits the callers on the executor's allow-list.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowListPolicy;

impl AuthorizationPolicy for AllowListPolicy {
    fn is_authorized(
        &self, context: &mut Context, caller: &Address,
    ) -> Result<bool> {
        storage_layout::is_authorized(context, caller)
    }
}

/// Admits everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAccess;

impl AuthorizationPolicy for OpenAccess {
    fn is_authorized(&self, _: &mut Context, _: &Address) -> Result<bool> {
        Ok(true)
    }
}
