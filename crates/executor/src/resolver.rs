// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{error::Result, storage_layout};
use alloy_primitives::Address;
use batch_ledger::Context;

/// Length of the sender suffix a trusted forwarder appends to the payload.
pub const SENDER_SUFFIX_LEN: usize = 20;

/// Who is calling, and with what payload, once relaying is accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCall<'a> {
    pub direct_caller: Address,
    /// The logical initiator: the relayed sender for forwarded calls, the
    /// direct caller otherwise.
    pub effective_caller: Address,
    /// The payload with any sender suffix stripped.
    pub payload: &'a [u8],
    /// The forwarder, if the call was relayed.
    pub forwarder: Option<Address>,
}

impl<'a> ResolvedCall<'a> {
    pub fn direct(caller: Address, payload: &'a [u8]) -> Self {
        ResolvedCall {
            direct_caller: caller,
            effective_caller: caller,
            payload,
            forwarder: None,
        }
    }
}

/// Resolves a call given whether its direct caller is a trusted forwarder.
/// The sender of a forwarded call is the last 20 bytes of the payload; a
/// payload too short to carry one is taken as is.
pub fn resolve_forwarded(
    direct_caller: Address, raw: &[u8], trusted_forwarder: bool,
) -> ResolvedCall<'_> {
    if !trusted_forwarder || raw.len() < SENDER_SUFFIX_LEN {
        return ResolvedCall::direct(direct_caller, raw);
    }
    let (payload, suffix) = raw.split_at(raw.len() - SENDER_SUFFIX_LEN);
    ResolvedCall {
        direct_caller,
        effective_caller: Address::from_slice(suffix),
        payload,
        forwarder: Some(direct_caller),
    }
}

/// Determines the effective caller of each invocation. Resolution happens
/// afresh on every call; nothing is cached.
pub trait CallerResolver: Send + Sync + 'static {
    fn resolve<'a>(
        &self, context: &mut Context, raw: &'a [u8],
    ) -> Result<ResolvedCall<'a>>;
}

/// The direct caller is always the effective caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectCaller;

impl CallerResolver for DirectCaller {
    fn resolve<'a>(
        &self, context: &mut Context, raw: &'a [u8],
    ) -> Result<ResolvedCall<'a>> {
        Ok(ResolvedCall::direct(context.sender(), raw))
    }
}

/// Recovers the relayed sender of calls coming from a registered forwarder.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedForwarderResolver;

impl CallerResolver for TrustedForwarderResolver {
    fn resolve<'a>(
        &self, context: &mut Context, raw: &'a [u8],
    ) -> Result<ResolvedCall<'a>> {
        let sender = context.sender();
        let trusted = storage_layout::is_trusted_forwarder(context, &sender)?;
        let resolved = resolve_forwarded(sender, raw, trusted);
        if let Some(forwarder) = resolved.forwarder {
            trace!(
                "Forwarded call: forwarder={:?} sender={:?}",
                forwarder,
                resolved.effective_caller
            );
        }
        Ok(resolved)
    }
}
