mod stack_info;

pub use stack_info::CallStackInfo;

use crate::{
    context::Context, contract::ContractMap, error::Result, spec::Spec,
    state::State, substate::Substate,
};
use alloy_primitives::{Address, Bytes, U256};

/// The input parameters of a frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionParams {
    /// The direct caller.
    pub sender: Address,
    /// The account being called.
    pub address: Address,
    /// Value moved from `sender` to `address` before the callee runs.
    pub value: U256,
    pub data: Bytes,
    /// Gas available to the frame.
    pub gas: u64,
}

/// Resources shared by all frames of one transaction.
pub struct RuntimeRes<'a> {
    pub state: &'a mut State,
    pub callstack: &'a mut CallStackInfo,
    pub contracts: &'a ContractMap,
    pub spec: &'a Spec,
}

impl<'a> RuntimeRes<'a> {
    pub fn reborrow(&mut self) -> RuntimeRes<'_> {
        RuntimeRes {
            state: &mut *self.state,
            callstack: &mut *self.callstack,
            contracts: self.contracts,
            spec: self.spec,
        }
    }
}

/// The result of executing a frame.
#[derive(Debug)]
pub struct FrameReturn {
    pub result: Result<Bytes>,
    /// Gas handed back to the caller.
    pub gas_left: u64,
    /// Logs of the frame and its successful children, present only if the
    /// frame succeeded.
    pub substate: Option<Substate>,
}

/// Executes one frame: moves the attached value, runs the contract deployed
/// at `params.address` (plain accounts just receive the value) and keeps or
/// reverts the state changes depending on the outcome.
pub fn exec_frame(
    params: &ActionParams, depth: usize, mut resources: RuntimeRes,
) -> FrameReturn {
    trace!(
        "Frame::call(sender={:?}, address={:?}, value={}, gas={}, depth={})",
        params.sender,
        params.address,
        params.value,
        params.gas,
        depth
    );
    resources.state.checkpoint();
    resources.callstack.push(params.address);

    let mut gas_left = params.gas;
    let mut substate = Substate::new();
    let result = match resources.state.transfer_balance(
        &params.sender,
        &params.address,
        &params.value,
    ) {
        Err(e) => Err(e),
        Ok(()) => match resources.contracts.contract(&params.address) {
            Some(contract) => {
                let mut context =
                    Context::new(params, depth, resources.reborrow());
                let output = contract.execute(params, &mut context);
                let (left, frame_substate) = context.finish();
                gas_left = left;
                substate = frame_substate;
                output
            }
            None => {
                trace!("Transfer");
                Ok(Bytes::new())
            }
        },
    };

    resources.callstack.pop();

    match &result {
        Ok(_) => resources.state.discard_checkpoint(),
        Err(e) => {
            debug!("Frame failed: address={:?} err={:?}", params.address, e);
            resources.state.revert_to_checkpoint();
            if !e.returns_gas() {
                gas_left = 0;
            }
        }
    }

    let substate = result.is_ok().then_some(substate);
    FrameReturn {
        result,
        gas_left,
        substate,
    }
}
