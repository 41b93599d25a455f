// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::error::Result;
use alloy_sol_types::{sol, SolEvent};
use batch_ledger::Context;

sol! {
    /// One item of a batch.
    #[derive(Debug, PartialEq, Eq)]
    struct Call {
        /// The account to invoke.
        address target;
        /// Native value attached to the call.
        uint256 value;
        /// Call data, possibly empty.
        bytes data;
        /// Whether a failure of this item aborts the whole batch.
        bool requireSuccess;
    }

    /// Outcome of one batch item.
    #[derive(Debug, PartialEq, Eq)]
    struct CallResult {
        bool success;
        /// Return data, or the revert payload of a failed call.
        bytes returnData;
        /// Gas consumed by the item. Informational only.
        uint256 gasUsed;
    }

    interface IBatchExecutor {
        event CallExecuted(
            uint256 indexed batchId,
            uint256 indexed index,
            address indexed target,
            bool success,
            uint256 gasUsed
        );
        event BatchExecuted(
            address indexed executor,
            uint256 indexed batchId,
            uint256 successCount,
            uint256 totalCount
        );
        event MetaTransactionExecuted(
            address indexed forwarder,
            address indexed sender,
            uint256 indexed batchId
        );
        event BatchTransferExecuted(
            address indexed sender,
            uint256 successCount,
            uint256 totalCount
        );
        event TransferFailed(address indexed recipient, uint256 amount);
        event RefundFailed(address indexed recipient, uint256 amount);
        event TrustedForwarderAdded(address indexed forwarder);
        event TrustedForwarderRemoved(address indexed forwarder);
        event AuthorizedCallerAdded(address indexed caller);
        event AuthorizedCallerRemoved(address indexed caller);
        event MaxBatchSizeUpdated(uint256 oldSize, uint256 newSize);
        event MaxGasPerCallUpdated(uint256 oldLimit, uint256 newLimit);
        event OwnershipTransferred(
            address indexed previousOwner,
            address indexed newOwner
        );
        event Paused(address account);
        event Unpaused(address account);
        event EmergencyWithdrawal(address indexed to, uint256 amount);

        function executeBatch(Call[] calldata calls, bool stopOnFailure)
            external
            payable
            returns (CallResult[] memory results);
        function executeBatchWithGasLimits(
            Call[] calldata calls,
            uint256[] calldata gasLimits,
            bool stopOnFailure
        ) external payable returns (CallResult[] memory results);
        function batchTransfer(
            address[] calldata recipients,
            uint256[] calldata amounts
        ) external payable returns (bool[] memory results);

        function balance() external view returns (uint256 amount);
        function isAuthorized(address account)
            external
            view
            returns (bool authorized);
        function isTrustedForwarder(address forwarder)
            external
            view
            returns (bool trusted);
        function owner() external view returns (address account);
        function paused() external view returns (bool isPaused);
        function batchCounter() external view returns (uint256 counter);
        function batchInitiator(uint256 batchId)
            external
            view
            returns (address initiator);
        function maxBatchSize() external view returns (uint256 size);
        function maxGasPerCall() external view returns (uint256 limit);

        function addTrustedForwarder(address forwarder) external;
        function removeTrustedForwarder(address forwarder) external;
        function addAuthorizedCaller(address caller) external;
        function removeAuthorizedCaller(address caller) external;
        function setMaxBatchSize(uint256 newSize) external;
        function setMaxGasPerCall(uint256 newLimit) external;
        function transferOwnership(address newOwner) external;
        function pause() external;
        function unpause() external;
        function emergencyWithdraw(address to, uint256 amount) external;
    }
}

/// Emits `event` from the executing contract.
pub(crate) fn emit<E: SolEvent>(
    context: &mut Context, event: &E,
) -> Result<()> {
    context.log(event.encode_log_data())?;
    Ok(())
}
