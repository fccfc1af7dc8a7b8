//! Sequencer inbox and bridge bindings.

use alloy_sol_types::sol;

sol! {
    /// Data availability keysets and batch delivery on the sequencer inbox.
    #[derive(Debug, PartialEq, Eq)]
    interface ISequencerInbox {
        struct TimeBounds {
            uint64 minTimestamp;
            uint64 maxTimestamp;
            uint64 minBlockNumber;
            uint64 maxBlockNumber;
        }

        enum BatchDataLocation {
            /// Batch data is the calldata of the delivering transaction.
            TxInput,
            /// Batch data is carried by a separate event.
            SeparateBatchEvent,
            /// The batch carries no data.
            NoData,
            /// Batch data is posted in blobs.
            Blob
        }

        event SequencerBatchDelivered(
            uint256 indexed batchSequenceNumber,
            bytes32 indexed beforeAcc,
            bytes32 indexed afterAcc,
            bytes32 delayedAcc,
            uint256 afterDelayedMessagesRead,
            TimeBounds timeBounds,
            BatchDataLocation dataLocation
        );

        event SetValidKeyset(bytes32 indexed keysetHash, bytes keysetBytes);

        function isValidKeysetHash(bytes32 ksHash) external view returns (bool);
    }

    /// Bridge wiring events.
    #[derive(Debug, PartialEq, Eq)]
    interface IBridge {
        event SequencerInboxUpdated(address newSequencerInbox);
    }
}
