//! Rollup and ownership bindings.

use alloy_sol_types::sol;

sol! {
    /// Read surface of the rollup proxy.
    #[derive(Debug, PartialEq, Eq)]
    interface IRollupCore {
        event RollupInitialized(bytes32 machineHash, uint256 chainId);

        function bridge() external view returns (address);
        function inbox() external view returns (address);
        function sequencerInbox() external view returns (address);
        function outbox() external view returns (address);
        function stakeToken() external view returns (address);
    }

    /// `Ownable` owner lookup, shared by the rollup and the `ProxyAdmin`.
    #[derive(Debug, PartialEq, Eq)]
    interface IOwnable {
        function owner() external view returns (address);
    }
}
