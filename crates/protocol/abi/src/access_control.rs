//! OpenZeppelin `AccessControl` events, as emitted by the `UpgradeExecutor`.

use alloy_sol_types::sol;

sol! {
    /// Role bookkeeping events.
    #[derive(Debug, PartialEq, Eq)]
    interface IAccessControl {
        event RoleGranted(bytes32 indexed role, address indexed account, address indexed sender);
        event RoleRevoked(bytes32 indexed role, address indexed account, address indexed sender);
    }
}
