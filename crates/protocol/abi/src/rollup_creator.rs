//! `RollupCreator` factory bindings.

use alloy_sol_types::sol;

sol! {
    /// The current `RollupCreator` factory.
    ///
    /// Deployments through this factory may use a custom gas token and always install an
    /// `UpgradeExecutor` as the owner of the core contracts.
    #[derive(Debug, PartialEq, Eq)]
    interface RollupCreatorCanonical {
        struct MaxTimeVariation {
            uint256 delayBlocks;
            uint256 futureBlocks;
            uint256 delaySeconds;
            uint256 futureSeconds;
        }

        struct Config {
            uint64 confirmPeriodBlocks;
            uint64 extraChallengeTimeBlocks;
            address stakeToken;
            uint256 baseStake;
            bytes32 wasmModuleRoot;
            address owner;
            address loserStakeEscrow;
            uint256 chainId;
            string chainConfig;
            uint64 genesisBlockNum;
            MaxTimeVariation sequencerInboxMaxTimeVariation;
        }

        struct RollupDeploymentParams {
            Config config;
            address batchPoster;
            address[] validators;
            uint256 maxDataSize;
            address nativeToken;
            bool deployFactoriesToL2;
            uint256 maxFeePerGasForRetryables;
        }

        event RollupCreated(
            address indexed rollupAddress,
            address indexed nativeToken,
            address inboxAddress,
            address outbox,
            address rollupEventInbox,
            address challengeManager,
            address adminProxy,
            address sequencerInbox,
            address bridge,
            address upgradeExecutor,
            address validatorUtils,
            address validatorWalletCreator
        );

        function createRollup(RollupDeploymentParams deployParams) external payable returns (address);
    }
}

sol! {
    /// The original `RollupCreator` factory, which predates custom gas tokens and the
    /// `UpgradeExecutor`.
    #[derive(Debug, PartialEq, Eq)]
    interface RollupCreatorLegacy {
        struct MaxTimeVariation {
            uint256 delayBlocks;
            uint256 futureBlocks;
            uint256 delaySeconds;
            uint256 futureSeconds;
        }

        struct Config {
            uint64 confirmPeriodBlocks;
            uint64 extraChallengeTimeBlocks;
            address stakeToken;
            uint256 baseStake;
            bytes32 wasmModuleRoot;
            address owner;
            address loserStakeEscrow;
            uint256 chainId;
            string chainConfig;
            uint64 genesisBlockNum;
            MaxTimeVariation sequencerInboxMaxTimeVariation;
        }

        event RollupCreated(
            address indexed rollupAddress,
            address inboxAddress,
            address outbox,
            address rollupEventInbox,
            address challengeManager,
            address adminProxy,
            address sequencerInbox,
            address bridge,
            address validatorUtils,
            address validatorWalletCreator
        );

        function createRollup(Config config, address _batchPoster, address[] _validators) external returns (address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::{SolCall, SolEvent};

    #[test]
    fn test_rollup_created_topics_differ() {
        assert_ne!(
            RollupCreatorCanonical::RollupCreated::SIGNATURE_HASH,
            RollupCreatorLegacy::RollupCreated::SIGNATURE_HASH
        );
        assert_eq!(
            RollupCreatorLegacy::RollupCreated::SIGNATURE,
            "RollupCreated(address,address,address,address,address,address,address,address,address,address)"
        );
    }

    #[test]
    fn test_create_rollup_selectors_differ() {
        assert_ne!(
            RollupCreatorCanonical::createRollupCall::SELECTOR,
            RollupCreatorLegacy::createRollupCall::SELECTOR
        );
    }
}
