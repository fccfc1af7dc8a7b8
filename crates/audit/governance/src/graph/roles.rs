//! `AccessControl` role replay.

use crate::{AuditError, AuditResult, BlockRange, ChainClient, LogPosition, LogQuery};
use alloy_primitives::{Address, B256};
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolEvent;
use orbit_abi::IAccessControl;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Whether a role was granted or revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoleEventKind {
    /// `RoleGranted`
    Granted,
    /// `RoleRevoked`
    Revoked,
}

/// A decoded `RoleGranted` or `RoleRevoked` log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleEvent {
    /// Where the log was emitted.
    pub position: LogPosition,
    /// Grant or revoke.
    pub kind: RoleEventKind,
    /// The role identifier.
    pub role: B256,
    /// The affected account.
    pub account: Address,
}

impl RoleEvent {
    /// Creates a grant event.
    pub const fn granted(position: LogPosition, role: B256, account: Address) -> Self {
        Self { position, kind: RoleEventKind::Granted, role, account }
    }

    /// Creates a revoke event.
    pub const fn revoked(position: LogPosition, role: B256, account: Address) -> Self {
        Self { position, kind: RoleEventKind::Revoked, role, account }
    }
}

/// The role holders of an access controlled contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RoleGrants {
    /// No role was ever granted.
    NoPrivilegedAccounts,
    /// The roles currently held by each account. Accounts without roles are omitted.
    Accounts(BTreeMap<Address, BTreeSet<B256>>),
}

impl RoleGrants {
    /// Folds role events in chain order.
    ///
    /// Events are sorted by [`LogPosition`] first, so the result does not depend on the order
    /// they were fetched in.
    pub fn replay(events: impl IntoIterator<Item = RoleEvent>) -> Self {
        let mut events: Vec<_> = events.into_iter().collect();
        if !events.iter().any(|event| event.kind == RoleEventKind::Granted) {
            return Self::NoPrivilegedAccounts;
        }
        events.sort_by_key(|event| event.position);

        let mut accounts: BTreeMap<Address, BTreeSet<B256>> = BTreeMap::new();
        for event in events {
            match event.kind {
                RoleEventKind::Granted => {
                    accounts.entry(event.account).or_default().insert(event.role);
                }
                RoleEventKind::Revoked => {
                    if let Some(roles) = accounts.get_mut(&event.account) {
                        roles.remove(&event.role);
                        if roles.is_empty() {
                            accounts.remove(&event.account);
                        }
                    }
                }
            }
        }
        Self::Accounts(accounts)
    }

    /// Returns `true` if `account` currently holds `role`.
    pub fn has_role(&self, account: Address, role: &B256) -> bool {
        match self {
            Self::NoPrivilegedAccounts => false,
            Self::Accounts(accounts) => {
                accounts.get(&account).is_some_and(|roles| roles.contains(role))
            }
        }
    }

    /// The accounts currently holding `role`, in address order.
    pub fn holders(&self, role: &B256) -> Vec<Address> {
        match self {
            Self::NoPrivilegedAccounts => Vec::new(),
            Self::Accounts(accounts) => accounts
                .iter()
                .filter(|(_, roles)| roles.contains(role))
                .map(|(account, _)| *account)
                .collect(),
        }
    }
}

fn decode_role_log<E: SolEvent>(
    log: &Log,
    into_event: impl FnOnce(LogPosition, E) -> RoleEvent,
) -> Result<RoleEvent, String> {
    let position =
        LogPosition::of(log).ok_or_else(|| format!("{} log without position", E::SIGNATURE))?;
    let event = E::decode_log_data(&log.inner.data)
        .map_err(|err| format!("{} at {position}: {err}", E::SIGNATURE))?;
    Ok(into_event(position, event))
}

/// Replays the `RoleGranted` and `RoleRevoked` history of `contract`.
pub async fn role_grants_of<C: ChainClient + ?Sized>(
    client: &C,
    contract: Address,
    range: BlockRange,
) -> AuditResult<RoleGrants> {
    let granted =
        LogQuery::new(IAccessControl::RoleGranted::SIGNATURE_HASH).address(contract).range(range);
    let revoked =
        LogQuery::new(IAccessControl::RoleRevoked::SIGNATURE_HASH).address(contract).range(range);
    let granted = client
        .get_logs(granted)
        .await
        .map_err(|err| AuditError::call(format!("RoleGranted logs of {contract}"), err))?;
    let revoked = client
        .get_logs(revoked)
        .await
        .map_err(|err| AuditError::call(format!("RoleRevoked logs of {contract}"), err))?;

    let mut failures = Vec::new();
    let mut events = Vec::with_capacity(granted.len() + revoked.len());
    let decoded = granted
        .iter()
        .map(|log| {
            decode_role_log(log, |position, event: IAccessControl::RoleGranted| {
                RoleEvent::granted(position, event.role, event.account)
            })
        })
        .chain(revoked.iter().map(|log| {
            decode_role_log(log, |position, event: IAccessControl::RoleRevoked| {
                RoleEvent::revoked(position, event.role, event.account)
            })
        }));
    for event in decoded {
        match event {
            Ok(event) => events.push(event),
            Err(failure) => failures.push(failure),
        }
    }

    if !failures.is_empty() {
        return Err(AuditError::decode(format!("role history of {contract}"), failures));
    }

    debug!(target: "graph", %contract, events = events.len(), "Replaying role history");
    Ok(RoleGrants::replay(events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChainClient;
    use orbit_abi::{ADMIN_ROLE, EXECUTOR_ROLE};
    use rstest::rstest;

    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);

    const fn at(block_number: u64, log_index: u64) -> LogPosition {
        LogPosition { block_number, log_index }
    }

    #[rstest]
    #[case::chain_order(false)]
    #[case::reversed_arrival(true)]
    fn test_revoke_after_grant_wins_regardless_of_arrival(#[case] reversed: bool) {
        let mut events = vec![
            RoleEvent::granted(at(10, 0), *EXECUTOR_ROLE, ALICE),
            RoleEvent::revoked(at(12, 0), *EXECUTOR_ROLE, ALICE),
        ];
        if reversed {
            events.reverse();
        }

        let grants = RoleGrants::replay(events);
        assert!(!grants.has_role(ALICE, &EXECUTOR_ROLE));
        assert_eq!(grants, RoleGrants::Accounts(BTreeMap::new()));
    }

    #[test]
    fn test_replay_is_idempotent() {
        let events = vec![
            RoleEvent::granted(at(10, 1), *ADMIN_ROLE, ALICE),
            RoleEvent::granted(at(10, 2), *EXECUTOR_ROLE, BOB),
            RoleEvent::revoked(at(11, 0), *ADMIN_ROLE, BOB),
        ];
        assert_eq!(RoleGrants::replay(events.clone()), RoleGrants::replay(events));
    }

    #[test]
    fn test_regrant_after_revoke() {
        let grants = RoleGrants::replay([
            RoleEvent::granted(at(1, 0), *ADMIN_ROLE, ALICE),
            RoleEvent::revoked(at(2, 0), *ADMIN_ROLE, ALICE),
            RoleEvent::granted(at(3, 0), *ADMIN_ROLE, ALICE),
        ]);
        assert_eq!(grants.holders(&ADMIN_ROLE), vec![ALICE]);
    }

    #[test]
    fn test_no_grants_means_no_privileged_accounts() {
        assert_eq!(RoleGrants::replay([]), RoleGrants::NoPrivilegedAccounts);
        assert_eq!(
            RoleGrants::replay([RoleEvent::revoked(at(1, 0), *ADMIN_ROLE, ALICE)]),
            RoleGrants::NoPrivilegedAccounts
        );
    }

    #[tokio::test]
    async fn test_role_grants_of_replays_logs() {
        let executor = Address::repeat_byte(0x07);
        let client = MockChainClient::default()
            .with_event(
                executor,
                &IAccessControl::RoleGranted { role: *EXECUTOR_ROLE, account: ALICE, sender: BOB },
                10,
                0,
            )
            .with_event(
                executor,
                &IAccessControl::RoleRevoked { role: *EXECUTOR_ROLE, account: ALICE, sender: BOB },
                12,
                0,
            )
            .with_event(
                executor,
                &IAccessControl::RoleGranted { role: *ADMIN_ROLE, account: BOB, sender: BOB },
                12,
                1,
            );

        let grants = role_grants_of(&client, executor, BlockRange::FULL).await.unwrap();
        assert!(!grants.has_role(ALICE, &EXECUTOR_ROLE));
        assert!(grants.has_role(BOB, &ADMIN_ROLE));
        assert!(grants.holders(&EXECUTOR_ROLE).is_empty());
    }

    #[tokio::test]
    async fn test_role_grants_of_failed_query() {
        let executor = Address::repeat_byte(0x07);
        let client = MockChainClient::default().failing(executor);
        assert!(matches!(
            role_grants_of(&client, executor, BlockRange::FULL).await,
            Err(AuditError::Call { .. })
        ));
    }
}
