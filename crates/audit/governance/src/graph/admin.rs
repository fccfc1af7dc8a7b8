//! EIP-1967 admin lookups.

use crate::{AuditError, AuditResult, ChainClient};
use alloy_primitives::Address;
use orbit_abi::PROXY_ADMIN_SLOT;

/// Reads the current admin of a transparent proxy from its EIP-1967 admin slot.
///
/// Returns `None` when the slot is empty.
pub async fn admin_of<C: ChainClient + ?Sized>(
    client: &C,
    contract: Address,
) -> AuditResult<Option<Address>> {
    let word = client
        .get_storage_at(contract, PROXY_ADMIN_SLOT)
        .await
        .map_err(|err| AuditError::call(format!("admin slot of {contract}"), err))?;

    let admin = Address::from_word(word);
    trace!(target: "graph", %contract, %admin, "Read proxy admin slot");
    Ok((!admin.is_zero()).then_some(admin))
}
