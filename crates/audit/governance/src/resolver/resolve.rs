//! Variant-tolerant decoding of logs and calldata.

use super::{CallSchema, EventSchema};
use crate::{AuditError, AuditResult, BlockRange, ChainClient, LogQuery};
use alloy_primitives::{Address, B256};
use alloy_rpc_types_eth::Log;
use derive_more::Display;
use serde::Serialize;

/// The position of a log within the chain.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[display("block {block_number} log {log_index}")]
pub struct LogPosition {
    /// The block the log was emitted in.
    pub block_number: u64,
    /// The index of the log within its block.
    pub log_index: u64,
}

impl LogPosition {
    /// Reads the position of a mined log. Pending logs have none.
    pub const fn of(log: &Log) -> Option<Self> {
        match (log.block_number, log.log_index) {
            (Some(block_number), Some(log_index)) => Some(Self { block_number, log_index }),
            _ => None,
        }
    }
}

/// Something that happened at a [`LogPosition`].
pub trait Positioned {
    /// Where it happened, if known.
    fn position(&self) -> Option<LogPosition>;
}

/// A successful decode, tagged with the variant that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded<V, T> {
    /// The matching schema variant.
    pub variant: V,
    /// The decoded value.
    pub value: T,
    /// Where the log was emitted. `None` for calldata.
    pub position: Option<LogPosition>,
    /// The transaction that emitted the log. `None` for calldata.
    pub transaction_hash: Option<B256>,
}

impl<V, T> Positioned for Decoded<V, T> {
    fn position(&self) -> Option<LogPosition> {
        self.position
    }
}

/// A variant that matched by topic or selector but could not be decoded.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[display("{variant}: {reason}")]
pub struct DecodeFailure {
    /// The attempted variant.
    pub variant: String,
    /// Why the attempt failed.
    pub reason: String,
}

impl DecodeFailure {
    fn new(variant: impl core::fmt::Debug, reason: impl ToString) -> Self {
        Self { variant: format!("{variant:?}"), reason: reason.to_string() }
    }
}

/// The outcome of resolving data against a set of schema variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<V, T> {
    /// A variant matched and decoded.
    Decoded(Decoded<V, T>),
    /// At least one variant matched, every attempt failed.
    Undecodable(Vec<DecodeFailure>),
    /// Nothing matched any variant.
    Absent,
}

impl<V, T> Resolution<V, T> {
    /// Converts into an [`AuditResult`], describing the data as `what` on failure.
    pub fn into_result(self, what: &str) -> AuditResult<Decoded<V, T>> {
        match self {
            Self::Decoded(decoded) => Ok(decoded),
            Self::Undecodable(failures) => {
                Err(AuditError::decode(what, failures.iter().map(ToString::to_string).collect()))
            }
            Self::Absent => Err(AuditError::not_found(what)),
        }
    }

    /// Returns the decoded value, if any.
    pub const fn decoded(&self) -> Option<&Decoded<V, T>> {
        match self {
            Self::Decoded(decoded) => Some(decoded),
            _ => None,
        }
    }
}

fn topic0(log: &Log) -> Option<&B256> {
    log.inner.data.topics().first()
}

/// Decodes the first log matching one of `variants`, trying variants in order.
///
/// A variant whose topic was already attempted by an earlier variant is skipped.
pub fn decode_first<E: EventSchema>(logs: &[Log], variants: &[E]) -> Resolution<E, E::Output> {
    let mut attempted = Vec::with_capacity(variants.len());
    let mut failures = Vec::new();

    for variant in variants {
        let topic = variant.topic();
        if attempted.contains(&topic) {
            continue;
        }
        let Some(log) = logs.iter().find(|log| topic0(log) == Some(&topic)) else {
            continue;
        };
        attempted.push(topic);

        match variant.decode(&log.inner) {
            Ok(value) => {
                return Resolution::Decoded(Decoded {
                    variant: *variant,
                    value,
                    position: LogPosition::of(log),
                    transaction_hash: log.transaction_hash,
                });
            }
            Err(err) => {
                warn!(target: "resolver", ?variant, %topic, %err, "Log matched but failed to decode");
                failures.push(DecodeFailure::new(variant, err));
            }
        }
    }

    if failures.is_empty() { Resolution::Absent } else { Resolution::Undecodable(failures) }
}

/// Queries `address` once per variant and decodes the first matching log.
///
/// A failing query counts as a failed attempt of its variant and the scan moves on.
pub async fn find_and_decode<C, E>(
    client: &C,
    address: Address,
    variants: &[E],
    range: BlockRange,
) -> Resolution<E, E::Output>
where
    C: ChainClient + ?Sized,
    E: EventSchema,
{
    let mut attempted = Vec::with_capacity(variants.len());
    let mut failures = Vec::new();

    for variant in variants {
        let topic = variant.topic();
        if attempted.contains(&topic) {
            continue;
        }
        attempted.push(topic);

        let logs = match client.get_logs(LogQuery::new(topic).address(address).range(range)).await {
            Ok(logs) => logs,
            Err(err) => {
                warn!(target: "resolver", ?variant, %address, %err, "Log query failed");
                failures.push(DecodeFailure::new(variant, err));
                continue;
            }
        };

        match decode_first(&logs, core::slice::from_ref(variant)) {
            Resolution::Decoded(decoded) => return Resolution::Decoded(decoded),
            Resolution::Undecodable(mut failed) => failures.append(&mut failed),
            Resolution::Absent => {}
        }
    }

    if failures.is_empty() { Resolution::Absent } else { Resolution::Undecodable(failures) }
}

/// Decodes calldata against the first variant whose selector matches.
pub fn decode_call_input<S: CallSchema>(variants: &[S], input: &[u8]) -> Resolution<S, S::Output> {
    let Some(selector) = input.get(..4) else {
        return Resolution::Absent;
    };

    let mut failures = Vec::new();
    for variant in variants.iter().filter(|variant| variant.selector() == selector) {
        match variant.decode(input) {
            Ok(value) => {
                return Resolution::Decoded(Decoded {
                    variant: *variant,
                    value,
                    position: None,
                    transaction_hash: None,
                });
            }
            Err(err) => {
                warn!(target: "resolver", ?variant, %err, "Calldata matched but failed to decode");
                failures.push(DecodeFailure::new(variant, err));
            }
        }
    }

    if failures.is_empty() { Resolution::Absent } else { Resolution::Undecodable(failures) }
}

/// Returns the chronologically latest item. Ties go to the one encountered first.
pub fn latest_by_block<T: Positioned>(items: impl IntoIterator<Item = T>) -> Option<T> {
    items.into_iter().fold(None, |latest, item| match latest {
        Some(current) if item.position() <= current.position() => Some(current),
        _ => Some(item),
    })
}
