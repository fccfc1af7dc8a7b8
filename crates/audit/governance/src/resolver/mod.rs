//! Event and calldata resolution against historical schema variants.
//!
//! Factory contracts changed their event and function shapes over time. A resolver is handed an
//! ordered list of variants, newest first, and reports which one matched, or why none did, as a
//! [`Resolution`] instead of an error.

mod schema;
pub use schema::{
    ArbitrumChainParams, CallSchema, ChainConfig, CreateRollupSchema, CreationParams, EventSchema,
    RollupCreatedRecord, RollupCreatedSchema,
};

mod resolve;
pub use resolve::{
    DecodeFailure, Decoded, LogPosition, Positioned, Resolution, decode_call_input, decode_first,
    find_and_decode, latest_by_block,
};
