//! Error types for the drip scheduler.
use thiserror::Error;

use crate::types::{AccountId, AssetId};

/// Caller-fixable input errors, rejected before any state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("amount must be greater than zero")] ZeroAmount,
    #[error("end timestamp {end} is not after now ({now})")] EndTimestampInPast { end: u64, now: u64 },
    #[error("primary and secondary streams share asset {0}")] DuplicateAsset(AssetId),
}

/// Transient trigger errors. The caller should retry later.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThrottleError {
    #[error("nothing to drip")] NothingToDrip,
}

/// Value-movement failures, propagated verbatim from the treasury.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient balance of {asset} for {holder}: have {have}, need {need}")]
    InsufficientBalance { asset: AssetId, holder: AccountId, have: u64, need: u64 },
    #[error("account {0} is frozen")] Frozen(AccountId),
    #[error("balance overflow of {asset} for {holder}")] BalanceOverflow { asset: AssetId, holder: AccountId },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("io: {0}")] Io(String),
    #[error("encode: {0}")] Encode(String),
    #[error("decode: {0}")] Decode(String),
    #[error("trailing bytes after snapshot: {0}")] TrailingBytes(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error(transparent)] Validation(#[from] ValidationError),
    #[error(transparent)] Throttle(#[from] ThrottleError),
    #[error(transparent)] Transfer(#[from] TransferError),
    #[error("caller {0} is not the owner")] Unauthorized(AccountId),
    #[error("arithmetic overflow")] ArithmeticOverflow,
}
