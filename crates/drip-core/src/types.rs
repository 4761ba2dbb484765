//! Core scheduler types: identities, streams, transfers, events.
//!
//! All amounts are in base units of the stream's asset and all timestamps
//! are Unix seconds. Both are u64; products are widened to u128.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte account identity (owner, scheduler custody, accumulator).
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Identity with every byte set to `byte`. Handy for fixtures and tooling.
    pub const fn from_byte(byte: u8) -> Self {
        Self([byte; 32])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A 32-byte asset identifier.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct AssetId(pub [u8; 32]);

impl AssetId {
    pub const fn from_byte(byte: u8) -> Self {
        Self([byte; 32])
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Which of the two streams an operation targets.
///
/// There are always exactly two. They share the settlement math; the only
/// behavioral difference is that the secondary stream is gated on the
/// accumulator having eligible recipients.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum StreamId {
    Primary,
    Secondary,
}

impl StreamId {
    pub const ALL: [StreamId; 2] = [StreamId::Primary, StreamId::Secondary];

    /// Whether settlement of this stream requires eligible recipients.
    pub fn is_gated(&self) -> bool {
        matches!(self, Self::Secondary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schedule state of one stream.
///
/// A stream starts empty and persists at `remaining == 0` once drained so it
/// can be reconfigured later.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Stream {
    /// When the current schedule began.
    pub start: u64,
    /// Deadline by which `remaining` reaches zero. Only ever moves forward.
    pub end: u64,
    /// Timestamp of the most recent nonzero settlement.
    pub last_settlement: u64,
    /// Undistributed amount held in custody.
    pub remaining: u64,
}

impl Stream {
    pub fn is_drained(&self) -> bool {
        self.remaining == 0
    }

    /// Seconds since the last settlement, zero if `now` is not after it.
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_settlement)
    }

    /// Whether the throttle allows the trigger to settle this stream at `now`.
    ///
    /// Requires a nonzero balance and at least `min_interval` seconds since
    /// the last settlement. Eligibility gating is checked separately.
    pub fn is_due(&self, now: u64, min_interval: u64) -> bool {
        !self.is_drained() && now >= self.last_settlement && self.elapsed(now) >= min_interval
    }
}

/// A single movement of value between two accounts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub asset: AssetId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: u64,
}

impl Transfer {
    pub fn new(asset: AssetId, from: AccountId, to: AccountId, amount: u64) -> Self {
        Self { asset, from, to, amount }
    }
}

/// Record emitted by every state-changing scheduler operation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DripEvent {
    /// A stream was topped up and/or extended.
    Configured { stream: StreamId, amount: u64, end: u64, at: u64 },
    /// A stream released `amount` into the accumulator.
    Dripped { stream: StreamId, amount: u64, at: u64 },
    /// The owner withdrew `amount` of `asset` from custody.
    ///
    /// `accounted` is the part deducted from the matching stream's
    /// `remaining`; it is zero for unrelated assets and may be less than
    /// `amount` when surplus custody balance is recovered.
    Recovered { asset: AssetId, amount: u64, stream: Option<StreamId>, accounted: u64, at: u64 },
}

impl DripEvent {
    pub fn stream(&self) -> Option<StreamId> {
        match self {
            Self::Configured { stream, .. } | Self::Dripped { stream, .. } => Some(*stream),
            Self::Recovered { stream, .. } => *stream,
        }
    }
}
