//! The two-stream ledger and its state transitions.
//!
//! [`StreamLedger`] holds exactly two [`Stream`]s in a fixed structure and
//! applies configuration, trigger, and recovery transitions to them. It moves
//! no value itself: each transition reports how much left `remaining` so the
//! scheduler can turn that into transfers. The scheduler runs transitions on
//! a copy and commits only after the transfers succeed.

use std::path::Path;

use drip_core::error::{SchedulerError, SnapshotError, ThrottleError, ValidationError};
use drip_core::types::{Stream, StreamId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gate::{can_settle, Eligibility};
use crate::settlement::{release_amount, settle};

/// Amounts released per stream by one operation (or a preview of one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Releases {
    pub primary: u64,
    pub secondary: u64,
}

impl Releases {
    pub fn get(&self, id: StreamId) -> u64 {
        match id {
            StreamId::Primary => self.primary,
            StreamId::Secondary => self.secondary,
        }
    }

    pub fn set(&mut self, id: StreamId, amount: u64) {
        match id {
            StreamId::Primary => self.primary = amount,
            StreamId::Secondary => self.secondary = amount,
        }
    }

    pub fn as_tuple(&self) -> (u64, u64) {
        (self.primary, self.secondary)
    }
}

/// Outcome of a recovery transition on a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecoveryOutcome {
    /// Pending value settled before the reduction.
    pub released: u64,
    /// Amount deducted from `remaining`, capped at what was left.
    pub accounted: u64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
pub struct StreamLedger {
    primary: Stream,
    secondary: Stream,
}

impl StreamLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_streams(primary: Stream, secondary: Stream) -> Self {
        Self { primary, secondary }
    }

    pub fn get(&self, id: StreamId) -> &Stream {
        match id {
            StreamId::Primary => &self.primary,
            StreamId::Secondary => &self.secondary,
        }
    }

    fn get_mut(&mut self, id: StreamId) -> &mut Stream {
        match id {
            StreamId::Primary => &mut self.primary,
            StreamId::Secondary => &mut self.secondary,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (StreamId, &Stream)> {
        StreamId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }

    /// Which streams the trigger may settle at `now`.
    pub fn eligibility(&self, now: u64, min_interval: u64, has_recipients: bool) -> Eligibility {
        let mut eligibility = Eligibility::default();
        for (id, stream) in self.iter() {
            eligibility.set(id, can_settle(id, stream, now, min_interval, has_recipients));
        }
        eligibility
    }

    /// What [`drip`](Self::drip) would release at `now`, without mutating.
    pub fn preview(&self, now: u64, min_interval: u64, has_recipients: bool) -> Releases {
        let eligibility = self.eligibility(now, min_interval, has_recipients);
        let mut releases = Releases::default();
        for (id, stream) in self.iter() {
            if eligibility.get(id) {
                releases.set(id, release_amount(stream, now));
            }
        }
        releases
    }

    /// Trigger transition: settle every stream that can settle.
    ///
    /// # Errors
    ///
    /// [`ThrottleError::NothingToDrip`] if neither stream can settle.
    pub fn drip(&mut self, now: u64, min_interval: u64, has_recipients: bool) -> Result<Releases, SchedulerError> {
        let eligibility = self.eligibility(now, min_interval, has_recipients);
        if !eligibility.any() {
            return Err(ThrottleError::NothingToDrip.into());
        }

        let mut releases = Releases::default();
        for id in StreamId::ALL {
            if !eligibility.get(id) {
                debug!(stream = %id, "stream skipped");
                continue;
            }
            releases.set(id, settle(self.get_mut(id), now));
        }
        Ok(releases)
    }

    /// Configuration transition: settle pending, then top up and extend.
    ///
    /// Returns the amount settled before the top-up. Settlement here ignores
    /// the trigger throttle; `gate_open` still decides whether a gated stream
    /// may settle.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ZeroAmount`] if `amount == 0`
    /// - [`ValidationError::EndTimestampInPast`] if `end <= now`
    /// - [`SchedulerError::ArithmeticOverflow`] if `remaining` would overflow
    pub fn configure(
        &mut self,
        id: StreamId,
        amount: u64,
        end: u64,
        now: u64,
        gate_open: bool,
    ) -> Result<u64, SchedulerError> {
        if amount == 0 {
            return Err(ValidationError::ZeroAmount.into());
        }
        if end <= now {
            return Err(ValidationError::EndTimestampInPast { end, now }.into());
        }

        let stream = self.get_mut(id);
        let was_drained = stream.is_drained();
        let released = if gate_open { settle(stream, now) } else { 0 };

        if was_drained {
            stream.start = now;
            stream.last_settlement = now;
        }
        stream.end = stream.end.max(end);
        stream.remaining = stream
            .remaining
            .checked_add(amount)
            .ok_or(SchedulerError::ArithmeticOverflow)?;

        Ok(released)
    }

    /// Recovery transition: settle pending, then deduct up to `amount`.
    pub fn recover(&mut self, id: StreamId, amount: u64, now: u64, gate_open: bool) -> RecoveryOutcome {
        let stream = self.get_mut(id);
        let released = if gate_open { settle(stream, now) } else { 0 };
        let accounted = amount.min(stream.remaining);
        stream.remaining -= accounted;
        RecoveryOutcome { released, accounted }
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let (ledger, read): (Self, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| SnapshotError::Decode(e.to_string()))?;
        if read != bytes.len() {
            return Err(SnapshotError::TrailingBytes(bytes.len() - read));
        }
        Ok(ledger)
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let bytes = self.encode()?;
        std::fs::write(path, bytes).map_err(|e| SnapshotError::Io(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let bytes = std::fs::read(path).map_err(|e| SnapshotError::Io(e.to_string()))?;
        Self::decode(&bytes)
    }
}
