//! Eligibility gate and per-call settlement eligibility.
//!
//! The secondary stream may only release while the accumulator reports
//! eligible recipients. While the gate is closed the stream is frozen:
//! neither `remaining` nor `last_settlement` moves, so the frozen time is
//! released in full by the first settlement after the gate reopens.

use drip_core::types::{Stream, StreamId};

/// Whether the gate lets `stream` settle.
pub fn gate_open(stream: StreamId, has_recipients: bool) -> bool {
    !stream.is_gated() || has_recipients
}

/// Whether the permissionless trigger may settle `stream` at `now`.
pub fn can_settle(id: StreamId, stream: &Stream, now: u64, min_interval: u64, has_recipients: bool) -> bool {
    stream.is_due(now, min_interval) && gate_open(id, has_recipients)
}

/// Settlement eligibility of both streams for one trigger call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Eligibility {
    pub primary: bool,
    pub secondary: bool,
}

impl Eligibility {
    pub fn get(&self, id: StreamId) -> bool {
        match id {
            StreamId::Primary => self.primary,
            StreamId::Secondary => self.secondary,
        }
    }

    pub fn set(&mut self, id: StreamId, value: bool) {
        match id {
            StreamId::Primary => self.primary = value,
            StreamId::Secondary => self.secondary = value,
        }
    }

    pub fn any(&self) -> bool {
        self.primary || self.secondary
    }

    pub fn as_tuple(&self) -> (bool, bool) {
        (self.primary, self.secondary)
    }
}
