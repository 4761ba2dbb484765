//! Test harness that tracks per-stream totals from the scheduler's events.

use drip_core::constants::SECONDS_PER_DAY;
use drip_core::error::SchedulerError;
use drip_core::memory::{MemoryAccumulator, MemoryTreasury, SingleOwner};
use drip_core::types::{AccountId, AssetId, DripEvent, StreamId};
use drip_engine::{DripScheduler, Releases, SchedulerConfig, StreamAssets};

pub const OWNER: AccountId = AccountId::from_byte(0x01);
pub const CUSTODY: AccountId = AccountId::from_byte(0x02);
pub const SINK: AccountId = AccountId::from_byte(0x03);
pub const STRANGER: AccountId = AccountId::from_byte(0x04);
pub const TOKEN_A: AssetId = AssetId::from_byte(0xAA);
pub const TOKEN_B: AssetId = AssetId::from_byte(0xBB);

/// A fixed, realistic starting timestamp.
pub const T0: u64 = 1_700_000_000;
pub const DAY: u64 = SECONDS_PER_DAY;

/// Owner balance minted per asset at setup.
pub const OWNER_FUNDS: u64 = 1 << 62;

pub type MemoryScheduler = DripScheduler<MemoryTreasury, MemoryAccumulator, SingleOwner>;

/// Cumulative flows of one stream, rebuilt from events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub configured: u128,
    pub delivered: u128,
    pub recovered: u128,
}

/// Scheduler plus the totals needed to check conservation after every call.
pub struct Harness {
    pub scheduler: MemoryScheduler,
    primary: Totals,
    secondary: Totals,
}

impl Harness {
    pub fn new(weight: u64) -> Self {
        Self::with_config(SchedulerConfig::default(), weight)
    }

    pub fn with_config(config: SchedulerConfig, weight: u64) -> Self {
        let mut treasury = MemoryTreasury::new();
        treasury.mint(TOKEN_A, OWNER, OWNER_FUNDS).unwrap();
        treasury.mint(TOKEN_B, OWNER, OWNER_FUNDS).unwrap();
        let scheduler = DripScheduler::new(
            config,
            CUSTODY,
            StreamAssets { primary: TOKEN_A, secondary: TOKEN_B },
            treasury,
            MemoryAccumulator::new(SINK, weight),
            SingleOwner(OWNER),
        )
        .unwrap();
        Self {
            scheduler,
            primary: Totals::default(),
            secondary: Totals::default(),
        }
    }

    pub fn totals(&self, id: StreamId) -> Totals {
        match id {
            StreamId::Primary => self.primary,
            StreamId::Secondary => self.secondary,
        }
    }

    fn totals_mut(&mut self, id: StreamId) -> &mut Totals {
        match id {
            StreamId::Primary => &mut self.primary,
            StreamId::Secondary => &mut self.secondary,
        }
    }

    pub fn set_weight(&mut self, weight: u64) {
        self.scheduler.accumulator_mut().set_weight(weight);
    }

    pub fn configure(&mut self, id: StreamId, amount: u64, end: u64, now: u64) -> Result<u64, SchedulerError> {
        let result = self.scheduler.configure(OWNER, id, amount, end, now);
        self.absorb_events();
        result
    }

    pub fn drip(&mut self, now: u64) -> Result<Releases, SchedulerError> {
        let result = self.scheduler.drip(now);
        self.absorb_events();
        result
    }

    pub fn recover(&mut self, asset: AssetId, amount: u64, now: u64) -> Result<u64, SchedulerError> {
        let result = self.scheduler.recover(OWNER, asset, amount, now);
        self.absorb_events();
        result
    }

    fn absorb_events(&mut self) {
        for event in self.scheduler.take_events() {
            match event {
                DripEvent::Configured { stream, amount, .. } => {
                    self.totals_mut(stream).configured += amount as u128;
                }
                DripEvent::Dripped { stream, amount, .. } => {
                    self.totals_mut(stream).delivered += amount as u128;
                }
                DripEvent::Recovered { stream: Some(stream), accounted, .. } => {
                    self.totals_mut(stream).recovered += accounted as u128;
                }
                DripEvent::Recovered { stream: None, .. } => {}
            }
        }
    }

    /// `delivered + recovered + remaining == configured` for both streams,
    /// and custody always covers what the ledger says it holds.
    pub fn check_conservation(&self) -> Result<(), String> {
        for id in StreamId::ALL {
            let t = self.totals(id);
            let remaining = self.scheduler.stream_state(id).remaining as u128;
            if t.delivered + t.recovered + remaining != t.configured {
                return Err(format!(
                    "{id}: delivered {} + recovered {} + remaining {remaining} != configured {}",
                    t.delivered, t.recovered, t.configured
                ));
            }
            let asset = self.scheduler.assets().get(id);
            let custody = self.scheduler.custody_balance(&asset) as u128;
            if remaining > custody {
                return Err(format!("{id}: remaining {remaining} exceeds custody {custody}"));
            }
        }

        let acc = self.scheduler.accumulator();
        if acc.received_primary() != self.primary.delivered {
            return Err("primary deliveries disagree with accumulator".to_string());
        }
        if acc.received_secondary() != self.secondary.delivered {
            return Err("secondary deliveries disagree with accumulator".to_string());
        }
        if acc.gate_violations() != 0 {
            return Err(format!("{} secondary deliveries with zero weight", acc.gate_violations()));
        }
        Ok(())
    }
}
