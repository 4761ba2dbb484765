//! Trigger-bot simulation against in-memory collaborators.
//!
//! Both streams are configured once at `start` to end `days` later. A bot
//! then calls the trigger on a jittered cadence until both streams drain or
//! a horizon well past the end is reached. An optional outage window drops
//! the eligible weight to zero, freezing the secondary stream.

use anyhow::{Context, Result};
use drip_core::constants::SECONDS_PER_DAY;
use drip_core::error::SchedulerError;
use drip_core::memory::{MemoryAccumulator, MemoryTreasury, SingleOwner};
use drip_core::types::{AccountId, AssetId, DripEvent, StreamId};
use drip_engine::{DripScheduler, SchedulerConfig, StreamAssets, StreamLedger};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

const OWNER: AccountId = AccountId::from_byte(0x01);
const CUSTODY: AccountId = AccountId::from_byte(0x02);
const ACCUMULATOR: AccountId = AccountId::from_byte(0x03);
const PRIMARY_ASSET: AssetId = AssetId::from_byte(0xA1);
const SECONDARY_ASSET: AssetId = AssetId::from_byte(0xA2);

/// Extra time after the scheduled end the bot keeps running.
const HORIZON_SECS: u64 = 30 * SECONDS_PER_DAY;

/// Days during which no recipients are eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outage {
    pub start_day: u64,
    pub days: u64,
}

impl Outage {
    /// `[from, until)` in unix seconds, `None` if it does not fit in u64.
    fn window(&self, start: u64) -> Option<(u64, u64)> {
        let from = start.checked_add(self.start_day.checked_mul(SECONDS_PER_DAY)?)?;
        let until = from.checked_add(self.days.checked_mul(SECONDS_PER_DAY)?)?;
        Some((from, until))
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub start: u64,
    pub days: u64,
    pub primary_amount: u64,
    pub secondary_amount: u64,
    /// Average seconds between trigger calls.
    pub cadence_secs: u64,
    /// Maximum deviation from the cadence, either way.
    pub jitter_secs: u64,
    pub weight: u64,
    pub outage: Option<Outage>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub stream: StreamId,
    pub configured: u64,
    pub delivered: u128,
    pub remaining: u64,
    pub settlements: u64,
    pub drained_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub start: u64,
    pub end: u64,
    pub finished_at: u64,
    pub min_interval_secs: u64,
    pub triggers: u64,
    pub throttled: u64,
    /// Trigger calls made while the eligible weight was zero.
    pub ineligible_triggers: u64,
    pub outage: Option<Outage>,
    pub streams: Vec<StreamSummary>,
}

pub struct Outcome {
    pub summary: Summary,
    pub ledger: StreamLedger,
}

impl Scenario {
    pub fn run(&self, config: SchedulerConfig) -> Result<Outcome> {
        let end = self
            .days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|secs| self.start.checked_add(secs))
            .context("schedule end does not fit in u64 seconds, reduce --days or --start")?;
        let horizon = end
            .checked_add(HORIZON_SECS)
            .context("simulation horizon does not fit in u64 seconds, reduce --days or --start")?;
        let outage = match self.outage {
            Some(o) => Some(
                o.window(self.start)
                    .context("outage window does not fit in u64 seconds, reduce --outage-start or --outage-days")?,
            ),
            None => None,
        };

        let mut treasury = MemoryTreasury::new();
        treasury.mint(PRIMARY_ASSET, OWNER, self.primary_amount)?;
        treasury.mint(SECONDARY_ASSET, OWNER, self.secondary_amount)?;
        let mut scheduler = DripScheduler::new(
            config,
            CUSTODY,
            StreamAssets { primary: PRIMARY_ASSET, secondary: SECONDARY_ASSET },
            treasury,
            MemoryAccumulator::new(ACCUMULATOR, self.weight),
            SingleOwner(OWNER),
        )?;

        let mut streams: Vec<StreamSummary> = StreamId::ALL
            .into_iter()
            .map(|stream| StreamSummary {
                stream,
                configured: 0,
                delivered: 0,
                remaining: 0,
                settlements: 0,
                drained_at: None,
            })
            .collect();

        for (id, amount) in [
            (StreamId::Primary, self.primary_amount),
            (StreamId::Secondary, self.secondary_amount),
        ] {
            if amount == 0 {
                continue;
            }
            self.apply_weight(&mut scheduler, outage, self.start);
            scheduler
                .configure(OWNER, id, amount, end, self.start)
                .with_context(|| format!("configuring {id} stream"))?;
            streams[id as usize].configured = amount;
        }
        scheduler.take_events();

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut now = self.start;
        let mut triggers = 0u64;
        let mut throttled = 0u64;
        let mut ineligible_triggers = 0u64;

        while now < horizon && !scheduler.ledger().iter().all(|(_, s)| s.is_drained()) {
            now = now.saturating_add(self.next_step(&mut rng));
            if self.apply_weight(&mut scheduler, outage, now) == 0 {
                ineligible_triggers += 1;
            }

            triggers += 1;
            match scheduler.drip(now) {
                Ok(releases) => {
                    debug!(now, primary = releases.primary, secondary = releases.secondary, "trigger settled");
                }
                Err(SchedulerError::Throttle(_)) => throttled += 1,
                Err(e) => return Err(e).context("trigger failed"),
            }

            for event in scheduler.take_events() {
                if let DripEvent::Dripped { stream, amount, at } = event {
                    let summary = &mut streams[stream as usize];
                    summary.delivered += amount as u128;
                    summary.settlements += 1;
                    if scheduler.stream_state(stream).is_drained() {
                        summary.drained_at = Some(at);
                    }
                }
            }
        }

        for summary in &mut streams {
            summary.remaining = scheduler.stream_state(summary.stream).remaining;
        }

        info!(triggers, throttled, ineligible_triggers, "simulation finished");

        Ok(Outcome {
            summary: Summary {
                start: self.start,
                end,
                finished_at: now,
                min_interval_secs: scheduler.config().min_interval_secs,
                triggers,
                throttled,
                ineligible_triggers,
                outage: self.outage,
                streams,
            },
            ledger: *scheduler.ledger(),
        })
    }

    /// Seconds until the next trigger, uniform in `cadence ± jitter`, at least 1.
    fn next_step(&self, rng: &mut StdRng) -> u64 {
        let low = self.cadence_secs.saturating_sub(self.jitter_secs);
        let high = self.cadence_secs.saturating_add(self.jitter_secs);
        rng.gen_range(low..=high).max(1)
    }

    /// Set the accumulator weight for `now` and return it.
    fn apply_weight(
        &self,
        scheduler: &mut DripScheduler<MemoryTreasury, MemoryAccumulator, SingleOwner>,
        outage: Option<(u64, u64)>,
        now: u64,
    ) -> u64 {
        let weight = match outage {
            Some((from, until)) if now >= from && now < until => 0,
            _ => self.weight,
        };
        scheduler.accumulator_mut().set_weight(weight);
        weight
    }
}
