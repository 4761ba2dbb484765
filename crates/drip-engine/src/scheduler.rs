//! The drip scheduler: owner configuration, permissionless trigger, recovery.
//!
//! Every operation follows the same shape:
//! 1. check access and validate inputs,
//! 2. run the ledger transition on a copy,
//! 3. submit all resulting transfers to the treasury as one atomic batch,
//! 4. commit the copy, notify the accumulator, record events.
//!
//! A failure at any step before 4 leaves the ledger and balances exactly as
//! they were.

use drip_core::error::{SchedulerError, ValidationError};
use drip_core::traits::{AccessControl, Accumulator, Treasury};
use drip_core::types::{AccountId, AssetId, DripEvent, Stream, StreamId, Transfer};
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::gate::gate_open;
use crate::ledger::{Releases, StreamLedger};

/// Asset distributed by each stream. The two must differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamAssets {
    pub primary: AssetId,
    pub secondary: AssetId,
}

impl StreamAssets {
    pub fn get(&self, id: StreamId) -> AssetId {
        match id {
            StreamId::Primary => self.primary,
            StreamId::Secondary => self.secondary,
        }
    }

    /// The stream distributing `asset`, if any.
    pub fn stream_of(&self, asset: &AssetId) -> Option<StreamId> {
        StreamId::ALL.into_iter().find(|id| self.get(*id) == *asset)
    }
}

pub struct DripScheduler<T, A, C> {
    config: SchedulerConfig,
    /// Account holding the undistributed value of both streams.
    custody: AccountId,
    assets: StreamAssets,
    treasury: T,
    accumulator: A,
    access: C,
    ledger: StreamLedger,
    events: Vec<DripEvent>,
}

impl<T, A, C> DripScheduler<T, A, C>
where
    T: Treasury,
    A: Accumulator,
    C: AccessControl,
{
    /// Create a scheduler with two empty streams.
    ///
    /// # Errors
    ///
    /// [`ValidationError::DuplicateAsset`] if both streams use the same asset.
    pub fn new(
        config: SchedulerConfig,
        custody: AccountId,
        assets: StreamAssets,
        treasury: T,
        accumulator: A,
        access: C,
    ) -> Result<Self, SchedulerError> {
        if assets.primary == assets.secondary {
            return Err(ValidationError::DuplicateAsset(assets.primary).into());
        }
        Ok(Self {
            config,
            custody,
            assets,
            treasury,
            accumulator,
            access,
            ledger: StreamLedger::new(),
            events: Vec::new(),
        })
    }

    /// Resume from a previously saved ledger.
    pub fn with_ledger(mut self, ledger: StreamLedger) -> Self {
        self.ledger = ledger;
        self
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Top up `stream` by `amount` pulled from the owner and extend its end.
    ///
    /// Pending value of that stream is settled first, regardless of the
    /// trigger throttle. Returns the amount settled.
    pub fn configure(
        &mut self,
        caller: AccountId,
        stream: StreamId,
        amount: u64,
        end: u64,
        now: u64,
    ) -> Result<u64, SchedulerError> {
        self.ensure_owner(&caller)?;

        let open = gate_open(stream, self.accumulator.has_eligible_recipients());
        let mut staged = self.ledger;
        let released = staged.configure(stream, amount, end, now, open)?;

        let asset = self.assets.get(stream);
        let mut batch = vec![Transfer::new(asset, caller, self.custody, amount)];
        if released > 0 {
            batch.push(Transfer::new(asset, self.custody, self.accumulator.account(), released));
        }
        self.treasury.execute(&batch)?;

        self.ledger = staged;
        if released > 0 {
            self.deliver(stream, released, now);
        } else if !open {
            debug!(%stream, "no eligible recipients, pending value stays frozen");
        }

        let new_end = self.ledger.get(stream).end;
        info!(%stream, amount, end = new_end, "stream configured");
        self.events.push(DripEvent::Configured { stream, amount, end: new_end, at: now });
        Ok(released)
    }

    /// Permissionless trigger: settle every stream that is due.
    ///
    /// # Errors
    ///
    /// [`ThrottleError::NothingToDrip`](drip_core::error::ThrottleError::NothingToDrip)
    /// if neither stream can settle at `now`.
    pub fn drip(&mut self, now: u64) -> Result<Releases, SchedulerError> {
        let has_recipients = self.accumulator.has_eligible_recipients();
        let mut staged = self.ledger;
        let releases = staged.drip(now, self.config.min_interval_secs, has_recipients)?;

        let batch: Vec<Transfer> = StreamId::ALL
            .into_iter()
            .filter(|id| releases.get(*id) > 0)
            .map(|id| {
                Transfer::new(self.assets.get(id), self.custody, self.accumulator.account(), releases.get(id))
            })
            .collect();
        self.treasury.execute(&batch)?;

        self.ledger = staged;
        for id in StreamId::ALL {
            let amount = releases.get(id);
            if amount > 0 {
                self.deliver(id, amount, now);
            }
        }
        if !has_recipients && !self.ledger.get(StreamId::Secondary).is_drained() {
            debug!("secondary stream frozen: no eligible recipients");
        }
        Ok(releases)
    }

    /// Withdraw `amount` of `asset` from custody to the owner.
    ///
    /// If `asset` belongs to a stream, that stream settles pending value
    /// first and its `remaining` drops by at most what is left. The transfer
    /// itself is not capped, so surplus custody balance can be recovered.
    /// Returns the amount deducted from the stream's `remaining`.
    pub fn recover(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        amount: u64,
        now: u64,
    ) -> Result<u64, SchedulerError> {
        self.ensure_owner(&caller)?;
        if amount == 0 {
            return Err(ValidationError::ZeroAmount.into());
        }

        let stream = self.assets.stream_of(&asset);
        let mut staged = self.ledger;
        let mut batch = Vec::with_capacity(2);
        let outcome = match stream {
            Some(id) => {
                let open = gate_open(id, self.accumulator.has_eligible_recipients());
                let outcome = staged.recover(id, amount, now, open);
                if outcome.released > 0 {
                    batch.push(Transfer::new(asset, self.custody, self.accumulator.account(), outcome.released));
                }
                outcome
            }
            None => Default::default(),
        };
        batch.push(Transfer::new(asset, self.custody, caller, amount));
        self.treasury.execute(&batch)?;

        self.ledger = staged;
        if let Some(id) = stream {
            if outcome.released > 0 {
                self.deliver(id, outcome.released, now);
            }
            if outcome.accounted < amount {
                warn!(
                    stream = %id,
                    amount,
                    accounted = outcome.accounted,
                    "recovered more than the stream had remaining"
                );
            }
        }

        info!(%asset, amount, accounted = outcome.accounted, "custody recovered");
        self.events.push(DripEvent::Recovered {
            asset,
            amount,
            stream,
            accounted: outcome.accounted,
            at: now,
        });
        Ok(outcome.accounted)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// `(primary, secondary)` amounts [`drip`](Self::drip) would release at `now`.
    pub fn preview_drip(&self, now: u64) -> (u64, u64) {
        self.ledger
            .preview(now, self.config.min_interval_secs, self.accumulator.has_eligible_recipients())
            .as_tuple()
    }

    /// `(primary, secondary)` settlement eligibility at `now`.
    pub fn can_drip(&self, now: u64) -> (bool, bool) {
        self.ledger
            .eligibility(now, self.config.min_interval_secs, self.accumulator.has_eligible_recipients())
            .as_tuple()
    }

    pub fn stream_state(&self, stream: StreamId) -> Stream {
        *self.ledger.get(stream)
    }

    pub fn ledger(&self) -> &StreamLedger {
        &self.ledger
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn assets(&self) -> &StreamAssets {
        &self.assets
    }

    /// Actual custody balance of `asset`, which may exceed the accounted
    /// `remaining` if stray value was sent to custody.
    pub fn custody_balance(&self, asset: &AssetId) -> u64 {
        self.treasury.balance_of(asset, &self.custody)
    }

    pub fn events(&self) -> &[DripEvent] {
        &self.events
    }

    /// Drain the recorded events.
    pub fn take_events(&mut self) -> Vec<DripEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn treasury(&self) -> &T {
        &self.treasury
    }

    pub fn treasury_mut(&mut self) -> &mut T {
        &mut self.treasury
    }

    pub fn accumulator(&self) -> &A {
        &self.accumulator
    }

    pub fn accumulator_mut(&mut self) -> &mut A {
        &mut self.accumulator
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_owner(&self, caller: &AccountId) -> Result<(), SchedulerError> {
        if self.access.is_owner(caller) {
            Ok(())
        } else {
            Err(SchedulerError::Unauthorized(*caller))
        }
    }

    /// Notify the accumulator of value already transferred to it.
    fn deliver(&mut self, stream: StreamId, amount: u64, now: u64) {
        match stream {
            StreamId::Primary => self.accumulator.accept_primary(amount),
            StreamId::Secondary => self.accumulator.accept_secondary(amount),
        }
        info!(%stream, amount, "dripped");
        self.events.push(DripEvent::Dripped { stream, amount, at: now });
    }
}
