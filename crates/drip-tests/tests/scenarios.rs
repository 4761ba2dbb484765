//! End-to-end scenarios against in-memory collaborators.

use drip_core::error::{SchedulerError, TransferError, ValidationError};
use drip_core::traits::Treasury;
use drip_core::types::{DripEvent, StreamId};
use drip_engine::{SchedulerConfig, StreamLedger};
use drip_tests::helpers::*;

// ---------------------------------------------------------------------------
// Linear release
// ---------------------------------------------------------------------------

#[test]
fn thousand_units_over_ten_days() {
    let mut h = Harness::new(1);
    h.configure(StreamId::Primary, 1000, T0 + 10 * DAY, T0).unwrap();

    assert_eq!(h.scheduler.preview_drip(T0 + 2 * DAY), (200, 0));
    assert_eq!(h.drip(T0 + 2 * DAY).unwrap().primary, 200);

    // 800 left over 8 days, 2 elapsed.
    assert_eq!(h.scheduler.preview_drip(T0 + 4 * DAY), (200, 0));
    assert_eq!(h.drip(T0 + 4 * DAY).unwrap().primary, 200);

    let last = h.drip(T0 + 15 * DAY).unwrap();
    assert_eq!(last.primary, 600);
    assert_eq!(h.scheduler.stream_state(StreamId::Primary).remaining, 0);
    assert_eq!(h.scheduler.treasury().balance_of(&TOKEN_A, &SINK), 1000);
    h.check_conservation().unwrap();
}

#[test]
fn hourly_bot_matches_single_late_call() {
    let mut bot = Harness::new(1);
    let mut lazy = Harness::new(1);
    let end = T0 + 7 * DAY;
    bot.configure(StreamId::Secondary, 123_456_789, end, T0).unwrap();
    lazy.configure(StreamId::Secondary, 123_456_789, end, T0).unwrap();

    let mut now = T0;
    while now < end + DAY {
        // Inconsistent cadence: 1h, 2h, 3h, ...
        now += 3_600 * (1 + (now / 3_600) % 3);
        let _ = bot.drip(now);
    }
    lazy.drip(now).unwrap();

    assert_eq!(bot.totals(StreamId::Secondary).delivered, 123_456_789);
    assert_eq!(lazy.totals(StreamId::Secondary).delivered, 123_456_789);
}

// ---------------------------------------------------------------------------
// Reconfiguration
// ---------------------------------------------------------------------------

#[test]
fn top_up_mid_schedule_reamortizes_over_new_end() {
    let mut h = Harness::new(1);
    h.configure(StreamId::Primary, 1000, T0 + 10 * DAY, T0).unwrap();
    // Day 5: 500 settles, 500 added, end pushed to day 15.
    let settled = h.configure(StreamId::Primary, 500, T0 + 15 * DAY, T0 + 5 * DAY).unwrap();
    assert_eq!(settled, 500);

    let s = h.scheduler.stream_state(StreamId::Primary);
    assert_eq!(s.start, T0);
    assert_eq!(s.remaining, 1000);
    assert_eq!(s.end, T0 + 15 * DAY);

    // 1000 over the remaining 10 days.
    assert_eq!(h.drip(T0 + 6 * DAY).unwrap().primary, 100);
    h.check_conservation().unwrap();
}

#[test]
fn reconfigure_after_drain_starts_fresh() {
    let mut h = Harness::new(1);
    h.configure(StreamId::Primary, 100, T0 + DAY, T0).unwrap();
    h.drip(T0 + 2 * DAY).unwrap();

    let restart = T0 + 40 * DAY;
    h.configure(StreamId::Primary, 300, restart + 3 * DAY, restart).unwrap();
    let s = h.scheduler.stream_state(StreamId::Primary);
    assert_eq!((s.start, s.last_settlement, s.remaining), (restart, restart, 300));

    // No catch-up for the idle gap before the restart.
    assert_eq!(h.drip(restart + DAY).unwrap().primary, 100);
    h.check_conservation().unwrap();
}

#[test]
fn shorter_end_never_shortens_schedule() {
    let mut h = Harness::new(1);
    h.configure(StreamId::Primary, 1000, T0 + 10 * DAY, T0).unwrap();
    h.configure(StreamId::Primary, 1, T0 + DAY, T0 + 1).unwrap();
    assert_eq!(h.scheduler.stream_state(StreamId::Primary).end, T0 + 10 * DAY);
}

#[test]
fn configure_validation_errors() {
    let mut h = Harness::new(1);
    assert_eq!(
        h.configure(StreamId::Primary, 0, T0 + DAY, T0).unwrap_err(),
        SchedulerError::Validation(ValidationError::ZeroAmount)
    );
    assert_eq!(
        h.configure(StreamId::Primary, 10, T0 - 1, T0).unwrap_err(),
        SchedulerError::Validation(ValidationError::EndTimestampInPast { end: T0 - 1, now: T0 })
    );
    assert_eq!(
        h.scheduler.configure(STRANGER, StreamId::Primary, 10, T0 + DAY, T0).unwrap_err(),
        SchedulerError::Unauthorized(STRANGER)
    );
    assert_eq!(h.scheduler.custody_balance(&TOKEN_A), 0);
}

// ---------------------------------------------------------------------------
// Eligibility gate
// ---------------------------------------------------------------------------

#[test]
fn eligibility_outage_freezes_then_catches_up() {
    let mut h = Harness::new(1);
    h.configure(StreamId::Primary, 10_000, T0 + 10 * DAY, T0).unwrap();
    h.configure(StreamId::Secondary, 10_000, T0 + 10 * DAY, T0).unwrap();

    assert_eq!(h.drip(T0 + DAY).unwrap().as_tuple(), (1_000, 1_000));

    // Recipients leave for three days; primary keeps flowing.
    h.set_weight(0);
    for day in 2..=4 {
        let r = h.drip(T0 + day * DAY).unwrap();
        assert_eq!(r.primary, 1_000);
        assert_eq!(r.secondary, 0);
    }
    assert_eq!(h.scheduler.stream_state(StreamId::Secondary).last_settlement, T0 + DAY);
    assert_eq!(h.scheduler.can_drip(T0 + 5 * DAY), (true, false));

    // They return: 9_000 over 9 days, 4 elapsed.
    h.set_weight(5);
    assert_eq!(h.drip(T0 + 5 * DAY).unwrap().secondary, 4_000);
    assert_eq!(h.scheduler.accumulator().gate_violations(), 0);
    h.check_conservation().unwrap();
}

#[test]
fn secondary_alone_without_recipients_has_nothing_to_drip() {
    let mut h = Harness::new(0);
    h.configure(StreamId::Secondary, 500, T0 + DAY, T0).unwrap();
    assert!(matches!(h.drip(T0 + 2 * DAY), Err(SchedulerError::Throttle(_))));
    assert_eq!(h.scheduler.stream_state(StreamId::Secondary).remaining, 500);
}

#[test]
fn secondary_drains_exactly_after_late_eligibility() {
    let mut h = Harness::new(0);
    h.configure(StreamId::Secondary, 777, T0 + DAY, T0).unwrap();
    h.set_weight(1);
    assert_eq!(h.drip(T0 + 30 * DAY).unwrap().secondary, 777);
    assert_eq!(h.scheduler.stream_state(StreamId::Secondary).remaining, 0);
}

// ---------------------------------------------------------------------------
// Throttle
// ---------------------------------------------------------------------------

#[test]
fn custom_interval_from_config() {
    let mut h = Harness::with_config(SchedulerConfig { min_interval_secs: 60 }, 1);
    h.configure(StreamId::Primary, 1_000_000, T0 + DAY, T0).unwrap();
    assert!(h.drip(T0 + 59).is_err());
    assert!(h.drip(T0 + 60).is_ok());
    assert!(h.drip(T0 + 119).is_err());
    assert!(h.drip(T0 + 120).is_ok());
}

#[test]
fn throttle_does_not_lose_value() {
    let mut h = Harness::new(1);
    h.configure(StreamId::Primary, 1000, T0 + 10 * DAY, T0).unwrap();
    assert!(h.drip(T0 + 1_800).is_err());
    // The throttled half hour is included in the next release.
    assert_eq!(h.drip(T0 + DAY).unwrap().primary, 100);
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

#[test]
fn recovery_of_stray_deposit() {
    let mut h = Harness::new(1);
    h.configure(StreamId::Primary, 1000, T0 + 10 * DAY, T0).unwrap();
    h.scheduler.treasury_mut().mint(TOKEN_A, CUSTODY, 250).unwrap();

    // 200 settles first, leaving 1_050 in custody and 800 accounted.
    assert!(h.recover(TOKEN_A, 1_250, T0 + 2 * DAY).is_err());
    let accounted = h.recover(TOKEN_A, 1_050, T0 + 2 * DAY).unwrap();
    assert_eq!(accounted, 800);
    assert_eq!(h.scheduler.stream_state(StreamId::Primary).remaining, 0);
    assert_eq!(h.scheduler.custody_balance(&TOKEN_A), 0);
    h.check_conservation().unwrap();
}

#[test]
fn recovery_records_event() {
    let mut h = Harness::new(1);
    h.configure(StreamId::Secondary, 40, T0 + DAY, T0).unwrap();
    h.scheduler.take_events();
    h.scheduler.recover(OWNER, TOKEN_B, 10, T0).unwrap();
    assert_eq!(
        h.scheduler.take_events(),
        vec![DripEvent::Recovered {
            asset: TOKEN_B,
            amount: 10,
            stream: Some(StreamId::Secondary),
            accounted: 10,
            at: T0,
        }]
    );
}

// ---------------------------------------------------------------------------
// Atomicity
// ---------------------------------------------------------------------------

#[test]
fn frozen_owner_aborts_configure() {
    let mut h = Harness::new(1);
    h.scheduler.treasury_mut().freeze(OWNER);
    assert_eq!(
        h.configure(StreamId::Primary, 10, T0 + DAY, T0).unwrap_err(),
        SchedulerError::Transfer(TransferError::Frozen(OWNER))
    );
    assert_eq!(*h.scheduler.ledger(), StreamLedger::new());
}

#[test]
fn failed_delivery_aborts_top_up_including_pull() {
    let mut h = Harness::new(1);
    h.configure(StreamId::Primary, 1000, T0 + 10 * DAY, T0).unwrap();
    let ledger = *h.scheduler.ledger();
    let owner_before = h.scheduler.treasury().balance_of(&TOKEN_A, &OWNER);

    h.scheduler.treasury_mut().freeze(SINK);
    assert!(h.configure(StreamId::Primary, 500, T0 + 10 * DAY, T0 + DAY).is_err());

    assert_eq!(*h.scheduler.ledger(), ledger);
    assert_eq!(h.scheduler.treasury().balance_of(&TOKEN_A, &OWNER), owner_before);
    assert_eq!(h.scheduler.custody_balance(&TOKEN_A), 1000);
    h.check_conservation().unwrap();
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn resumed_scheduler_continues_schedule() {
    let mut h = Harness::new(1);
    h.configure(StreamId::Primary, 1000, T0 + 10 * DAY, T0).unwrap();
    h.drip(T0 + 2 * DAY).unwrap();
    let snapshot = h.scheduler.ledger().encode().unwrap();

    // A fresh scheduler over the same balances picks up where it left off.
    let mut resumed = Harness::new(1);
    resumed.scheduler.treasury_mut().mint(TOKEN_A, CUSTODY, 800).unwrap();
    let ledger = StreamLedger::decode(&snapshot).unwrap();
    resumed.scheduler = resumed.scheduler.with_ledger(ledger);
    assert_eq!(resumed.drip(T0 + 4 * DAY).unwrap().primary, 200);
}
