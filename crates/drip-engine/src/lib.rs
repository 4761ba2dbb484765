//! # drip-engine: Dual-stream linear emission scheduler.
//!
//! All calculations use integer arithmetic only, with u128 intermediates.
//!
//! - **Settlement**: re-amortized linear release recomputed from the current
//!   remaining amount and remaining duration on every call, so irregular
//!   triggering self-corrects and each stream drains exactly at its end.
//! - **Eligibility gate**: the secondary stream only releases while the
//!   accumulator reports eligible recipients; otherwise it freezes in place.
//! - **Ledger**: exactly two streams in a fixed structure, with bincode
//!   snapshots for persistence.
//! - **Scheduler**: owner configuration and recovery plus the permissionless
//!   trigger, each applied all-or-nothing.

pub mod config;
pub mod gate;
pub mod ledger;
pub mod scheduler;
pub mod settlement;

pub use config::SchedulerConfig;
pub use ledger::{Releases, StreamLedger};
pub use scheduler::{DripScheduler, StreamAssets};
pub use settlement::release_amount;
