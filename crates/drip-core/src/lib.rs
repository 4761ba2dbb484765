//! # drip-core
//! Foundation types and collaborator traits for the drip scheduler.

pub mod constants;
pub mod error;
pub mod memory;
pub mod traits;
pub mod types;
