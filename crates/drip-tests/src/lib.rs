//! Shared fixtures for the drip integration and property suites.

pub mod helpers;
