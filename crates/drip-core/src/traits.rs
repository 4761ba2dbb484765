//! Collaborator interfaces consumed by the scheduler.
//!
//! - [`Treasury`]: atomic value movement across assets
//! - [`Accumulator`]: downstream sink that receives released value
//! - [`AccessControl`]: decides who the owner is
//!
//! The scheduler performs no authentication and no token bookkeeping of its
//! own; it only talks to these traits.

use crate::error::TransferError;
use crate::types::{AccountId, AssetId, Transfer};

/// Value-movement primitive.
///
/// [`execute`](Self::execute) must be atomic: either every transfer in the
/// batch is applied, or none is and the first failure is returned. The
/// scheduler submits all movements of one operation as a single batch, which
/// is how operations stay all-or-nothing.
pub trait Treasury: Send + Sync {
    /// Balance of `asset` held by `holder`.
    fn balance_of(&self, asset: &AssetId, holder: &AccountId) -> u64;

    /// Apply a batch of transfers atomically.
    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), TransferError>;
}

/// Downstream accumulator that distributes released value to recipients.
///
/// The scheduler transfers released value to [`account`](Self::account) and
/// then notifies the matching entry point. Notifications are infallible.
pub trait Accumulator: Send + Sync {
    /// Account that receives released value.
    fn account(&self) -> AccountId;

    /// Current eligible weight (e.g. total claims outstanding).
    fn eligible_weight(&self) -> u64;

    /// Whether anyone is currently entitled to secondary releases. This is
    /// the only input the scheduler's eligibility gate reads.
    ///
    /// Default implementation: `eligible_weight() > 0`.
    fn has_eligible_recipients(&self) -> bool {
        self.eligible_weight() > 0
    }

    /// Primary release notification. Always accepted.
    fn accept_primary(&mut self, amount: u64);

    /// Secondary release notification.
    ///
    /// Only invoked after [`has_eligible_recipients`](Self::has_eligible_recipients)
    /// returned `true` within the same operation.
    fn accept_secondary(&mut self, amount: u64);
}

/// Gate for owner-only operations.
pub trait AccessControl: Send + Sync {
    fn is_owner(&self, caller: &AccountId) -> bool;
}
