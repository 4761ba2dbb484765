//! In-memory collaborators.
//!
//! [`MemoryTreasury`], [`MemoryAccumulator`], and [`SingleOwner`] back the
//! test suites and the simulator. No persistence.

use std::collections::{HashMap, HashSet};

use crate::error::TransferError;
use crate::traits::{AccessControl, Accumulator, Treasury};
use crate::types::{AccountId, AssetId, Transfer};

/// Multi-asset balance book with atomic batch transfers.
///
/// Frozen accounts can neither send nor receive, which models an
/// authorization failure on the value-movement side.
#[derive(Debug, Clone, Default)]
pub struct MemoryTreasury {
    balances: HashMap<(AssetId, AccountId), u64>,
    frozen: HashSet<AccountId>,
}

impl MemoryTreasury {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to `holder` out of thin air.
    pub fn mint(&mut self, asset: AssetId, holder: AccountId, amount: u64) -> Result<(), TransferError> {
        let balance = self.balances.entry((asset, holder)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow { asset, holder })?;
        Ok(())
    }

    pub fn freeze(&mut self, holder: AccountId) {
        self.frozen.insert(holder);
    }

    pub fn unfreeze(&mut self, holder: &AccountId) {
        self.frozen.remove(holder);
    }

    /// Sum of all balances of `asset`.
    pub fn total_supply(&self, asset: &AssetId) -> u128 {
        self.balances
            .iter()
            .filter(|((a, _), _)| a == asset)
            .map(|(_, &v)| v as u128)
            .sum()
    }

    fn apply(
        balances: &mut HashMap<(AssetId, AccountId), u64>,
        transfer: &Transfer,
    ) -> Result<(), TransferError> {
        let Transfer { asset, from, to, amount } = *transfer;
        let have = balances.get(&(asset, from)).copied().unwrap_or(0);
        if have < amount {
            return Err(TransferError::InsufficientBalance { asset, holder: from, have, need: amount });
        }
        balances.insert((asset, from), have - amount);
        let dest = balances.entry((asset, to)).or_insert(0);
        *dest = dest
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow { asset, holder: to })?;
        Ok(())
    }
}

impl Treasury for MemoryTreasury {
    fn balance_of(&self, asset: &AssetId, holder: &AccountId) -> u64 {
        self.balances.get(&(*asset, *holder)).copied().unwrap_or(0)
    }

    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), TransferError> {
        let mut staged = self.balances.clone();
        for transfer in transfers {
            for party in [&transfer.from, &transfer.to] {
                if self.frozen.contains(party) {
                    return Err(TransferError::Frozen(*party));
                }
            }
            Self::apply(&mut staged, transfer)?;
        }
        self.balances = staged;
        Ok(())
    }
}

/// Accumulator with a settable eligible weight that tallies what it receives.
#[derive(Debug, Clone)]
pub struct MemoryAccumulator {
    account: AccountId,
    weight: u64,
    received_primary: u128,
    received_secondary: u128,
    /// Secondary notifications delivered while the weight was zero.
    gate_violations: u64,
}

impl MemoryAccumulator {
    pub fn new(account: AccountId, weight: u64) -> Self {
        Self {
            account,
            weight,
            received_primary: 0,
            received_secondary: 0,
            gate_violations: 0,
        }
    }

    pub fn set_weight(&mut self, weight: u64) {
        self.weight = weight;
    }

    pub fn received_primary(&self) -> u128 {
        self.received_primary
    }

    pub fn received_secondary(&self) -> u128 {
        self.received_secondary
    }

    pub fn gate_violations(&self) -> u64 {
        self.gate_violations
    }
}

impl Accumulator for MemoryAccumulator {
    fn account(&self) -> AccountId {
        self.account
    }

    fn eligible_weight(&self) -> u64 {
        self.weight
    }

    fn accept_primary(&mut self, amount: u64) {
        self.received_primary += amount as u128;
    }

    fn accept_secondary(&mut self, amount: u64) {
        if self.weight == 0 {
            self.gate_violations += 1;
        }
        self.received_secondary += amount as u128;
    }
}

/// Access control with exactly one owner identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleOwner(pub AccountId);

impl AccessControl for SingleOwner {
    fn is_owner(&self, caller: &AccountId) -> bool {
        *caller == self.0
    }
}
