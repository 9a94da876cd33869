// 3.0 vault.rs: the vault shape and the rules for touching a single slot.
// a vault holds at most one short otoken, one long otoken and one collateral asset.
// the six vectors stay public so malformed shapes can reach the calculator and get rejected there.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Address, Amount};

pub const MAX_ASSETS_PER_SLOT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Short,
    Long,
    Collateral,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Short => write!(f, "short"),
            Slot::Long => write!(f, "long"),
            Slot::Collateral => write!(f, "collateral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotDelta {
    Add(Amount),
    Remove(Amount),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("{slot} amount must be greater than zero")]
    ZeroAmount { slot: Slot },

    #[error("vault already holds a {slot} asset")]
    TooManyAssets { slot: Slot },

    #[error("{slot} index {index} out of bounds")]
    IndexOutOfBounds { slot: Slot, index: usize },

    #[error("{slot} asset mismatch: vault holds {held}, got {given}")]
    AssetMismatch { slot: Slot, held: Address, given: Address },

    #[error("insufficient {slot} balance: have {available}, need {requested}")]
    InsufficientBalance { slot: Slot, available: Amount, requested: Amount },

    #[error("{slot} balance overflow")]
    Overflow { slot: Slot },

    #[error("vault {vault_id} does not exist for {owner}")]
    UnknownVault { owner: Address, vault_id: u64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub short_otokens: Vec<Address>,
    pub long_otokens: Vec<Address>,
    pub collateral_assets: Vec<Address>,
    pub short_amounts: Vec<Amount>,
    pub long_amounts: Vec<Amount>,
    pub collateral_amounts: Vec<Amount>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.short_otokens.is_empty()
            && self.long_otokens.is_empty()
            && self.collateral_assets.is_empty()
    }

    pub fn short(&self) -> Option<(Address, Amount)> {
        first_entry(&self.short_otokens, &self.short_amounts)
    }

    pub fn long(&self) -> Option<(Address, Amount)> {
        first_entry(&self.long_otokens, &self.long_amounts)
    }

    pub fn collateral(&self) -> Option<(Address, Amount)> {
        first_entry(&self.collateral_assets, &self.collateral_amounts)
    }

    pub fn assets(&self, slot: Slot) -> &[Address] {
        match slot {
            Slot::Short => &self.short_otokens,
            Slot::Long => &self.long_otokens,
            Slot::Collateral => &self.collateral_assets,
        }
    }

    pub fn amounts(&self, slot: Slot) -> &[Amount] {
        match slot {
            Slot::Short => &self.short_amounts,
            Slot::Long => &self.long_amounts,
            Slot::Collateral => &self.collateral_amounts,
        }
    }

    // 3.1: apply one delta to one slot. either the whole change lands or nothing does.
    pub(crate) fn apply(
        &mut self,
        slot: Slot,
        index: usize,
        asset: Address,
        delta: SlotDelta,
    ) -> Result<(), VaultError> {
        match delta {
            SlotDelta::Add(amount) => self.add(slot, index, asset, amount),
            SlotDelta::Remove(amount) => self.remove(slot, index, asset, amount),
        }
    }

    fn add(&mut self, slot: Slot, index: usize, asset: Address, amount: Amount) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Err(VaultError::ZeroAmount { slot });
        }
        let (assets, amounts) = self.slot_mut(slot);

        if index == assets.len() {
            if assets.len() >= MAX_ASSETS_PER_SLOT {
                return Err(VaultError::TooManyAssets { slot });
            }
            assets.push(asset);
            amounts.push(amount);
            return Ok(());
        }
        if index > assets.len() {
            return Err(VaultError::IndexOutOfBounds { slot, index });
        }

        let held = assets[index];
        if held != asset {
            return Err(VaultError::AssetMismatch { slot, held, given: asset });
        }
        amounts[index] = amounts[index]
            .checked_add(amount)
            .ok_or(VaultError::Overflow { slot })?;
        Ok(())
    }

    fn remove(&mut self, slot: Slot, index: usize, asset: Address, amount: Amount) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Err(VaultError::ZeroAmount { slot });
        }
        let (assets, amounts) = self.slot_mut(slot);

        if index >= assets.len() {
            return Err(VaultError::IndexOutOfBounds { slot, index });
        }
        let held = assets[index];
        if held != asset {
            return Err(VaultError::AssetMismatch { slot, held, given: asset });
        }
        let available = amounts[index];
        let remaining = available
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientBalance { slot, available, requested: amount })?;

        // a drained entry frees the slot for a different asset
        if remaining.is_zero() {
            assets.remove(index);
            amounts.remove(index);
        } else {
            amounts[index] = remaining;
        }
        Ok(())
    }

    fn slot_mut(&mut self, slot: Slot) -> (&mut Vec<Address>, &mut Vec<Amount>) {
        match slot {
            Slot::Short => (&mut self.short_otokens, &mut self.short_amounts),
            Slot::Long => (&mut self.long_otokens, &mut self.long_amounts),
            Slot::Collateral => (&mut self.collateral_assets, &mut self.collateral_amounts),
        }
    }
}

fn first_entry(assets: &[Address], amounts: &[Amount]) -> Option<(Address, Amount)> {
    match (assets.first(), amounts.first()) {
        (Some(asset), Some(amount)) => Some((*asset, *amount)),
        _ => None,
    }
}
