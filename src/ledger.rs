// 3.2 ledger.rs: vault storage keyed by (owner, vault_id) plus the per-owner counter.
// the committed ledger is read-only to the outside. all writes go through a StagedLedger
// overlay that the controller applies only once a batch has passed every check.

use std::collections::HashMap;

use crate::types::{Address, VaultKey};
use crate::vault::{Slot, SlotDelta, Vault, VaultError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultLedger {
    vaults: HashMap<VaultKey, Vault>,
    counters: HashMap<Address, u64>,
}

impl VaultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: Address, vault_id: u64) -> Option<&Vault> {
        self.vaults.get(&VaultKey::new(owner, vault_id))
    }

    pub fn account_vault_counter(&self, owner: Address) -> u64 {
        self.counters.get(&owner).copied().unwrap_or(0)
    }

    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VaultKey, &Vault)> {
        self.vaults.iter()
    }

    pub(crate) fn stage(&self) -> StagedLedger<'_> {
        StagedLedger {
            base: self,
            vaults: HashMap::new(),
            counters: HashMap::new(),
            touched: Vec::new(),
        }
    }

    pub(crate) fn apply(&mut self, changes: LedgerChanges) {
        self.counters.extend(changes.counters);
        self.vaults.extend(changes.vaults);
    }
}

/// Owned result of a staged batch, ready to be merged into the ledger.
#[derive(Debug, Default)]
pub(crate) struct LedgerChanges {
    vaults: HashMap<VaultKey, Vault>,
    counters: HashMap<Address, u64>,
}

// 3.3: write-ahead view. reads fall through to the committed ledger, writes stay local.
#[derive(Debug)]
pub(crate) struct StagedLedger<'a> {
    base: &'a VaultLedger,
    vaults: HashMap<VaultKey, Vault>,
    counters: HashMap<Address, u64>,
    // first-touch order, so solvency checks run in action order
    touched: Vec<VaultKey>,
}

impl<'a> StagedLedger<'a> {
    pub fn counter(&self, owner: Address) -> u64 {
        self.counters
            .get(&owner)
            .copied()
            .unwrap_or_else(|| self.base.account_vault_counter(owner))
    }

    pub fn get(&self, owner: Address, vault_id: u64) -> Option<&Vault> {
        let key = VaultKey::new(owner, vault_id);
        self.vaults.get(&key).or_else(|| self.base.vaults.get(&key))
    }

    pub fn open(&mut self, owner: Address) -> u64 {
        let vault_id = self.counter(owner) + 1;
        self.counters.insert(owner, vault_id);
        let key = VaultKey::new(owner, vault_id);
        self.vaults.insert(key, Vault::new());
        self.touch(key);
        vault_id
    }

    pub fn mutate_slot(
        &mut self,
        owner: Address,
        vault_id: u64,
        slot: Slot,
        index: usize,
        asset: Address,
        delta: SlotDelta,
    ) -> Result<&Vault, VaultError> {
        let key = VaultKey::new(owner, vault_id);
        let mut vault = self
            .get(owner, vault_id)
            .cloned()
            .ok_or(VaultError::UnknownVault { owner, vault_id })?;

        vault.apply(slot, index, asset, delta)?;

        self.touch(key);
        let stored = self.vaults.entry(key).or_default();
        *stored = vault;
        Ok(&*stored)
    }

    /// Zero the vault and hand back what it held.
    pub fn clear(&mut self, owner: Address, vault_id: u64) -> Result<Vault, VaultError> {
        let key = VaultKey::new(owner, vault_id);
        let previous = self
            .get(owner, vault_id)
            .cloned()
            .ok_or(VaultError::UnknownVault { owner, vault_id })?;
        self.vaults.insert(key, Vault::new());
        self.touch(key);
        Ok(previous)
    }

    pub fn touched(&self) -> &[VaultKey] {
        &self.touched
    }

    pub fn into_changes(self) -> LedgerChanges {
        LedgerChanges {
            vaults: self.vaults,
            counters: self.counters,
        }
    }

    fn touch(&mut self, key: VaultKey) {
        if !self.touched.contains(&key) {
            self.touched.push(key);
        }
    }
}
