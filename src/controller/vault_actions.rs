// 8.3 controller/vault_actions.rs: per-action handlers. each one validates against the
// staged ledger, mutates it, and queues the transfers and events the batch will commit.

use super::core::Controller;
use super::operate::Batch;
use super::results::ControllerError;
use crate::actions::{Action, Movement};
use crate::events::{CallExecutedEvent, EventPayload, RedeemEvent, VaultMovementEvent, VaultOpenedEvent, VaultSettledEvent};
use crate::oracle::Oracle;
use crate::otoken::{OptionTokens, OtokenDescriptor};
use crate::pool::Pool;
use crate::settlement::TransferInstruction;
use crate::types::{Address, Amount};
use crate::vault::{Slot, SlotDelta, Vault};
use crate::whitelist::Whitelist;

impl<O, W, B> Controller<O, W, B>
where
    O: Oracle,
    W: Whitelist,
    B: Pool + OptionTokens,
{
    pub(super) fn dispatch(&self, batch: &mut Batch<'_>, caller: Address, action: Action) -> Result<(), ControllerError> {
        match action {
            Action::OpenVault { owner, vault_id } => self.open_vault(batch, owner, vault_id),
            Action::DepositCollateral(m) => self.deposit_collateral(batch, m),
            Action::WithdrawCollateral(m) => self.withdraw_collateral(batch, m),
            Action::MintShort(m) => self.mint_short(batch, m),
            Action::BurnShort(m) => self.burn_short(batch, m),
            Action::DepositLong(m) => self.deposit_long(batch, m),
            Action::WithdrawLong(m) => self.withdraw_long(batch, m),
            Action::Settle { owner, vault_id, to } => self.settle_vault(batch, owner, vault_id, to),
            Action::Redeem { otoken, receiver, amount } => self.redeem(batch, caller, otoken, receiver, amount),
            Action::Call { callee, data } => self.call(batch, caller, callee, data),
        }
    }

    fn open_vault(&self, batch: &mut Batch<'_>, owner: Address, vault_id: u64) -> Result<(), ControllerError> {
        let expected = batch.ledger.counter(owner) + 1;
        if vault_id != expected {
            return Err(ControllerError::UnexpectedVaultId { owner, expected, got: vault_id });
        }
        batch.ledger.open(owner);
        batch.events.push(EventPayload::VaultOpened(VaultOpenedEvent { owner, vault_id, vault: Vault::new() }));
        Ok(())
    }

    fn deposit_collateral(&self, batch: &mut Batch<'_>, m: Movement) -> Result<(), ControllerError> {
        check_vault_id(batch, m.owner, m.vault_id)?;
        if !self.whitelist.is_whitelisted_collateral(m.asset) {
            return Err(ControllerError::CollateralNotWhitelisted(m.asset));
        }
        let vault = batch
            .ledger
            .mutate_slot(m.owner, m.vault_id, Slot::Collateral, m.index, m.asset, SlotDelta::Add(m.amount))?
            .clone();

        batch.transfers.push(TransferInstruction::ToPool { asset: m.asset, from: m.counterparty, amount: m.amount });
        batch.events.push(EventPayload::CollateralDeposited(movement_event(&m, vault)));
        Ok(())
    }

    fn withdraw_collateral(&self, batch: &mut Batch<'_>, m: Movement) -> Result<(), ControllerError> {
        check_vault_id(batch, m.owner, m.vault_id)?;
        // an expired short freezes collateral until settlement
        if let Some((short, _)) = batch.ledger.get(m.owner, m.vault_id).and_then(|v| v.short()) {
            if self.descriptor(short)?.has_expired(self.current_time) {
                return Err(ControllerError::ShortExpired { owner: m.owner, vault_id: m.vault_id });
            }
        }
        let vault = batch
            .ledger
            .mutate_slot(m.owner, m.vault_id, Slot::Collateral, m.index, m.asset, SlotDelta::Remove(m.amount))?
            .clone();

        batch.transfers.push(TransferInstruction::ToUser { asset: m.asset, to: m.counterparty, amount: m.amount });
        batch.events.push(EventPayload::CollateralWithdrawn(movement_event(&m, vault)));
        Ok(())
    }

    fn mint_short(&self, batch: &mut Batch<'_>, m: Movement) -> Result<(), ControllerError> {
        check_vault_id(batch, m.owner, m.vault_id)?;
        if !self.whitelist.is_whitelisted_otoken(m.asset) {
            return Err(ControllerError::OtokenNotWhitelisted(m.asset));
        }
        let terms = self.descriptor(m.asset)?;
        if !self.whitelist.is_whitelisted_product(&terms.product()) {
            return Err(ControllerError::ProductNotWhitelisted(m.asset));
        }
        self.require_live(m.asset, &terms)?;

        let vault = batch
            .ledger
            .mutate_slot(m.owner, m.vault_id, Slot::Short, m.index, m.asset, SlotDelta::Add(m.amount))?
            .clone();

        batch.transfers.push(TransferInstruction::Mint { otoken: m.asset, to: m.counterparty, amount: m.amount });
        batch.events.push(EventPayload::ShortMinted(movement_event(&m, vault)));
        Ok(())
    }

    fn burn_short(&self, batch: &mut Batch<'_>, m: Movement) -> Result<(), ControllerError> {
        check_vault_id(batch, m.owner, m.vault_id)?;
        let terms = self.descriptor(m.asset)?;
        self.require_live(m.asset, &terms)?;

        let vault = batch
            .ledger
            .mutate_slot(m.owner, m.vault_id, Slot::Short, m.index, m.asset, SlotDelta::Remove(m.amount))?
            .clone();

        batch.transfers.push(TransferInstruction::Burn { otoken: m.asset, from: m.counterparty, amount: m.amount });
        batch.events.push(EventPayload::ShortBurned(movement_event(&m, vault)));
        Ok(())
    }

    fn deposit_long(&self, batch: &mut Batch<'_>, m: Movement) -> Result<(), ControllerError> {
        check_vault_id(batch, m.owner, m.vault_id)?;
        if !self.whitelist.is_whitelisted_otoken(m.asset) {
            return Err(ControllerError::OtokenNotWhitelisted(m.asset));
        }
        let terms = self.descriptor(m.asset)?;
        self.require_live(m.asset, &terms)?;

        let vault = batch
            .ledger
            .mutate_slot(m.owner, m.vault_id, Slot::Long, m.index, m.asset, SlotDelta::Add(m.amount))?
            .clone();

        batch.transfers.push(TransferInstruction::ToPool { asset: m.asset, from: m.counterparty, amount: m.amount });
        batch.events.push(EventPayload::LongDeposited(movement_event(&m, vault)));
        Ok(())
    }

    fn withdraw_long(&self, batch: &mut Batch<'_>, m: Movement) -> Result<(), ControllerError> {
        check_vault_id(batch, m.owner, m.vault_id)?;
        let terms = self.descriptor(m.asset)?;
        self.require_live(m.asset, &terms)?;

        let vault = batch
            .ledger
            .mutate_slot(m.owner, m.vault_id, Slot::Long, m.index, m.asset, SlotDelta::Remove(m.amount))?
            .clone();

        batch.transfers.push(TransferInstruction::ToUser { asset: m.asset, to: m.counterparty, amount: m.amount });
        batch.events.push(EventPayload::LongWithdrawn(movement_event(&m, vault)));
        Ok(())
    }

    fn settle_vault(&self, batch: &mut Batch<'_>, owner: Address, vault_id: u64, to: Address) -> Result<(), ControllerError> {
        check_vault_id(batch, owner, vault_id)?;
        let vault = batch
            .ledger
            .get(owner, vault_id)
            .cloned()
            .ok_or(ControllerError::InvalidVaultId { owner, vault_id })?;

        let short = vault.short();
        let long = vault.long();
        let otoken = match short.or(long) {
            Some((otoken, _)) => otoken,
            None => return Err(ControllerError::NothingToSettle { owner, vault_id }),
        };
        let terms = self.descriptor(otoken)?;
        if !terms.has_expired(self.current_time) {
            return Err(ControllerError::OtokenNotExpired(otoken));
        }

        let calculator = self.calculator();
        let collateral_asset = calculator.denomination(&vault)?.unwrap_or(terms.collateral_asset);
        let margin = calculator.excess_margin(&vault, collateral_asset)?;
        // an underwater vault pays nothing; the shortfall stays with redeemers
        let payout = if margin.is_excess { margin.amount } else { Amount::zero() };

        batch.ledger.clear(owner, vault_id)?;

        if let Some((long_otoken, long_amount)) = long {
            batch.transfers.push(TransferInstruction::Burn {
                otoken: long_otoken,
                from: self.bank.address(),
                amount: long_amount,
            });
        }
        if !payout.is_zero() {
            batch.transfers.push(TransferInstruction::ToUser { asset: collateral_asset, to, amount: payout });
        }
        batch.events.push(EventPayload::VaultSettled(VaultSettledEvent {
            owner,
            vault_id,
            to,
            short_otoken: short.map(|(otoken, _)| otoken),
            collateral_asset: Some(collateral_asset),
            payout,
            vault: Vault::new(),
        }));
        Ok(())
    }

    fn redeem(
        &self,
        batch: &mut Batch<'_>,
        caller: Address,
        otoken: Address,
        receiver: Address,
        amount: Amount,
    ) -> Result<(), ControllerError> {
        if !self.whitelist.is_whitelisted_otoken(otoken) {
            return Err(ControllerError::OtokenNotWhitelisted(otoken));
        }
        let terms = self.descriptor(otoken)?;
        if !terms.has_expired(self.current_time) {
            return Err(ControllerError::OtokenNotExpired(otoken));
        }
        let payout = self.calculator().expired_payout(otoken, amount)?;

        batch.transfers.push(TransferInstruction::Burn { otoken, from: caller, amount });
        if !payout.is_zero() {
            batch.transfers.push(TransferInstruction::ToUser {
                asset: terms.collateral_asset,
                to: receiver,
                amount: payout,
            });
        }
        batch.events.push(EventPayload::Redeemed(RedeemEvent {
            redeemer: caller,
            receiver,
            otoken,
            collateral_asset: terms.collateral_asset,
            otoken_burned: amount,
            payout,
        }));
        Ok(())
    }

    fn call(&self, batch: &mut Batch<'_>, caller: Address, callee: Address, data: Vec<u8>) -> Result<(), ControllerError> {
        if self.call_restricted && !self.whitelist.is_whitelisted_callee(callee) {
            return Err(ControllerError::CalleeNotWhitelisted(callee));
        }
        if !self.callees.contains_key(&callee) {
            return Err(ControllerError::UnknownCallee(callee));
        }
        batch.calls.push((callee, data.clone()));
        batch.events.push(EventPayload::CallExecuted(CallExecutedEvent { caller, callee, data }));
        Ok(())
    }

    fn require_live(&self, otoken: Address, terms: &OtokenDescriptor) -> Result<(), ControllerError> {
        if terms.has_expired(self.current_time) {
            return Err(ControllerError::OtokenExpired(otoken));
        }
        Ok(())
    }
}

// vault ids are handed out sequentially from 1
fn check_vault_id(batch: &Batch<'_>, owner: Address, vault_id: u64) -> Result<(), ControllerError> {
    if vault_id == 0 || vault_id > batch.ledger.counter(owner) {
        return Err(ControllerError::InvalidVaultId { owner, vault_id });
    }
    Ok(())
}

fn movement_event(m: &Movement, vault: Vault) -> VaultMovementEvent {
    VaultMovementEvent {
        owner: m.owner,
        vault_id: m.vault_id,
        asset: m.asset,
        counterparty: m.counterparty,
        amount: m.amount,
        vault,
    }
}
