//! Batch execution: parse, authorize, stage, verify, then commit.

use tracing::{debug, info, warn};

use super::core::Controller;
use super::results::{BatchReceipt, ControllerError};
use crate::actions::{Action, ActionArgs, ActionType};
use crate::events::EventPayload;
use crate::ledger::StagedLedger;
use crate::oracle::Oracle;
use crate::otoken::OptionTokens;
use crate::pool::Pool;
use crate::settlement::{BatchId, TransferBatch, TransferInstruction};
use crate::types::Address;
use crate::whitelist::Whitelist;

/// Everything a batch wants to do, held back until the batch is known to be valid.
pub(super) struct Batch<'a> {
    pub(super) ledger: StagedLedger<'a>,
    pub(super) transfers: Vec<TransferInstruction>,
    pub(super) calls: Vec<(Address, Vec<u8>)>,
    pub(super) events: Vec<EventPayload>,
}

impl<'a> Batch<'a> {
    fn new(ledger: StagedLedger<'a>) -> Self {
        Self {
            ledger,
            transfers: Vec::new(),
            calls: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl<O, W, B> Controller<O, W, B>
where
    O: Oracle,
    W: Whitelist,
    B: Pool + OptionTokens,
{
    /// Run `actions` in order as a single atomic batch on behalf of `caller`.
    /// Either every action lands, every touched vault is solvent and every
    /// token movement succeeds, or nothing changes.
    pub fn operate(&mut self, caller: Address, actions: &[ActionArgs]) -> Result<BatchReceipt, ControllerError> {
        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;
        debug!(batch_id, caller = %caller, actions = actions.len(), "operate");

        match self.run_batch(batch_id, caller, actions) {
            Ok(receipt) => {
                info!(
                    batch_id,
                    vaults = receipt.touched_vaults.len(),
                    transfers = receipt.transfers_executed,
                    "batch committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(batch_id, category = ?e.category(), error = %e, "batch rejected");
                Err(e)
            }
        }
    }

    fn run_batch(&mut self, batch_id: BatchId, caller: Address, actions: &[ActionArgs]) -> Result<BatchReceipt, ControllerError> {
        if self.system_fully_paused {
            return Err(ControllerError::SystemFullyPaused);
        }
        if actions.len() > self.config.max_actions_per_batch {
            return Err(ControllerError::BatchTooLarge {
                actions: actions.len(),
                max: self.config.max_actions_per_batch,
            });
        }

        let (changes, touched_vaults, transfers, calls, events) = {
            let mut batch = Batch::new(self.ledger.stage());
            for args in actions {
                let action = Action::parse(args)?;
                self.check_not_paused(action.action_type())?;
                self.authorize(caller, &action)?;
                debug!(batch_id, action = %action.action_type(), "dispatch");
                self.dispatch(&mut batch, caller, action)?;
            }
            self.verify_solvency(&batch.ledger)?;

            let touched = batch.ledger.touched().to_vec();
            (batch.ledger.into_changes(), touched, batch.transfers, batch.calls, batch.events)
        };

        let mut settlement = TransferBatch::new(batch_id, self.current_time);
        for instruction in transfers {
            settlement.add(instruction);
        }
        settlement.execute(&mut self.bank)?;

        if let Err(e) = self.run_calls(caller, &calls) {
            warn!(batch_id, error = %e, "call failed, reverting transfers");
            settlement.revert(&mut self.bank)?;
            return Err(e);
        }

        self.ledger.apply(changes);
        let events_emitted = events.len();
        for payload in events {
            self.emit_event(payload);
        }

        Ok(BatchReceipt {
            batch_id,
            actions_applied: actions.len(),
            touched_vaults,
            transfers_executed: settlement.instruction_count(),
            events_emitted,
        })
    }

    fn check_not_paused(&self, action_type: ActionType) -> Result<(), ControllerError> {
        if self.system_partially_paused && !action_type.survives_partial_pause() {
            return Err(ControllerError::SystemPartiallyPaused(action_type));
        }
        if self.is_action_paused(action_type) {
            return Err(ControllerError::ActionPaused(action_type));
        }
        Ok(())
    }

    fn authorize(&self, caller: Address, action: &Action) -> Result<(), ControllerError> {
        let Some(owner) = action.vault_owner() else {
            return Ok(());
        };
        if caller != owner && !self.is_operator(owner, caller) {
            return Err(ControllerError::Unauthorized { caller, owner });
        }
        // assets may only be pulled from the caller or the vault owner
        match action {
            Action::DepositCollateral(m) | Action::DepositLong(m) | Action::BurnShort(m) => {
                if m.counterparty != caller && m.counterparty != m.owner {
                    return Err(ControllerError::InvalidSender {
                        action: action.action_type(),
                        sender: m.counterparty,
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn verify_solvency(&self, ledger: &StagedLedger<'_>) -> Result<(), ControllerError> {
        let calculator = self.calculator();
        for key in ledger.touched() {
            let Some(vault) = ledger.get(key.owner, key.vault_id) else {
                continue;
            };
            let Some(denomination) = calculator.denomination(vault)? else {
                continue;
            };
            let margin = calculator.excess_margin(vault, denomination)?;
            if !margin.is_excess {
                return Err(ControllerError::Insolvent {
                    owner: key.owner,
                    vault_id: key.vault_id,
                    deficit: margin.amount,
                });
            }
        }
        Ok(())
    }

    // calls go last, once every token movement of the batch has landed
    fn run_calls(&mut self, caller: Address, calls: &[(Address, Vec<u8>)]) -> Result<(), ControllerError> {
        for (address, data) in calls {
            let callee = self
                .callees
                .get_mut(address)
                .ok_or(ControllerError::UnknownCallee(*address))?;
            callee
                .call(caller, data)
                .map_err(|source| ControllerError::Callee { callee: *address, source })?;
        }
        Ok(())
    }
}
