// 8.0 controller/core.rs: controller state, collaborators, read accessors and event log.

use std::collections::{HashMap, HashSet};

use tracing::info;

use super::config::ControllerConfig;
use super::results::ControllerError;
use crate::actions::ActionType;
use crate::calculator::MarginCalculator;
use crate::callee::Callee;
use crate::events::{Event, EventId, EventPayload};
use crate::ledger::VaultLedger;
use crate::oracle::Oracle;
use crate::otoken::{OptionTokens, OtokenDescriptor};
use crate::pool::Pool;
use crate::types::{Address, Amount, Timestamp};
use crate::vault::Vault;
use crate::whitelist::Whitelist;

/** 8.1: main controller struct. vault state plus the collaborators it is wired to */
pub struct Controller<O, W, B> {
    pub(super) config: ControllerConfig,
    pub(super) owner: Address,
    pub(super) full_pauser: Address,
    pub(super) partial_pauser: Address,
    pub(super) ledger: VaultLedger,
    // (account, operator)
    pub(super) operators: HashSet<(Address, Address)>,
    pub(super) oracle: O,
    pub(super) whitelist: W,
    pub(super) bank: B,
    pub(super) callees: HashMap<Address, Box<dyn Callee>>,
    pub(super) system_fully_paused: bool,
    pub(super) system_partially_paused: bool,
    pub(super) paused_actions: HashSet<ActionType>,
    pub(super) call_restricted: bool,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) next_batch_id: u64,
    pub(super) current_time: Timestamp,
}

impl<O, W, B> Controller<O, W, B>
where
    O: Oracle,
    W: Whitelist,
    B: Pool + OptionTokens,
{
    // both pauser roles start with the owner
    pub fn new(config: ControllerConfig, owner: Address, oracle: O, whitelist: W, bank: B) -> Self {
        let call_restricted = config.call_restricted;
        Self {
            config,
            owner,
            full_pauser: owner,
            partial_pauser: owner,
            ledger: VaultLedger::new(),
            operators: HashSet::new(),
            oracle,
            whitelist,
            bank,
            callees: HashMap::new(),
            system_fully_paused: false,
            system_partially_paused: false,
            paused_actions: HashSet::new(),
            call_restricted,
            events: Vec::new(),
            next_event_id: 1,
            next_batch_id: 1,
            current_time: Timestamp::from_secs(0),
        }
    }

    /// Move the controller clock. The oracle follows so finality windows
    /// are measured against the same time.
    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
        self.oracle.sync_clock(timestamp);
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.current_time = self.current_time.saturating_add(secs);
        self.oracle.sync_clock(self.current_time);
    }

    pub fn register_callee(&mut self, address: Address, callee: Box<dyn Callee>) {
        self.callees.insert(address, callee);
    }

    pub fn vault(&self, owner: Address, vault_id: u64) -> Option<&Vault> {
        self.ledger.get(owner, vault_id)
    }

    pub fn account_vault_counter(&self, owner: Address) -> u64 {
        self.ledger.account_vault_counter(owner)
    }

    pub fn ledger(&self) -> &VaultLedger {
        &self.ledger
    }

    pub fn is_operator(&self, account: Address, operator: Address) -> bool {
        self.operators.contains(&(account, operator))
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn full_pauser(&self) -> Address {
        self.full_pauser
    }

    pub fn partial_pauser(&self) -> Address {
        self.partial_pauser
    }

    pub fn is_system_fully_paused(&self) -> bool {
        self.system_fully_paused
    }

    pub fn is_system_partially_paused(&self) -> bool {
        self.system_partially_paused
    }

    pub fn is_action_paused(&self, action_type: ActionType) -> bool {
        self.paused_actions.contains(&action_type)
    }

    pub fn is_call_restricted(&self) -> bool {
        self.call_restricted
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn whitelist(&self) -> &W {
        &self.whitelist
    }

    pub fn whitelist_mut(&mut self) -> &mut W {
        &mut self.whitelist
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn calculator(&self) -> MarginCalculator<'_, O, B> {
        MarginCalculator::new(&self.oracle, &self.bank, self.current_time)
    }

    /// Collateral the owner could take out of the vault right now. After
    /// expiry this is what settlement would pay.
    pub fn proceeds(&self, owner: Address, vault_id: u64) -> Result<Amount, ControllerError> {
        let vault = self
            .ledger
            .get(owner, vault_id)
            .ok_or(ControllerError::InvalidVaultId { owner, vault_id })?;
        let calculator = self.calculator();
        let Some(denomination) = calculator.denomination(vault)? else {
            return Ok(Amount::zero());
        };
        let margin = calculator.excess_margin(vault, denomination)?;
        Ok(if margin.is_excess { margin.amount } else { Amount::zero() })
    }

    pub fn has_expired(&self, otoken: Address) -> Result<bool, ControllerError> {
        Ok(self.descriptor(otoken)?.has_expired(self.current_time))
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub(super) fn descriptor(&self, otoken: Address) -> Result<OtokenDescriptor, ControllerError> {
        self.bank.otoken(otoken).ok_or(ControllerError::UnknownOtoken(otoken))
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            info!(event_id = event.id.0, payload = ?event.payload, "event");
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
