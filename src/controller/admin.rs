//! Operators, pauser roles and system switches.

use tracing::info;

use super::core::Controller;
use super::results::ControllerError;
use crate::actions::ActionType;
use crate::events::{ActionPausedEvent, EventPayload, OperatorUpdatedEvent, PauserRole, PauserUpdatedEvent};
use crate::oracle::Oracle;
use crate::otoken::OptionTokens;
use crate::pool::Pool;
use crate::types::Address;
use crate::whitelist::Whitelist;

impl<O, W, B> Controller<O, W, B>
where
    O: Oracle,
    W: Whitelist,
    B: Pool + OptionTokens,
{
    /// Let `operator` act on every vault of `caller`, or revoke it.
    pub fn set_operator(&mut self, caller: Address, operator: Address, is_operator: bool) -> Result<(), ControllerError> {
        if self.is_operator(caller, operator) == is_operator {
            return Err(ControllerError::NoStateChange);
        }
        if is_operator {
            self.operators.insert((caller, operator));
        } else {
            self.operators.remove(&(caller, operator));
        }
        info!(account = %caller, operator = %operator, is_operator, "operator updated");
        self.emit_event(EventPayload::OperatorUpdated(OperatorUpdatedEvent {
            account: caller,
            operator,
            is_set: is_operator,
        }));
        Ok(())
    }

    pub fn set_full_pauser(&mut self, caller: Address, pauser: Address) -> Result<(), ControllerError> {
        self.only_owner(caller)?;
        if pauser.is_zero() {
            return Err(ControllerError::ZeroAddress);
        }
        if pauser == self.full_pauser {
            return Err(ControllerError::NoStateChange);
        }
        let old_pauser = std::mem::replace(&mut self.full_pauser, pauser);
        self.emit_event(EventPayload::PauserUpdated(PauserUpdatedEvent {
            role: PauserRole::Full,
            old_pauser,
            new_pauser: pauser,
        }));
        Ok(())
    }

    pub fn set_partial_pauser(&mut self, caller: Address, pauser: Address) -> Result<(), ControllerError> {
        self.only_owner(caller)?;
        if pauser.is_zero() {
            return Err(ControllerError::ZeroAddress);
        }
        if pauser == self.partial_pauser {
            return Err(ControllerError::NoStateChange);
        }
        let old_pauser = std::mem::replace(&mut self.partial_pauser, pauser);
        self.emit_event(EventPayload::PauserUpdated(PauserUpdatedEvent {
            role: PauserRole::Partial,
            old_pauser,
            new_pauser: pauser,
        }));
        Ok(())
    }

    // everything stops, settle and redeem included
    pub fn set_system_fully_paused(&mut self, caller: Address, paused: bool) -> Result<(), ControllerError> {
        if caller != self.full_pauser {
            return Err(ControllerError::NotFullPauser(caller));
        }
        if self.system_fully_paused == paused {
            return Err(ControllerError::NoStateChange);
        }
        self.system_fully_paused = paused;
        info!(paused, "system full pause toggled");
        self.emit_event(EventPayload::SystemFullyPaused(paused));
        Ok(())
    }

    // everything but settle and redeem stops
    pub fn set_system_partially_paused(&mut self, caller: Address, paused: bool) -> Result<(), ControllerError> {
        if caller != self.partial_pauser {
            return Err(ControllerError::NotPartialPauser(caller));
        }
        if self.system_partially_paused == paused {
            return Err(ControllerError::NoStateChange);
        }
        self.system_partially_paused = paused;
        info!(paused, "system partial pause toggled");
        self.emit_event(EventPayload::SystemPartiallyPaused(paused));
        Ok(())
    }

    pub fn set_action_paused(
        &mut self,
        caller: Address,
        action_type: ActionType,
        paused: bool,
    ) -> Result<(), ControllerError> {
        if caller != self.partial_pauser {
            return Err(ControllerError::NotPartialPauser(caller));
        }
        if self.is_action_paused(action_type) == paused {
            return Err(ControllerError::NoStateChange);
        }
        if paused {
            self.paused_actions.insert(action_type);
        } else {
            self.paused_actions.remove(&action_type);
        }
        info!(action = %action_type, paused, "action pause toggled");
        self.emit_event(EventPayload::ActionPaused(ActionPausedEvent { action_type, paused }));
        Ok(())
    }

    pub fn set_call_restriction(&mut self, caller: Address, restricted: bool) -> Result<(), ControllerError> {
        self.only_owner(caller)?;
        if self.call_restricted == restricted {
            return Err(ControllerError::NoStateChange);
        }
        self.call_restricted = restricted;
        self.emit_event(EventPayload::CallRestricted(restricted));
        Ok(())
    }

    fn only_owner(&self, caller: Address) -> Result<(), ControllerError> {
        if caller != self.owner {
            return Err(ControllerError::NotOwner(caller));
        }
        Ok(())
    }
}
