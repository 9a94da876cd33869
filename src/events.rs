// 11.0: every committed state change produces an event. used for audit trails, indexers,
// and rebuilding vault state off-chain. the EventPayload enum lists all event types.

use serde::{Deserialize, Serialize};

use crate::actions::ActionType;
use crate::types::{Address, Amount, Timestamp};
use crate::vault::Vault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    // Vault events
    VaultOpened(VaultOpenedEvent),
    CollateralDeposited(VaultMovementEvent),
    CollateralWithdrawn(VaultMovementEvent),
    ShortMinted(VaultMovementEvent),
    ShortBurned(VaultMovementEvent),
    LongDeposited(VaultMovementEvent),
    LongWithdrawn(VaultMovementEvent),
    VaultSettled(VaultSettledEvent),

    // Holder events
    Redeemed(RedeemEvent),
    CallExecuted(CallExecutedEvent),

    // Admin events
    OperatorUpdated(OperatorUpdatedEvent),
    SystemFullyPaused(bool),
    SystemPartiallyPaused(bool),
    ActionPaused(ActionPausedEvent),
    CallRestricted(bool),
    PauserUpdated(PauserUpdatedEvent),
}

impl EventPayload {
    pub fn vault_owner(&self) -> Option<Address> {
        match self {
            EventPayload::VaultOpened(e) => Some(e.owner),
            EventPayload::CollateralDeposited(e)
            | EventPayload::CollateralWithdrawn(e)
            | EventPayload::ShortMinted(e)
            | EventPayload::ShortBurned(e)
            | EventPayload::LongDeposited(e)
            | EventPayload::LongWithdrawn(e) => Some(e.owner),
            EventPayload::VaultSettled(e) => Some(e.owner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultOpenedEvent {
    pub owner: Address,
    pub vault_id: u64,
    pub vault: Vault,
}

// counterparty is the payer on deposits/burns and the receiver on withdrawals/mints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultMovementEvent {
    pub owner: Address,
    pub vault_id: u64,
    pub asset: Address,
    pub counterparty: Address,
    pub amount: Amount,
    pub vault: Vault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSettledEvent {
    pub owner: Address,
    pub vault_id: u64,
    pub to: Address,
    pub short_otoken: Option<Address>,
    pub collateral_asset: Option<Address>,
    pub payout: Amount,
    pub vault: Vault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemEvent {
    pub redeemer: Address,
    pub receiver: Address,
    pub otoken: Address,
    pub collateral_asset: Address,
    pub otoken_burned: Amount,
    pub payout: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallExecutedEvent {
    pub caller: Address,
    pub callee: Address,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorUpdatedEvent {
    pub account: Address,
    pub operator: Address,
    pub is_set: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPausedEvent {
    pub action_type: ActionType,
    pub paused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauserRole {
    Full,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauserUpdatedEvent {
    pub role: PauserRole,
    pub old_pauser: Address,
    pub new_pauser: Address,
}
