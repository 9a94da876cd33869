// 8.0.2: result types and errors for controller operations.

use serde::{Deserialize, Serialize};

use crate::actions::{ActionError, ActionType};
use crate::calculator::CalculatorError;
use crate::callee::CalleeError;
use crate::settlement::{BatchId, SettlementError};
use crate::types::{Address, Amount, VaultKey};
use crate::vault::VaultError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    pub batch_id: BatchId,
    pub actions_applied: usize,
    pub touched_vaults: Vec<VaultKey>,
    pub transfers_executed: usize,
    pub events_emitted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authorization,
    Structural,
    Market,
    Solvency,
    Arithmetic,
    Collaborator,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    // authorization
    #[error("{0} is not the controller owner")]
    NotOwner(Address),

    #[error("{0} is not the full pauser")]
    NotFullPauser(Address),

    #[error("{0} is not the partial pauser")]
    NotPartialPauser(Address),

    #[error("{caller} is not the owner or an operator of {owner}")]
    Unauthorized { caller: Address, owner: Address },

    #[error("{action}: {sender} must be the caller or the vault owner")]
    InvalidSender { action: ActionType, sender: Address },

    // structural
    #[error("vault id for {owner} must be {expected}, got {got}")]
    UnexpectedVaultId { owner: Address, expected: u64, got: u64 },

    #[error("vault {vault_id} of {owner} does not exist")]
    InvalidVaultId { owner: Address, vault_id: u64 },

    #[error("batch has {actions} actions, limit is {max}")]
    BatchTooLarge { actions: usize, max: usize },

    #[error("invalid action: {0}")]
    Action(#[from] ActionError),

    #[error("vault error: {0}")]
    Vault(#[from] VaultError),

    // market
    #[error("system is fully paused")]
    SystemFullyPaused,

    #[error("system is partially paused, {0} is blocked")]
    SystemPartiallyPaused(ActionType),

    #[error("{0} is paused")]
    ActionPaused(ActionType),

    #[error("otoken {0} is not whitelisted")]
    OtokenNotWhitelisted(Address),

    #[error("collateral {0} is not whitelisted")]
    CollateralNotWhitelisted(Address),

    #[error("product of otoken {0} is not whitelisted")]
    ProductNotWhitelisted(Address),

    #[error("callee {0} is not whitelisted")]
    CalleeNotWhitelisted(Address),

    #[error("no callee registered at {0}")]
    UnknownCallee(Address),

    #[error("{0} is not a known otoken")]
    UnknownOtoken(Address),

    #[error("otoken {0} has expired")]
    OtokenExpired(Address),

    #[error("otoken {0} has not expired yet")]
    OtokenNotExpired(Address),

    #[error("short position in vault {vault_id} of {owner} has expired, settle instead")]
    ShortExpired { owner: Address, vault_id: u64 },

    #[error("vault {vault_id} of {owner} has no short or long to settle")]
    NothingToSettle { owner: Address, vault_id: u64 },

    #[error("address cannot be zero")]
    ZeroAddress,

    #[error("no state change")]
    NoStateChange,

    // solvency
    #[error("vault {vault_id} of {owner} is undercollateralized by {deficit}")]
    Insolvent { owner: Address, vault_id: u64, deficit: Amount },

    // collaborators and math
    #[error("calculator error: {0}")]
    Calculator(#[from] CalculatorError),

    #[error("settlement error: {0}")]
    Settlement(#[from] SettlementError),

    #[error("call to {callee} failed: {source}")]
    Callee { callee: Address, source: CalleeError },
}

impl ControllerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ControllerError::NotOwner(_)
            | ControllerError::NotFullPauser(_)
            | ControllerError::NotPartialPauser(_)
            | ControllerError::Unauthorized { .. }
            | ControllerError::InvalidSender { .. } => ErrorCategory::Authorization,

            ControllerError::UnexpectedVaultId { .. }
            | ControllerError::InvalidVaultId { .. }
            | ControllerError::BatchTooLarge { .. }
            | ControllerError::Action(_)
            | ControllerError::Vault(_) => ErrorCategory::Structural,

            ControllerError::SystemFullyPaused
            | ControllerError::SystemPartiallyPaused(_)
            | ControllerError::ActionPaused(_)
            | ControllerError::OtokenNotWhitelisted(_)
            | ControllerError::CollateralNotWhitelisted(_)
            | ControllerError::ProductNotWhitelisted(_)
            | ControllerError::CalleeNotWhitelisted(_)
            | ControllerError::UnknownCallee(_)
            | ControllerError::UnknownOtoken(_)
            | ControllerError::OtokenExpired(_)
            | ControllerError::OtokenNotExpired(_)
            | ControllerError::ShortExpired { .. }
            | ControllerError::NothingToSettle { .. }
            | ControllerError::ZeroAddress
            | ControllerError::NoStateChange => ErrorCategory::Market,

            ControllerError::Insolvent { .. } => ErrorCategory::Solvency,

            ControllerError::Calculator(e) => match e {
                CalculatorError::TooManyShorts
                | CalculatorError::TooManyLongs
                | CalculatorError::TooManyCollaterals
                | CalculatorError::ShortLengthMismatch
                | CalculatorError::LongLengthMismatch
                | CalculatorError::CollateralLengthMismatch
                | CalculatorError::LongNotMarginable
                | CalculatorError::CollateralNotMarginable
                | CalculatorError::WrongDenomination { .. } => ErrorCategory::Structural,
                CalculatorError::UnknownOtoken(_)
                | CalculatorError::NotExpired(_)
                | CalculatorError::PriceNotFinalized { .. } => ErrorCategory::Market,
                CalculatorError::Oracle(_) => ErrorCategory::Collaborator,
                CalculatorError::Math(_) => ErrorCategory::Arithmetic,
            },

            ControllerError::Settlement(_) | ControllerError::Callee { .. } => ErrorCategory::Collaborator,
        }
    }
}
