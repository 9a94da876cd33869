// 5.0 actions.rs: the flat argument record callers submit, and its typed parse.
// ActionArgs mirrors the wire shape: one record type for every action, fields
// reinterpreted per action type. Action is what the controller actually dispatches on.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Address, Amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    OpenVault,
    MintShortOption,
    BurnShortOption,
    DepositLongOption,
    WithdrawLongOption,
    DepositCollateral,
    WithdrawCollateral,
    SettleVault,
    Redeem,
    Call,
}

impl ActionType {
    pub const ALL: [ActionType; 10] = [
        ActionType::OpenVault,
        ActionType::MintShortOption,
        ActionType::BurnShortOption,
        ActionType::DepositLongOption,
        ActionType::WithdrawLongOption,
        ActionType::DepositCollateral,
        ActionType::WithdrawCollateral,
        ActionType::SettleVault,
        ActionType::Redeem,
        ActionType::Call,
    ];

    // settle and redeem stay open under a partial pause so holders can always exit
    pub fn survives_partial_pause(&self) -> bool {
        matches!(self, ActionType::SettleVault | ActionType::Redeem)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::OpenVault => "open_vault",
            ActionType::MintShortOption => "mint_short_option",
            ActionType::BurnShortOption => "burn_short_option",
            ActionType::DepositLongOption => "deposit_long_option",
            ActionType::WithdrawLongOption => "withdraw_long_option",
            ActionType::DepositCollateral => "deposit_collateral",
            ActionType::WithdrawCollateral => "withdraw_collateral",
            ActionType::SettleVault => "settle_vault",
            ActionType::Redeem => "redeem",
            ActionType::Call => "call",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionArgs {
    pub action_type: ActionType,
    pub owner: Address,
    // from / to / receiver / callee depending on the action
    pub second_address: Address,
    pub asset: Address,
    pub vault_id: u64,
    pub amount: Amount,
    pub index: usize,
    pub data: Vec<u8>,
}

impl ActionArgs {
    fn base(action_type: ActionType) -> Self {
        Self {
            action_type,
            owner: Address::ZERO,
            second_address: Address::ZERO,
            asset: Address::ZERO,
            vault_id: 0,
            amount: Amount::zero(),
            index: 0,
            data: Vec::new(),
        }
    }

    fn vault(action_type: ActionType, owner: Address, vault_id: u64) -> Self {
        Self { owner, vault_id, ..Self::base(action_type) }
    }

    pub fn open_vault(owner: Address, vault_id: u64) -> Self {
        Self::vault(ActionType::OpenVault, owner, vault_id)
    }

    pub fn deposit_collateral(owner: Address, vault_id: u64, from: Address, asset: Address, amount: Amount) -> Self {
        Self { second_address: from, asset, amount, ..Self::vault(ActionType::DepositCollateral, owner, vault_id) }
    }

    pub fn withdraw_collateral(owner: Address, vault_id: u64, to: Address, asset: Address, amount: Amount) -> Self {
        Self { second_address: to, asset, amount, ..Self::vault(ActionType::WithdrawCollateral, owner, vault_id) }
    }

    pub fn mint_short(owner: Address, vault_id: u64, to: Address, otoken: Address, amount: Amount) -> Self {
        Self { second_address: to, asset: otoken, amount, ..Self::vault(ActionType::MintShortOption, owner, vault_id) }
    }

    pub fn burn_short(owner: Address, vault_id: u64, from: Address, otoken: Address, amount: Amount) -> Self {
        Self { second_address: from, asset: otoken, amount, ..Self::vault(ActionType::BurnShortOption, owner, vault_id) }
    }

    pub fn deposit_long(owner: Address, vault_id: u64, from: Address, otoken: Address, amount: Amount) -> Self {
        Self { second_address: from, asset: otoken, amount, ..Self::vault(ActionType::DepositLongOption, owner, vault_id) }
    }

    pub fn withdraw_long(owner: Address, vault_id: u64, to: Address, otoken: Address, amount: Amount) -> Self {
        Self { second_address: to, asset: otoken, amount, ..Self::vault(ActionType::WithdrawLongOption, owner, vault_id) }
    }

    pub fn settle_vault(owner: Address, vault_id: u64, to: Address) -> Self {
        Self { second_address: to, ..Self::vault(ActionType::SettleVault, owner, vault_id) }
    }

    pub fn redeem(otoken: Address, receiver: Address, amount: Amount) -> Self {
        Self { second_address: receiver, asset: otoken, amount, ..Self::base(ActionType::Redeem) }
    }

    pub fn call(callee: Address, data: Vec<u8>) -> Self {
        Self { second_address: callee, data, ..Self::base(ActionType::Call) }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("{0}: owner cannot be the zero address")]
    ZeroOwner(ActionType),

    #[error("{0}: counterparty cannot be the zero address")]
    ZeroCounterparty(ActionType),

    #[error("{0}: asset cannot be the zero address")]
    ZeroAsset(ActionType),

    #[error("{0}: vault id must be positive")]
    ZeroVaultId(ActionType),

    #[error("{0}: amount must be greater than zero")]
    ZeroAmount(ActionType),
}

/// Vault-scoped movement: who owns the vault, which one, the counterparty that
/// pays or receives, the asset and amount, and the slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub owner: Address,
    pub vault_id: u64,
    pub counterparty: Address,
    pub asset: Address,
    pub amount: Amount,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenVault { owner: Address, vault_id: u64 },
    DepositCollateral(Movement),
    WithdrawCollateral(Movement),
    MintShort(Movement),
    BurnShort(Movement),
    DepositLong(Movement),
    WithdrawLong(Movement),
    Settle { owner: Address, vault_id: u64, to: Address },
    Redeem { otoken: Address, receiver: Address, amount: Amount },
    Call { callee: Address, data: Vec<u8> },
}

impl Action {
    pub fn parse(args: &ActionArgs) -> Result<Self, ActionError> {
        let kind = args.action_type;
        let action = match kind {
            ActionType::OpenVault => {
                require_owner(args)?;
                Action::OpenVault { owner: args.owner, vault_id: args.vault_id }
            }
            ActionType::DepositCollateral => Action::DepositCollateral(movement(args)?),
            ActionType::WithdrawCollateral => Action::WithdrawCollateral(movement(args)?),
            ActionType::MintShortOption => Action::MintShort(movement(args)?),
            ActionType::BurnShortOption => Action::BurnShort(movement(args)?),
            ActionType::DepositLongOption => Action::DepositLong(movement(args)?),
            ActionType::WithdrawLongOption => Action::WithdrawLong(movement(args)?),
            ActionType::SettleVault => {
                require_owner(args)?;
                require_vault_id(args)?;
                if args.second_address.is_zero() {
                    return Err(ActionError::ZeroCounterparty(kind));
                }
                Action::Settle { owner: args.owner, vault_id: args.vault_id, to: args.second_address }
            }
            ActionType::Redeem => {
                if args.second_address.is_zero() {
                    return Err(ActionError::ZeroCounterparty(kind));
                }
                if args.asset.is_zero() {
                    return Err(ActionError::ZeroAsset(kind));
                }
                if args.amount.is_zero() {
                    return Err(ActionError::ZeroAmount(kind));
                }
                Action::Redeem { otoken: args.asset, receiver: args.second_address, amount: args.amount }
            }
            ActionType::Call => {
                if args.second_address.is_zero() {
                    return Err(ActionError::ZeroCounterparty(kind));
                }
                Action::Call { callee: args.second_address, data: args.data.clone() }
            }
        };
        Ok(action)
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Action::OpenVault { .. } => ActionType::OpenVault,
            Action::DepositCollateral(_) => ActionType::DepositCollateral,
            Action::WithdrawCollateral(_) => ActionType::WithdrawCollateral,
            Action::MintShort(_) => ActionType::MintShortOption,
            Action::BurnShort(_) => ActionType::BurnShortOption,
            Action::DepositLong(_) => ActionType::DepositLongOption,
            Action::WithdrawLong(_) => ActionType::WithdrawLongOption,
            Action::Settle { .. } => ActionType::SettleVault,
            Action::Redeem { .. } => ActionType::Redeem,
            Action::Call { .. } => ActionType::Call,
        }
    }

    /// Owner of the vault this action touches. Redeem and Call touch none.
    pub fn vault_owner(&self) -> Option<Address> {
        match self {
            Action::OpenVault { owner, .. } | Action::Settle { owner, .. } => Some(*owner),
            Action::DepositCollateral(m)
            | Action::WithdrawCollateral(m)
            | Action::MintShort(m)
            | Action::BurnShort(m)
            | Action::DepositLong(m)
            | Action::WithdrawLong(m) => Some(m.owner),
            Action::Redeem { .. } | Action::Call { .. } => None,
        }
    }
}

fn movement(args: &ActionArgs) -> Result<Movement, ActionError> {
    require_owner(args)?;
    require_vault_id(args)?;
    let kind = args.action_type;
    if args.second_address.is_zero() {
        return Err(ActionError::ZeroCounterparty(kind));
    }
    if args.asset.is_zero() {
        return Err(ActionError::ZeroAsset(kind));
    }
    if args.amount.is_zero() {
        return Err(ActionError::ZeroAmount(kind));
    }
    Ok(Movement {
        owner: args.owner,
        vault_id: args.vault_id,
        counterparty: args.second_address,
        asset: args.asset,
        amount: args.amount,
        index: args.index,
    })
}

fn require_owner(args: &ActionArgs) -> Result<(), ActionError> {
    if args.owner.is_zero() {
        return Err(ActionError::ZeroOwner(args.action_type));
    }
    Ok(())
}

fn require_vault_id(args: &ActionArgs) -> Result<(), ActionError> {
    if args.vault_id == 0 {
        return Err(ActionError::ZeroVaultId(args.action_type));
    }
    Ok(())
}
