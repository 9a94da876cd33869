// 9.2 pool.rs: MOCKED. custody pool plus otoken issuer in one balance sheet.
// every asset, otokens included, is a plain (asset, holder) -> amount entry. no real token transfers.

use std::collections::HashMap;

use crate::otoken::{OptionTokens, OtokenDescriptor};
use crate::types::{Address, Amount};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("{holder} holds {available} of {asset}, needs {requested}")]
    InsufficientBalance {
        asset: Address,
        holder: Address,
        available: Amount,
        requested: Amount,
    },

    #[error("{0} is not a known otoken")]
    UnknownOtoken(Address),

    #[error("balance overflow for {asset}")]
    Overflow { asset: Address },
}

pub trait Pool {
    fn address(&self) -> Address;

    fn transfer_to_pool(&mut self, asset: Address, from: Address, amount: Amount) -> Result<(), TransferError>;

    fn transfer_to_user(&mut self, asset: Address, to: Address, amount: Amount) -> Result<(), TransferError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBank {
    address: Address,
    balances: HashMap<(Address, Address), Amount>,
    otokens: HashMap<Address, OtokenDescriptor>,
}

impl TokenBank {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: HashMap::new(),
            otokens: HashMap::new(),
        }
    }

    pub fn register_otoken(&mut self, otoken: Address, descriptor: OtokenDescriptor) {
        self.otokens.insert(otoken, descriptor);
    }

    /// Fund a holder out of thin air. setup only.
    pub fn credit(&mut self, asset: Address, holder: Address, amount: Amount) -> Result<(), TransferError> {
        let balance = self.balances.entry((asset, holder)).or_default();
        *balance = balance.checked_add(amount).ok_or(TransferError::Overflow { asset })?;
        Ok(())
    }

    pub fn balance_of(&self, asset: Address, holder: Address) -> Amount {
        self.balances.get(&(asset, holder)).copied().unwrap_or_default()
    }

    pub fn pool_balance(&self, asset: Address) -> Amount {
        self.balance_of(asset, self.address)
    }

    pub fn total_supply(&self, asset: Address) -> Amount {
        self.balances
            .iter()
            .filter(|((a, _), _)| *a == asset)
            .fold(Amount::zero(), |acc, (_, amount)| Amount::new(acc.raw().saturating_add(amount.raw())))
    }

    fn debit(&mut self, asset: Address, holder: Address, amount: Amount) -> Result<(), TransferError> {
        let available = self.balance_of(asset, holder);
        let remaining = available.checked_sub(amount).ok_or(TransferError::InsufficientBalance {
            asset,
            holder,
            available,
            requested: amount,
        })?;
        if remaining.is_zero() {
            self.balances.remove(&(asset, holder));
        } else {
            self.balances.insert((asset, holder), remaining);
        }
        Ok(())
    }

    fn transfer(&mut self, asset: Address, from: Address, to: Address, amount: Amount) -> Result<(), TransferError> {
        // credit can only fail on overflow; check it before debiting
        self.balance_of(asset, to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow { asset })?;
        self.debit(asset, from, amount)?;
        self.credit(asset, to, amount)
    }
}

impl Pool for TokenBank {
    fn address(&self) -> Address {
        self.address
    }

    fn transfer_to_pool(&mut self, asset: Address, from: Address, amount: Amount) -> Result<(), TransferError> {
        self.transfer(asset, from, self.address, amount)
    }

    fn transfer_to_user(&mut self, asset: Address, to: Address, amount: Amount) -> Result<(), TransferError> {
        self.transfer(asset, self.address, to, amount)
    }
}

impl OptionTokens for TokenBank {
    fn otoken(&self, otoken: Address) -> Option<OtokenDescriptor> {
        self.otokens.get(&otoken).copied()
    }

    fn mint(&mut self, otoken: Address, to: Address, amount: Amount) -> Result<(), TransferError> {
        if !self.otokens.contains_key(&otoken) {
            return Err(TransferError::UnknownOtoken(otoken));
        }
        self.credit(otoken, to, amount)
    }

    fn burn(&mut self, otoken: Address, from: Address, amount: Amount) -> Result<(), TransferError> {
        if !self.otokens.contains_key(&otoken) {
            return Err(TransferError::UnknownOtoken(otoken));
        }
        self.debit(otoken, from, amount)
    }
}
