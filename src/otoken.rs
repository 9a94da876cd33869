// 4.0 otoken.rs: option token descriptors and the token-issuer interface.

use serde::{Deserialize, Serialize};

use crate::pool::TransferError;
use crate::types::{Address, Amount, Price, Timestamp};

/// Immutable terms of an option token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OtokenDescriptor {
    pub underlying: Address,
    pub strike_asset: Address,
    pub collateral_asset: Address,
    pub strike_price: Price,
    pub expiry: Timestamp,
    pub is_put: bool,
}

impl OtokenDescriptor {
    pub fn has_expired(&self, now: Timestamp) -> bool {
        now >= self.expiry
    }

    // puts are naturally margined in the strike asset, calls in the underlying
    pub fn natural_denomination(&self) -> Address {
        if self.is_put {
            self.strike_asset
        } else {
            self.underlying
        }
    }

    pub fn product(&self) -> ProductKey {
        ProductKey {
            underlying: self.underlying,
            strike_asset: self.strike_asset,
            collateral_asset: self.collateral_asset,
            is_put: self.is_put,
        }
    }
}

/// Everything but strike and expiry. whitelisting happens at this level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductKey {
    pub underlying: Address,
    pub strike_asset: Address,
    pub collateral_asset: Address,
    pub is_put: bool,
}

pub trait OptionTokens {
    fn otoken(&self, otoken: Address) -> Option<OtokenDescriptor>;

    fn mint(&mut self, otoken: Address, to: Address, amount: Amount) -> Result<(), TransferError>;

    fn burn(&mut self, otoken: Address, from: Address, amount: Amount) -> Result<(), TransferError>;
}
