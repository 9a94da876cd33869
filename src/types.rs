// 1.0: all the primitives live here. nothing in the engine works without these types.
// addresses, token amounts, strikes, timestamps. each is a newtype so the compiler catches unit mixups.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimals every token amount and price carries.
pub const BASE_DECIMALS: u32 = 8;

const BASE_UNIT: u128 = 100_000_000;

// 20 byte account / asset identifier. the zero address means "nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    // big-endian u64 in the low 8 bytes, handy for fixtures
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

// 1.1: token quantity in base units (8 decimals). 1 token = 100_000_000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    // whole tokens
    pub fn from_units(units: u64) -> Self {
        Self(units as u128 * BASE_UNIT)
    }

    /// Human units to base units. Digits past the 8th decimal are truncated,
    /// negative values are rejected.
    #[must_use]
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        decimal_to_base(value).map(Self)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Amount) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: Amount) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        base_to_decimal(self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_base_units(self.0, f)
    }
}

// 1.2: strike or oracle price, 8 decimals. zero means "no price".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Price(u128);

impl Price {
    pub const ZERO: Price = Price(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn from_units(units: u64) -> Self {
        Self(units as u128 * BASE_UNIT)
    }

    #[must_use]
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        decimal_to_base(value).map(Self)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        base_to_decimal(self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_base_units(self.0, f)
    }
}

// 1.3: unix timestamp in seconds. expiries and oracle windows use this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn saturating_add(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match chrono::DateTime::<chrono::Utc>::from_timestamp(self.0 as i64, 0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            None => write!(f, "{}s", self.0),
        }
    }
}

// 1.4: a vault is addressed by its owner plus a per-owner sequential id starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VaultKey {
    pub owner: Address,
    pub vault_id: u64,
}

impl VaultKey {
    pub fn new(owner: Address, vault_id: u64) -> Self {
        Self { owner, vault_id }
    }
}

impl fmt::Display for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.vault_id)
    }
}

fn decimal_to_base(value: Decimal) -> Option<u128> {
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    value
        .checked_mul(Decimal::from(BASE_UNIT as u64))?
        .trunc()
        .to_u128()
}

fn base_to_decimal(raw: u128) -> Option<Decimal> {
    let raw = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(raw, BASE_DECIMALS)
        .ok()
        .map(|d| d.normalize())
}

fn fmt_base_units(raw: u128, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let whole = raw / BASE_UNIT;
    let frac = raw % BASE_UNIT;
    if frac == 0 {
        write!(f, "{}", whole)
    } else {
        let digits = format!("{:08}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}
