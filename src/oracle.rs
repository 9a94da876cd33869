// 9.0 oracle.rs: MOCKED. spot and expiry prices held in memory, no pricer feeds.
// an expiry price can only be reported once the locking period after expiry has passed,
// and only counts as final once the dispute period after the report has passed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Address, Price, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("no spot price for {0}")]
    MissingPrice(Address),

    #[error("locking period for {asset} at {expiry} is not over")]
    LockingPeriodNotOver { asset: Address, expiry: Timestamp },

    #[error("dispute period for {asset} at {expiry} is over, price is final")]
    DisputePeriodOver { asset: Address, expiry: Timestamp },
}

pub trait Oracle {
    fn price(&self, asset: Address) -> Result<Price, OracleError>;

    // (price, finalized). an unreported price comes back as (0, false).
    fn expiry_price(&self, asset: Address, expiry: Timestamp) -> Result<(Price, bool), OracleError>;

    fn is_locking_period_over(&self, asset: Address, expiry: Timestamp) -> bool;

    fn is_dispute_period_over(&self, asset: Address, expiry: Timestamp) -> bool;

    // feeds that read a real clock ignore this
    fn sync_clock(&mut self, _now: Timestamp) {}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    // seconds after expiry before a price may be reported
    pub locking_period_secs: u64,
    // seconds after a report before the price is final
    pub dispute_period_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            locking_period_secs: 0,
            dispute_period_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExpiryReport {
    price: Price,
    reported_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct InMemoryOracle {
    config: OracleConfig,
    spot: HashMap<Address, Price>,
    expiry: HashMap<(Address, Timestamp), ExpiryReport>,
    now: Timestamp,
}

impl InMemoryOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            config,
            spot: HashMap::new(),
            expiry: HashMap::new(),
            now: Timestamp::from_secs(0),
        }
    }

    pub fn set_time(&mut self, now: Timestamp) {
        self.now = now;
    }

    pub fn set_spot_price(&mut self, asset: Address, price: Price) {
        self.spot.insert(asset, price);
    }

    /// Report the settlement price for `asset` at `expiry`. Re-reporting
    /// overwrites only while the dispute window is still open.
    pub fn set_expiry_price(&mut self, asset: Address, expiry: Timestamp, price: Price) -> Result<(), OracleError> {
        if !self.is_locking_period_over(asset, expiry) {
            return Err(OracleError::LockingPeriodNotOver { asset, expiry });
        }
        if self.expiry.contains_key(&(asset, expiry)) && self.is_dispute_period_over(asset, expiry) {
            return Err(OracleError::DisputePeriodOver { asset, expiry });
        }
        self.expiry.insert(
            (asset, expiry),
            ExpiryReport {
                price,
                reported_at: self.now,
            },
        );
        Ok(())
    }
}

impl Default for InMemoryOracle {
    fn default() -> Self {
        Self::new(OracleConfig::default())
    }
}

impl Oracle for InMemoryOracle {
    fn price(&self, asset: Address) -> Result<Price, OracleError> {
        self.spot
            .get(&asset)
            .copied()
            .filter(|p| !p.is_zero())
            .ok_or(OracleError::MissingPrice(asset))
    }

    fn expiry_price(&self, asset: Address, expiry: Timestamp) -> Result<(Price, bool), OracleError> {
        match self.expiry.get(&(asset, expiry)) {
            Some(report) => Ok((report.price, self.is_dispute_period_over(asset, expiry))),
            None => Ok((Price::ZERO, false)),
        }
    }

    fn is_locking_period_over(&self, _asset: Address, expiry: Timestamp) -> bool {
        self.now >= expiry.saturating_add(self.config.locking_period_secs)
    }

    fn is_dispute_period_over(&self, asset: Address, expiry: Timestamp) -> bool {
        match self.expiry.get(&(asset, expiry)) {
            Some(report) => self.now >= report.reported_at.saturating_add(self.config.dispute_period_secs),
            None => false,
        }
    }

    fn sync_clock(&mut self, now: Timestamp) {
        self.now = now;
    }
}
