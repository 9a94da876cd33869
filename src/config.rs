// 7.0 config.rs: all settings in one place. controller limits plus oracle timing.
// 7.1 presets per environment, checked with validate() before anything is wired up.

use serde::{Deserialize, Serialize};

use crate::controller::ControllerConfig;
use crate::oracle::OracleConfig;

// hard ceilings, anything above these is a typo
const MAX_BATCH_ACTIONS: usize = 1_024;
const MAX_ORACLE_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub controller: ControllerConfig,
    pub oracle: OracleConfig,
}

impl ProtocolConfig {
    // short oracle windows so expiry flows can be exercised quickly
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.controller.verbose = true;
        config.controller.call_restricted = false;
        config.oracle.locking_period_secs = 60;
        config.oracle.dispute_period_secs = 5 * 60;
        config
    }

    pub fn mainnet() -> Self {
        let mut config = Self::default();
        config.controller.max_actions_per_batch = 32;
        config.controller.call_restricted = true;
        config.oracle.locking_period_secs = 15 * 60;
        config.oracle.dispute_period_secs = 2 * 60 * 60;
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let controller = &self.controller;
        if controller.max_actions_per_batch == 0 {
            return Err(ConfigError::InvalidController {
                reason: "batches must allow at least one action".to_string(),
            });
        }
        if controller.max_actions_per_batch > MAX_BATCH_ACTIONS {
            return Err(ConfigError::InvalidController {
                reason: format!("batch limit above {MAX_BATCH_ACTIONS}"),
            });
        }
        if controller.max_events == 0 {
            return Err(ConfigError::InvalidController {
                reason: "event log needs room for at least one event".to_string(),
            });
        }

        if self.oracle.locking_period_secs > MAX_ORACLE_WINDOW_SECS
            || self.oracle.dispute_period_secs > MAX_ORACLE_WINDOW_SECS
        {
            return Err(ConfigError::InvalidOracle {
                reason: "locking and dispute periods are capped at one week".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid controller config: {reason}")]
    InvalidController { reason: String },

    #[error("invalid oracle config: {reason}")]
    InvalidOracle { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> ProtocolConfig {
        match self {
            Environment::Development => ProtocolConfig::default(),
            Environment::Testnet => ProtocolConfig::testnet(),
            Environment::Mainnet => ProtocolConfig::mainnet(),
        }
    }
}
