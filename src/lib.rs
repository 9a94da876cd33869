// options-vault-core: collateralized options vault engine.
// solvency-first architecture: every batch ends with every touched vault covered.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Address, Amount, Price, Timestamp, VaultKey
//   2.x  fixed_point.rs: signed 27-decimal fixed point
//   3.x  vault.rs: vault slots and the one-asset-per-slot rule
//   3.1  ledger.rs: (owner, vault id) storage plus staged overlay
//   4.x  otoken.rs: option terms and the token issuer interface
//   5.x  calculator.rs: live margin requirement, expired cash value
//   6.x  actions.rs: raw action args and validated actions
//   7.x  config.rs: controller and oracle settings, env presets
//   8.x  controller/: batch state machine, admin, per-action handlers
//   9.x  oracle.rs: spot and expiry prices (mocked)
//   9.1  whitelist.rs: collateral, product, otoken, callee lists (mocked)
//   9.2  pool.rs: custody of deposited assets (mocked)
//   9.3  callee.rs: external call hook
//   9.4  settlement.rs: staged transfers with compensation
//   11.x events.rs: state transition events for audit

// core vault modules
pub mod calculator;
pub mod controller;
pub mod fixed_point;
pub mod ledger;
pub mod types;
pub mod vault;

// action and event modules
pub mod actions;
pub mod events;
pub mod settlement;

// integration modules
pub mod callee;
pub mod config;
pub mod oracle;
pub mod otoken;
pub mod pool;
pub mod whitelist;

// re exports for convenience
pub use actions::*;
pub use events::*;
pub use types::*;
pub use calculator::{CalculatorError, ExcessMargin, MarginCalculator};
pub use callee::{CallLog, CallRecord, Callee, CalleeError, RecordingCallee};
pub use config::{ConfigError, Environment, ProtocolConfig};
pub use controller::{BatchReceipt, Controller, ControllerConfig, ControllerError, ErrorCategory};
pub use fixed_point::{FixedPoint, MathError};
pub use ledger::VaultLedger;
pub use oracle::{InMemoryOracle, Oracle, OracleConfig, OracleError};
pub use otoken::{OptionTokens, OtokenDescriptor, ProductKey};
pub use pool::{Pool, TokenBank, TransferError};
pub use settlement::{BatchStatus, SettlementError, TransferBatch, TransferInstruction};
pub use vault::{Slot, SlotDelta, Vault, VaultError};
pub use whitelist::{InMemoryWhitelist, Whitelist};
