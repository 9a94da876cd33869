// 8.0: controller. the only entry point that mutates vaults. runs a batch of actions
// against a staged ledger, checks every touched vault for solvency, then moves tokens
// and commits. all or nothing.

mod admin;
mod config;
mod core;
mod operate;
mod results;
mod vault_actions;

pub use config::ControllerConfig;
pub use core::Controller;
pub use results::{BatchReceipt, ControllerError, ErrorCategory};
