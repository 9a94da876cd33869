// 9.4 settlement.rs: external token movements staged by a batch and executed only after
// every check has passed. if one instruction fails, everything already executed is
// undone with compensating instructions in reverse order.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::otoken::OptionTokens;
use crate::pool::{Pool, TransferError};
use crate::types::{Address, Amount, Timestamp};

pub type BatchId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferInstruction {
    // pull asset from a user into the pool
    ToPool { asset: Address, from: Address, amount: Amount },

    // pay asset out of the pool
    ToUser { asset: Address, to: Address, amount: Amount },

    Mint { otoken: Address, to: Address, amount: Amount },

    Burn { otoken: Address, from: Address, amount: Amount },
}

impl TransferInstruction {
    pub fn compensation(&self) -> Self {
        match *self {
            TransferInstruction::ToPool { asset, from, amount } => TransferInstruction::ToUser { asset, to: from, amount },
            TransferInstruction::ToUser { asset, to, amount } => TransferInstruction::ToPool { asset, from: to, amount },
            TransferInstruction::Mint { otoken, to, amount } => TransferInstruction::Burn { otoken, from: to, amount },
            TransferInstruction::Burn { otoken, from, amount } => TransferInstruction::Mint { otoken, to: from, amount },
        }
    }

    fn execute<B: Pool + OptionTokens + ?Sized>(&self, bank: &mut B) -> Result<(), TransferError> {
        match *self {
            TransferInstruction::ToPool { asset, from, amount } => bank.transfer_to_pool(asset, from, amount),
            TransferInstruction::ToUser { asset, to, amount } => bank.transfer_to_user(asset, to, amount),
            TransferInstruction::Mint { otoken, to, amount } => bank.mint(otoken, to, amount),
            TransferInstruction::Burn { otoken, from, amount } => bank.burn(otoken, from, amount),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Committed,
    Reverted,
    // compensation itself failed, balances need manual repair
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error("instruction {index} failed: {source}")]
    TransferFailed { index: usize, source: TransferError },

    #[error("compensation of instruction {index} failed: {source}")]
    CompensationFailed { index: usize, source: TransferError },

    #[error("batch {0} is not pending")]
    NotPending(BatchId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferBatch {
    pub batch_id: BatchId,
    pub instructions: Vec<TransferInstruction>,
    pub status: BatchStatus,
    pub created_at: Timestamp,
    // how many instructions are currently applied to the bank
    executed: usize,
}

impl TransferBatch {
    pub fn new(batch_id: BatchId, created_at: Timestamp) -> Self {
        Self {
            batch_id,
            instructions: Vec::new(),
            status: BatchStatus::Pending,
            created_at,
            executed: 0,
        }
    }

    pub fn add(&mut self, instruction: TransferInstruction) {
        self.instructions.push(instruction);
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Run every instruction in order. On failure the executed prefix is
    /// compensated and the batch ends `Reverted` (or `Failed` if that also fails).
    pub fn execute<B: Pool + OptionTokens + ?Sized>(&mut self, bank: &mut B) -> Result<(), SettlementError> {
        if self.status != BatchStatus::Pending {
            return Err(SettlementError::NotPending(self.batch_id));
        }
        for index in 0..self.instructions.len() {
            if let Err(source) = self.instructions[index].execute(bank) {
                debug!(batch_id = self.batch_id, index, %source, "transfer failed, compensating");
                self.revert(bank)?;
                return Err(SettlementError::TransferFailed { index, source });
            }
            self.executed = index + 1;
        }
        self.status = BatchStatus::Committed;
        Ok(())
    }

    /// Undo whatever has been applied, newest first.
    pub fn revert<B: Pool + OptionTokens + ?Sized>(&mut self, bank: &mut B) -> Result<(), SettlementError> {
        while self.executed > 0 {
            let index = self.executed - 1;
            let undo = self.instructions[index].compensation();
            if let Err(source) = undo.execute(bank) {
                error!(batch_id = self.batch_id, index, %source, "compensation failed");
                self.status = BatchStatus::Failed;
                return Err(SettlementError::CompensationFailed { index, source });
            }
            self.executed = index;
        }
        self.status = BatchStatus::Reverted;
        Ok(())
    }
}
