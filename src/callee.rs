// 9.3 callee.rs: arbitrary external calls made at the end of a batch.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::types::Address;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalleeError {
    #[error("call rejected: {0}")]
    Rejected(String),
}

pub trait Callee {
    fn call(&mut self, caller: Address, data: &[u8]) -> Result<(), CalleeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub caller: Address,
    pub data: Vec<u8>,
}

pub type CallLog = Rc<RefCell<Vec<CallRecord>>>;

/// Records every call into a shared log. `reject_empty` turns empty payloads into failures.
#[derive(Debug, Default)]
pub struct RecordingCallee {
    log: CallLog,
    reject_empty: bool,
}

impl RecordingCallee {
    pub fn new() -> (Self, CallLog) {
        let log = CallLog::default();
        (
            Self {
                log: Rc::clone(&log),
                reject_empty: false,
            },
            log,
        )
    }

    pub fn rejecting_empty(mut self) -> Self {
        self.reject_empty = true;
        self
    }
}

impl Callee for RecordingCallee {
    fn call(&mut self, caller: Address, data: &[u8]) -> Result<(), CalleeError> {
        if self.reject_empty && data.is_empty() {
            return Err(CalleeError::Rejected("empty payload".to_string()));
        }
        self.log.borrow_mut().push(CallRecord {
            caller,
            data: data.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls() {
        let (mut callee, log) = RecordingCallee::new();
        callee.call(Address::from_low_u64(1), b"ping").unwrap();
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].data, b"ping".to_vec());
    }

    #[test]
    fn rejects_empty_payload_when_asked() {
        let (callee, log) = RecordingCallee::new();
        let mut callee = callee.rejecting_empty();
        assert!(callee.call(Address::from_low_u64(1), &[]).is_err());
        assert!(log.borrow().is_empty());
    }
}
