//! Controller configuration options.

use serde::{Deserialize, Serialize};

/// Controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Echo every committed event through the log.
    pub verbose: bool,
    /// Start with arbitrary calls limited to whitelisted callees.
    pub call_restricted: bool,
    /// Upper bound on actions in a single `operate` call.
    pub max_actions_per_batch: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            verbose: false,
            call_restricted: true,
            max_actions_per_batch: 64,
        }
    }
}
