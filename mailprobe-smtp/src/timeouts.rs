//! Timeout configuration for probe dialogues.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeout configuration for a single probe connection.
///
/// A stuck dialogue is aborted unilaterally once a timeout elapses; the
/// affected connection is torn down and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeTimeouts {
    /// Timeout for establishing the TCP connection.
    ///
    /// Default: 15 seconds
    #[serde(default = "default_connect_secs")]
    pub connect_secs: u64,

    /// Timeout for receiving a complete response to a single command (and
    /// for the initial greeting).
    ///
    /// Default: 15 seconds
    #[serde(default = "default_command_secs")]
    pub command_secs: u64,
}

const fn default_connect_secs() -> u64 {
    15
}

const fn default_command_secs() -> u64 {
    15
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect_secs(),
            command_secs: default_command_secs(),
        }
    }
}

impl ProbeTimeouts {
    /// The TCP connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    /// The per-command timeout as a [`Duration`].
    #[must_use]
    pub const fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }
}
