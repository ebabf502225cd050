//! Configuration types for the verification layer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use mailprobe_smtp::ProbeTimeouts;

use crate::dns::DnsConfig;

/// Configuration for one per-exchanger connection pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum simultaneously open connections per exchanger.
    ///
    /// Default: 5
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

const fn default_max_connections() -> usize {
    5
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

/// Configuration for the global admission limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum simultaneously open transport connections across all pools.
    ///
    /// Default: 256
    #[serde(default = "default_max_sockets")]
    pub max_sockets: usize,
}

const fn default_max_sockets() -> usize {
    256
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_sockets: default_max_sockets(),
        }
    }
}

/// Policy configuration for the verification controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Whether a greylisting verdict is retried once after the server's
    /// estimated delay. When disabled, greylisting fails the exchanger
    /// immediately.
    ///
    /// Default: true
    #[serde(default = "default_greylist_retry")]
    pub greylist_retry: bool,

    /// Upper bound on how long to park a probe waiting out a greylist
    /// window. `None` honours the server's full estimated delay (up to ten
    /// minutes for some providers).
    #[serde(default)]
    pub greylist_wait_cap: Option<Duration>,
}

const fn default_greylist_retry() -> bool {
    true
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            greylist_retry: default_greylist_retry(),
            greylist_wait_cap: None,
        }
    }
}

/// Aggregated configuration for a [`Verifier`](crate::Verifier).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Per-connection dialogue timeouts.
    #[serde(default)]
    pub timeouts: ProbeTimeouts,

    /// Per-exchanger pool sizing.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Global connection admission.
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Controller policy.
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// DNS resolver settings.
    #[serde(default)]
    pub dns: DnsConfig,
}
