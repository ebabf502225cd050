//! MX resolution for probe targets.
//!
//! Resolution is deliberately behind the [`MxResolver`] trait: the
//! controller only needs "an ordered set of exchangers for this domain, or
//! an empty set when the domain cannot receive mail", and tests substitute
//! static zones for the real resolver.

use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::{
    TokioResolver,
    config::ResolverOpts,
    name_server::TokioConnectionProvider,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during MX resolution.
#[derive(Debug, Error)]
pub enum DnsError {
    /// DNS query failed due to network or resolver issues. A missing domain
    /// or an empty record set is not an error; it resolves to no exchangers.
    #[error("MX lookup failed: {0}")]
    LookupFailed(#[from] hickory_resolver::ResolveError),
}

/// Configuration for the DNS resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// DNS query timeout in seconds.
    ///
    /// Default: 5
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    5
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// One mail exchanger advertised for a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailExchanger {
    /// The exchanger hostname.
    pub host: String,
    /// MX preference number (lower value = tried first).
    pub priority: u16,
    /// Port number (default: 25).
    pub port: u16,
}

impl MailExchanger {
    /// Creates a new mail exchanger entry.
    #[must_use]
    pub const fn new(host: String, priority: u16, port: u16) -> Self {
        Self {
            host,
            priority,
            port,
        }
    }

    /// Returns the full address as `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The resolution collaborator the verification controller depends on.
///
/// Implementations must surface "no such domain" and "no MX records" as an
/// empty list, not as an error; only infrastructure failures are errors.
#[async_trait]
pub trait MxResolver: Send + Sync + std::fmt::Debug {
    /// Resolves the mail exchangers for `domain`, ascending by preference.
    async fn resolve_mx(&self, domain: &str) -> Result<Vec<MailExchanger>, DnsError>;
}

/// MX resolver backed by the system DNS configuration.
#[derive(Debug)]
pub struct DnsResolver {
    resolver: TokioResolver,
}

impl DnsResolver {
    /// Creates a resolver from the system DNS configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the system DNS configuration cannot be loaded.
    pub fn new(config: &DnsConfig) -> Result<Self, DnsError> {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_secs(config.timeout_secs);

        let resolver = TokioResolver::builder(TokioConnectionProvider::default())?
            .with_options(opts)
            .build();

        Ok(Self { resolver })
    }
}

#[async_trait]
impl MxResolver for DnsResolver {
    async fn resolve_mx(&self, domain: &str) -> Result<Vec<MailExchanger>, DnsError> {
        tracing::debug!(domain, "Resolving MX records");

        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => {
                let mut exchangers: Vec<MailExchanger> = lookup
                    .iter()
                    .map(|mx| MailExchanger::new(mx.exchange().to_utf8(), mx.preference(), 25))
                    .collect();

                // Lower preference number = higher priority, per RFC 5321.
                exchangers.sort_by_key(|mx| mx.priority);

                tracing::debug!(domain, count = exchangers.len(), "Resolved MX records");
                Ok(exchangers)
            }
            Err(err) if err.is_no_records_found() || err.is_nx_domain() => {
                tracing::debug!(domain, "No MX records");
                Ok(Vec::new())
            }
            Err(err) => {
                tracing::warn!(domain, error = %err, "MX lookup failed");
                Err(DnsError::LookupFailed(err))
            }
        }
    }
}
