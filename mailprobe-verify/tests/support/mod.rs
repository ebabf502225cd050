//! Shared fixtures for the verification integration tests.

pub mod mock_server;

use std::collections::HashMap;
use std::net::SocketAddr;

use async_trait::async_trait;

use mailprobe_verify::{DnsError, MailExchanger, MxResolver};

/// In-memory MX zones; unknown domains resolve to no exchangers, matching
/// the resolver contract for missing domains.
#[derive(Debug, Default)]
pub struct StaticResolver {
    zones: HashMap<String, Vec<MailExchanger>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a zone with its exchangers (any order; the controller sorts).
    #[must_use]
    pub fn zone(mut self, domain: &str, exchangers: Vec<MailExchanger>) -> Self {
        self.zones.insert(domain.to_string(), exchangers);
        self
    }
}

#[async_trait]
impl MxResolver for StaticResolver {
    async fn resolve_mx(&self, domain: &str) -> Result<Vec<MailExchanger>, DnsError> {
        Ok(self.zones.get(domain).cloned().unwrap_or_default())
    }
}

/// An exchanger entry pointing at a mock server's loopback address.
pub fn exchanger(addr: SocketAddr, priority: u16) -> MailExchanger {
    MailExchanger::new(addr.ip().to_string(), priority, addr.port())
}
