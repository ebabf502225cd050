//! Reference-counted sharing of clients across concurrent verifications.
//!
//! The registry maps `(exchanger, sender domain)` to a live [`Client`] plus
//! a reference count. The first acquirer constructs the client; later ones
//! share it; the last release removes the entry, abandoning the pool and
//! its idle connections (their sockets close and their admission slots
//! free on drop). In-flight holders are unaffected by removal — they keep
//! the `Arc` they captured, removal only changes future lookups.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use mailprobe_smtp::ProbeTimeouts;

use crate::admission::Admission;
use crate::client::Client;
use crate::config::PoolConfig;

/// Registry key; a structured tuple rather than a formatted string so the
/// two components can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    /// The exchanger address (`host:port`).
    pub exchanger: String,
    /// The `HELO` identity used on the pool's connections.
    pub sender_domain: String,
}

#[derive(Debug)]
struct ManagerEntry {
    client: Arc<Client>,
    refs: usize,
}

/// Shares one [`Client`] per `(exchanger, sender domain)` among all
/// concurrently in-flight verifications.
#[derive(Debug)]
pub struct SessionManager {
    entries: DashMap<ClientKey, ManagerEntry>,
    timeouts: ProbeTimeouts,
    pool: PoolConfig,
    admission: Admission,
}

impl SessionManager {
    /// Creates an empty registry; clients are constructed on first use.
    #[must_use]
    pub fn new(timeouts: ProbeTimeouts, pool: PoolConfig, admission: Admission) -> Self {
        Self {
            entries: DashMap::new(),
            timeouts,
            pool,
            admission,
        }
    }

    /// Runs `f` against the shared client for `(exchanger, sender_domain)`,
    /// releasing the reference afterwards whatever the outcome.
    pub async fn with_client<T, F, Fut>(&self, exchanger: &str, sender_domain: &str, f: F) -> T
    where
        F: FnOnce(Arc<Client>) -> Fut,
        Fut: Future<Output = T>,
    {
        let client = self.acquire(exchanger, sender_domain);
        let result = f(client).await;
        self.release(exchanger, sender_domain);
        result
    }

    /// How many clients are currently live (for diagnostics and tests).
    #[must_use]
    pub fn live_clients(&self) -> usize {
        self.entries.len()
    }

    fn acquire(&self, exchanger: &str, sender_domain: &str) -> Arc<Client> {
        let key = ClientKey {
            exchanger: exchanger.to_string(),
            sender_domain: sender_domain.to_string(),
        };

        // The entry API holds the shard lock, making insert + refcount
        // update atomic with respect to concurrent acquire/release.
        let mut entry = self.entries.entry(key).or_insert_with(|| {
            tracing::debug!(exchanger, sender_domain, "Creating shared client");
            ManagerEntry {
                client: Arc::new(Client::new(
                    exchanger.to_string(),
                    sender_domain.to_string(),
                    self.timeouts.clone(),
                    &self.pool,
                    self.admission.clone(),
                )),
                refs: 0,
            }
        });
        entry.refs += 1;

        Arc::clone(&entry.client)
    }

    fn release(&self, exchanger: &str, sender_domain: &str) {
        let key = ClientKey {
            exchanger: exchanger.to_string(),
            sender_domain: sender_domain.to_string(),
        };

        if let Entry::Occupied(mut occupied) = self.entries.entry(key) {
            occupied.get_mut().refs -= 1;
            if occupied.get().refs == 0 {
                tracing::debug!(exchanger, sender_domain, "Dropping shared client");
                occupied.remove();
            }
        }
    }
}
