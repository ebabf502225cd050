//! The shared per-exchanger client.
//!
//! One `Client` exists per `(exchanger, sender domain)` pair at a time,
//! handed out by the session manager; every concurrent verification against
//! that exchanger probes through the same small connection pool instead of
//! paying its own handshake.

use mailprobe_smtp::{ProbeTimeouts, Verdict};

use crate::admission::Admission;
use crate::config::PoolConfig;
use crate::error::Result;
use crate::factory::ConnectionFactory;
use crate::pool::ConnectionPool;

/// Probes recipients against one exchanger through a pooled connection.
#[derive(Debug)]
pub struct Client {
    exchanger: String,
    pool: ConnectionPool,
}

impl Client {
    pub(crate) fn new(
        exchanger: String,
        sender_domain: String,
        timeouts: ProbeTimeouts,
        pool_config: &PoolConfig,
        admission: Admission,
    ) -> Self {
        let factory =
            ConnectionFactory::new(exchanger.clone(), sender_domain, timeouts, admission);

        Self {
            pool: ConnectionPool::new(factory, pool_config),
            exchanger,
        }
    }

    /// The `host:port` address this client probes.
    #[must_use]
    pub fn exchanger(&self) -> &str {
        &self.exchanger
    }

    /// Asks the exchanger whether it would accept mail for `email`.
    ///
    /// Borrows a pooled connection for the duration of one `MAIL FROM` /
    /// `RCPT TO` dialogue. A clean verdict recycles the connection for the
    /// next borrower; a failed dialogue discards it.
    ///
    /// # Errors
    ///
    /// Propagates handshake, dialogue and classification failures; the
    /// returned verdict is never [`Verdict::ProtocolError`] (that case is
    /// an error so the connection is not reused).
    pub async fn test(&self, email: &str, sender_address: &str) -> Result<Verdict> {
        let mut borrowed = self.pool.acquire().await?;
        let result = self.pool.probe(&mut borrowed, email, sender_address).await;
        self.pool.release(borrowed, result.is_err()).await;
        result
    }
}
