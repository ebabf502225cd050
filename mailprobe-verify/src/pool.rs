//! Bounded pool of probe connections to one exchanger.
//!
//! Borrowing is exclusive: each connection has at most one borrower at a
//! time. A pool-local FIFO semaphore is the waiter queue — borrowing beyond
//! the configured maximum suspends until another borrower releases, which
//! is the pool's only blocking point. Creation additionally suspends on the
//! global admission limiter, so live connections never exceed the lesser of
//! the pool maximum and the remaining admission capacity.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use mailprobe_smtp::Verdict;

use crate::config::PoolConfig;
use crate::error::Result;
use crate::factory::{ConnectionFactory, PooledConnection};

/// One borrowed connection plus the pool-capacity permit backing it.
#[derive(Debug)]
pub(crate) struct Borrowed {
    connection: PooledConnection,
    _permit: OwnedSemaphorePermit,
}

/// Bounded set of reusable connections to one exchanger.
#[derive(Debug)]
pub(crate) struct ConnectionPool {
    factory: ConnectionFactory,
    capacity: Arc<Semaphore>,
    idle: Mutex<Vec<PooledConnection>>,
}

impl ConnectionPool {
    pub(crate) fn new(factory: ConnectionFactory, config: &PoolConfig) -> Self {
        Self {
            factory,
            capacity: Arc::new(Semaphore::new(config.max_connections)),
            idle: Mutex::new(Vec::with_capacity(config.max_connections)),
        }
    }

    /// Borrows an idle connection, creating one when none is idle and the
    /// pool is below its maximum; suspends otherwise.
    pub(crate) async fn acquire(&self) -> Result<Borrowed> {
        #[allow(
            clippy::expect_used,
            reason = "the capacity semaphore lives as long as the pool and is never closed"
        )]
        let permit = Arc::clone(&self.capacity)
            .acquire_owned()
            .await
            .expect("pool capacity semaphore closed");

        let idle = self.idle.lock().pop();
        let connection = match idle {
            Some(connection) => connection,
            // Permit drops on failure, freeing the slot for the next borrower.
            None => self.factory.create().await?,
        };

        Ok(Borrowed {
            connection,
            _permit: permit,
        })
    }

    /// Runs the probe dialogue on a borrowed connection.
    pub(crate) async fn probe(
        &self,
        borrowed: &mut Borrowed,
        email: &str,
        sender_address: &str,
    ) -> Result<Verdict> {
        self.factory
            .probe(&mut borrowed.connection, email, sender_address)
            .await
    }

    /// Returns a borrowed connection, recycling it into the idle set.
    ///
    /// `failed` marks a dialogue that errored; the connection is then
    /// discarded and replaced rather than reset. When even the replacement
    /// cannot be created the slot is simply freed — the next borrower will
    /// create on demand.
    pub(crate) async fn release(&self, borrowed: Borrowed, failed: bool) {
        let Borrowed {
            connection,
            _permit,
        } = borrowed;

        match self.factory.recycle(connection, failed).await {
            Ok(connection) => self.idle.lock().push(connection),
            Err(err) => {
                tracing::warn!(error = %err, "Connection was not returned to the pool");
            }
        }
    }
}
