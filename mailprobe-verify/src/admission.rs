//! Global connection admission.
//!
//! One [`Admission`] instance bounds the number of simultaneously open
//! transport connections across every pool in the process. Each live
//! connection holds one slot from connect until destruction; once the
//! capacity is exhausted, further connection attempts suspend until a slot
//! is released anywhere in the process. This is the only hard backpressure
//! mechanism in the system.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::AdmissionConfig;

/// Shared admission limiter, cheap to clone.
#[derive(Debug, Clone)]
pub struct Admission {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One admitted connection slot; releasing is dropping.
#[derive(Debug)]
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

impl Admission {
    /// Creates a limiter with the configured capacity.
    #[must_use]
    pub fn new(config: &AdmissionConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_sockets)),
            capacity: config.max_sockets,
        }
    }

    /// Acquires one connection slot, suspending while the process is at
    /// capacity.
    pub async fn admit(&self) -> AdmissionSlot {
        #[allow(
            clippy::expect_used,
            reason = "the admission semaphore lives as long as the limiter and is never closed"
        )]
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("admission semaphore closed");

        AdmissionSlot { _permit: permit }
    }

    /// The configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many slots are currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
