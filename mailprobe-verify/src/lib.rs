//! MX resolution, connection pooling and verification policy for the
//! mailprobe deliverability prober.
//!
//! Layering, leaf to root:
//!
//! - [`dns`]: the MX resolution collaborator ([`MxResolver`] trait plus the
//!   hickory-backed [`DnsResolver`])
//! - [`Admission`]: the process-wide cap on open transport connections
//! - connection factory + [`Client`] pool: per-exchanger connection
//!   lifecycle (`HELO` on create, `RSET` on reuse, `QUIT` on discard)
//! - [`SessionManager`]: reference-counted sharing of clients across
//!   concurrent verifications
//! - [`Verifier`]: MX fallback and greylisting retry, producing the final
//!   boolean verdict

mod admission;
mod client;
mod config;
pub mod dns;
mod error;
mod factory;
mod manager;
mod pool;
mod verifier;

pub use admission::{Admission, AdmissionSlot};
pub use client::Client;
pub use config::{AdmissionConfig, Config, PoolConfig, VerifierConfig};
pub use dns::{DnsConfig, DnsError, DnsResolver, MailExchanger, MxResolver};
pub use error::{Result, VerifyError};
pub use manager::{ClientKey, SessionManager};
pub use verifier::{Verifier, VerifyOptions};
