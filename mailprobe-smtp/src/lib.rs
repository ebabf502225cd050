//! SMTP dialogue layer for the mailprobe deliverability prober.
//!
//! This crate owns everything that happens on the wire for a single
//! connection:
//!
//! - Parsing single- and multi-line SMTP replies into complete responses
//! - The connection itself: greeting handshake, send-command/await-response
//!   with a per-command timeout, explicit close
//! - Classifying `RCPT TO` responses into verdicts, including the
//!   provider-specific quirk table
//!
//! Connection pooling, MX resolution and retry policy live one layer up in
//! `mailprobe-verify`.

mod connection;
mod error;
mod response;
mod timeouts;
pub mod verdict;

pub use connection::SmtpConnection;
pub use error::{Result, SmtpError};
pub use response::{Reply, Response};
pub use timeouts::ProbeTimeouts;
pub use verdict::{Verdict, classify};
