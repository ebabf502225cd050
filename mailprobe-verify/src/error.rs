//! Typed error handling for verification operations.
//!
//! Errors split by layer: protocol failures bubble up from
//! `mailprobe-smtp`, resolution failures from the DNS collaborator, and the
//! dialogue/policy failures (handshake rejections, greylisting exhaustion,
//! exchanger exhaustion) are defined here.

use thiserror::Error;

use mailprobe_smtp::SmtpError;

use crate::dns::DnsError;

/// Top-level verification error type.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// A protocol-level failure on one connection.
    #[error("SMTP failure: {0}")]
    Smtp(#[from] SmtpError),

    /// MX resolution failed.
    #[error("DNS failure: {0}")]
    Dns(#[from] DnsError),

    /// The address to probe is not of the form `local@domain`.
    #[error("Invalid email address: {0:?}")]
    InvalidAddress(String),

    /// The server rejected our `HELO` identity.
    #[error("Server did not accept sender domain {domain}: {code} {message}")]
    SenderDomainRejected {
        domain: String,
        code: u16,
        message: String,
    },

    /// The server rejected our `MAIL FROM` envelope sender.
    #[error("Server did not accept sender address {address}: {code} {message}")]
    SenderAddressRejected {
        address: String,
        code: u16,
        message: String,
    },

    /// The server rejected the `RSET` that prepares a connection for reuse.
    #[error("Server did not accept RSET: {code} {message}")]
    ResetRejected { code: u16, message: String },

    /// The server greylisted the probe again after the retry delay.
    #[error("Server applied greylisting")]
    GreylistedPermanently,

    /// Every candidate exchanger failed; wraps the last failure seen.
    #[error("All mail exchangers for {domain} failed")]
    AllExchangersFailed {
        domain: String,
        #[source]
        source: Box<VerifyError>,
    },
}

impl VerifyError {
    /// Returns `true` if this error came from the wire rather than from
    /// policy (useful when deciding what to log at which level).
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Smtp(_))
    }
}

/// Specialized `Result` type for verification operations.
pub type Result<T> = std::result::Result<T, VerifyError>;
