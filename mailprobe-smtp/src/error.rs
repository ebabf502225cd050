//! Error types for the SMTP dialogue layer.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while speaking SMTP to a mail exchanger.
#[derive(Error, Debug)]
pub enum SmtpError {
    /// IO error occurred during network operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A reply line did not start with a three-digit status code.
    #[error("Malformed SMTP reply: {0}")]
    MalformedReply(String),

    /// The server closed the connection before a complete response arrived.
    #[error("Server closed connection prematurely")]
    ConnectionClosed,

    /// No complete response arrived within the command timeout.
    #[error("Timed out after {after:?} while waiting for response from server")]
    Timeout {
        /// How long the dialogue waited before giving up.
        after: Duration,
    },

    /// The greeting sent on connect was not a 220 response.
    #[error("Unexpected greeting from server: {code} - {message}")]
    UnexpectedGreeting { code: u16, message: String },

    /// The server returned a status code the dialogue cannot classify.
    #[error("Unexpected status code from server: {code} - {message}")]
    UnexpectedResponse { code: u16, message: String },

    /// Reply text was not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Specialized `Result` type for SMTP dialogue operations.
pub type Result<T> = std::result::Result<T, SmtpError>;
