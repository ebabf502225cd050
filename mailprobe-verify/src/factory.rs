//! Lifecycle of pooled probe connections.
//!
//! The factory owns the handshake and teardown state machine for one
//! exchanger:
//!
//! - `create`: admission slot → TCP connect + greeting → `HELO`
//! - `destroy`: `QUIT` (221 expected, 421 tolerated) → close → slot release
//! - `recycle`: `RSET` for clean reuse, or discard-and-recreate after a
//!   failed dialogue
//! - `probe`: `MAIL FROM` / `RCPT TO`, the one operation borrowers run
//!
//! The admission slot travels with the connection, so every exit path —
//! including handshake failures and discarded connections — releases it.

use mailprobe_smtp::{ProbeTimeouts, Response, SmtpConnection, SmtpError, Verdict, classify};

use crate::admission::{Admission, AdmissionSlot};
use crate::error::{Result, VerifyError};

/// A connection that has completed the `HELO` handshake, together with the
/// admission slot it occupies.
#[derive(Debug)]
pub(crate) struct PooledConnection {
    connection: SmtpConnection,
    _slot: AdmissionSlot,
}

/// Builds, recycles and tears down connections to one exchanger on behalf
/// of its pool.
#[derive(Debug)]
pub(crate) struct ConnectionFactory {
    exchanger: String,
    sender_domain: String,
    timeouts: ProbeTimeouts,
    admission: Admission,
}

impl ConnectionFactory {
    pub(crate) fn new(
        exchanger: String,
        sender_domain: String,
        timeouts: ProbeTimeouts,
        admission: Admission,
    ) -> Self {
        Self {
            exchanger,
            sender_domain,
            timeouts,
            admission,
        }
    }

    /// Opens a ready-to-probe connection.
    ///
    /// Suspends while the process is at its admission capacity. On any
    /// failure after the slot is acquired, both the slot and the transport
    /// are released before the error propagates.
    pub(crate) async fn create(&self) -> Result<PooledConnection> {
        let slot = self.admission.admit().await;

        tracing::debug!(exchanger = %self.exchanger, "Creating connection");
        let connection = self.handshake().await?;
        tracing::debug!(exchanger = %self.exchanger, "Connection established");

        Ok(PooledConnection {
            connection,
            _slot: slot,
        })
    }

    async fn handshake(&self) -> Result<SmtpConnection> {
        let mut connection =
            SmtpConnection::connect(&self.exchanger, self.timeouts.clone()).await?;

        let helo = format!("HELO {}", self.sender_domain);
        let response = match connection.execute(&helo).await {
            Ok(response) => response,
            Err(err) => {
                connection.close().await;
                return Err(err.into());
            }
        };

        if response.code != 250 {
            connection.close().await;
            return Err(VerifyError::SenderDomainRejected {
                domain: self.sender_domain.clone(),
                code: response.code,
                message: response.text,
            });
        }

        Ok(connection)
    }

    /// Tears a connection down with `QUIT`.
    ///
    /// 221 is the expected goodbye; 421 is tolerated (some providers close
    /// proactively). Anything else is logged but never blocks teardown: the
    /// transport is closed and the admission slot released on every path.
    pub(crate) async fn destroy(&self, mut pooled: PooledConnection) {
        tracing::debug!(exchanger = %self.exchanger, "Terminating connection");

        match pooled.connection.execute("QUIT").await {
            Ok(Response { code: 221, .. }) => {}
            Ok(Response { code: 421, .. }) => {
                tracing::debug!(
                    exchanger = %self.exchanger,
                    "Server sent 421 in response to QUIT, ignoring"
                );
            }
            Ok(response) => {
                tracing::warn!(
                    exchanger = %self.exchanger,
                    code = response.code,
                    text = %response.text,
                    "Unexpected response to QUIT"
                );
            }
            Err(err) => {
                tracing::debug!(exchanger = %self.exchanger, error = %err, "QUIT failed");
            }
        }

        pooled.connection.close().await;
    }

    /// Prepares a used connection for its next borrower.
    ///
    /// After a failed dialogue the connection is discarded (secondary
    /// errors swallowed) and a fresh one is created in its place. After a
    /// clean dialogue the server's state is reset with `RSET`; a rejected
    /// reset also discards the connection and frees its slot.
    ///
    /// # Errors
    ///
    /// Returns an error when the replacement connection cannot be created,
    /// or [`VerifyError::ResetRejected`] when the server refuses `RSET`.
    pub(crate) async fn recycle(
        &self,
        mut pooled: PooledConnection,
        failed: bool,
    ) -> Result<PooledConnection> {
        if failed {
            self.destroy(pooled).await;
            return self.create().await;
        }

        tracing::debug!(exchanger = %self.exchanger, "Preparing connection for reuse");
        let response = match pooled.connection.execute("RSET").await {
            Ok(response) => response,
            Err(err) => {
                self.destroy(pooled).await;
                return Err(err.into());
            }
        };

        if response.code == 250 {
            Ok(pooled)
        } else {
            let err = VerifyError::ResetRejected {
                code: response.code,
                message: response.text,
            };
            self.destroy(pooled).await;
            Err(err)
        }
    }

    /// Runs the probe dialogue for one recipient on a borrowed connection.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::SenderAddressRejected`] if `MAIL FROM` is not
    /// accepted, and surfaces an unclassifiable `RCPT TO` response as
    /// [`SmtpError::UnexpectedResponse`] so the connection is discarded
    /// rather than reused.
    pub(crate) async fn probe(
        &self,
        pooled: &mut PooledConnection,
        email: &str,
        sender_address: &str,
    ) -> Result<Verdict> {
        let mail_from = format!("MAIL FROM: <{sender_address}>");
        let response = pooled.connection.execute(&mail_from).await?;
        if response.code != 250 {
            return Err(VerifyError::SenderAddressRejected {
                address: sender_address.to_string(),
                code: response.code,
                message: response.text,
            });
        }

        let rcpt_to = format!("RCPT TO: <{email}>");
        let response = pooled.connection.execute(&rcpt_to).await?;

        match classify(&response, email) {
            Verdict::ProtocolError { code, message } => {
                Err(SmtpError::UnexpectedResponse { code, message }.into())
            }
            verdict => Ok(verdict),
        }
    }
}
