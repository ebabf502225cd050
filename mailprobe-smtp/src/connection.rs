//! A single SMTP connection to one mail exchanger.
//!
//! The connection is strictly request/response: one command is written, one
//! complete (possibly multi-line) response is awaited, bounded by the
//! command timeout. There is no pipelining; `&mut self` on [`SmtpConnection::execute`]
//! enforces that at most one command is ever outstanding.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{Result, SmtpError};
use crate::response::Response;
use crate::timeouts::ProbeTimeouts;

/// Initial size of the read buffer for SMTP responses.
const BUFFER_SIZE: usize = 4096;

/// Maximum size of the read buffer to prevent unbounded growth (1MB).
const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// An open SMTP session with one mail exchanger.
pub struct SmtpConnection {
    stream: Option<TcpStream>,
    buffer: Vec<u8>,
    buffer_pos: usize,
    exchanger: String,
    timeouts: ProbeTimeouts,
}

impl SmtpConnection {
    /// Connects to a mail exchanger (`host:port`) and consumes its greeting.
    ///
    /// The TCP connect is bounded by the connect timeout and the greeting by
    /// the command timeout. On any failure the transport is closed before
    /// the error propagates.
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::UnexpectedGreeting`] unless the server greets
    /// with a 220 response, or the underlying connect/read failure.
    pub async fn connect(exchanger: &str, timeouts: ProbeTimeouts) -> Result<Self> {
        tracing::debug!(exchanger, "Connecting");

        let stream = timeout(timeouts.connect(), TcpStream::connect(exchanger))
            .await
            .map_err(|_| SmtpError::Timeout {
                after: timeouts.connect(),
            })??;

        let mut connection = Self {
            stream: Some(stream),
            buffer: vec![0u8; BUFFER_SIZE],
            buffer_pos: 0,
            exchanger: exchanger.to_string(),
            timeouts,
        };

        match connection.read_greeting().await {
            Ok(()) => Ok(connection),
            Err(err) => {
                connection.close().await;
                Err(err)
            }
        }
    }

    /// The `host:port` address this connection speaks to.
    #[must_use]
    pub fn exchanger(&self) -> &str {
        &self.exchanger
    }

    async fn read_greeting(&mut self) -> Result<()> {
        tracing::debug!(exchanger = %self.exchanger, "Waiting for greeting");
        let greeting = self.read_response_timed().await?;

        if greeting.code == 220 {
            Ok(())
        } else {
            tracing::debug!(
                exchanger = %self.exchanger,
                code = greeting.code,
                text = %greeting.text,
                "Unexpected greeting"
            );
            Err(SmtpError::UnexpectedGreeting {
                code: greeting.code,
                message: greeting.text,
            })
        }
    }

    /// Sends one command and awaits one complete response.
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::Timeout`] if no complete response arrives within
    /// the command timeout, or the underlying write/read/parse failure. A
    /// connection that has errored here must not be reused; its read buffer
    /// may hold a partial reply.
    pub async fn execute(&mut self, command: &str) -> Result<Response> {
        tracing::debug!(exchanger = %self.exchanger, command, "Sending command");

        let stream = self.stream.as_mut().ok_or(SmtpError::ConnectionClosed)?;
        stream.write_all(command.as_bytes()).await?;
        stream.write_all(b"\r\n").await?;
        stream.flush().await?;

        let response = self.read_response_timed().await?;
        tracing::debug!(
            exchanger = %self.exchanger,
            code = response.code,
            text = %response.text,
            "Got response"
        );
        Ok(response)
    }

    /// Closes the transport without waiting for any further data.
    ///
    /// Idempotent; a second call is a no-op.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            tracing::debug!(exchanger = %self.exchanger, "Closing connection");
            let _ = stream.shutdown().await;
        }
    }

    async fn read_response_timed(&mut self) -> Result<Response> {
        let after = self.timeouts.command();
        timeout(after, self.read_response())
            .await
            .map_err(|_| SmtpError::Timeout { after })?
    }

    /// Reads until the buffer holds one complete response.
    async fn read_response(&mut self) -> Result<Response> {
        loop {
            if let Some((response, consumed)) = Response::parse(&self.buffer[..self.buffer_pos])? {
                self.buffer.copy_within(consumed..self.buffer_pos, 0);
                self.buffer_pos -= consumed;
                return Ok(response);
            }

            if self.buffer_pos >= self.buffer.len() {
                let new_size = self.buffer.len() * 2;
                if new_size > MAX_BUFFER_SIZE {
                    return Err(SmtpError::MalformedReply(format!(
                        "response exceeds {MAX_BUFFER_SIZE} bytes"
                    )));
                }
                self.buffer.resize(new_size, 0);
            }

            let stream = self.stream.as_mut().ok_or(SmtpError::ConnectionClosed)?;
            let read = stream.read(&mut self.buffer[self.buffer_pos..]).await?;
            if read == 0 {
                return Err(SmtpError::ConnectionClosed);
            }
            self.buffer_pos += read;
        }
    }
}

impl std::fmt::Debug for SmtpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConnection")
            .field("exchanger", &self.exchanger)
            .field("open", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}
