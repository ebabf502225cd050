//! SMTP reply parsing and representation.
//!
//! An SMTP server answers every command with one or more reply lines. Each
//! line carries a three-digit status code; a `-` in the fourth column marks a
//! continuation, a space (or end of line) marks the terminal line. Callers
//! only ever see the assembled [`Response`] — a partially received reply is
//! never surfaced.

use crate::error::{Result, SmtpError};

/// One physical line of an SMTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The SMTP status code (e.g. 220, 250, 550).
    pub code: u16,
    /// Whether more lines belonging to the same response follow.
    pub continues: bool,
    /// The text following the status code.
    pub text: String,
}

impl Reply {
    /// Parses a single reply line (without its CRLF terminator).
    ///
    /// The first three characters must be ASCII digits. A `-` in the fourth
    /// column marks a continuation line; any other character (or none at
    /// all) marks the line as terminal.
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::MalformedReply`] if the line is shorter than
    /// three characters or does not start with a three-digit code.
    pub fn parse(line: &str) -> Result<Self> {
        if line.len() < 3 || !line.is_char_boundary(3) {
            return Err(SmtpError::MalformedReply(format!(
                "reply line too short: {line:?}"
            )));
        }

        let code = line[..3]
            .parse::<u16>()
            .map_err(|_| SmtpError::MalformedReply(format!("invalid status code in {line:?}")))?;

        let continues = line.as_bytes().get(3) == Some(&b'-');
        let text = line.get(4..).unwrap_or_default().to_string();

        Ok(Self {
            code,
            continues,
            text,
        })
    }
}

/// A complete SMTP response, assembled from one or more reply lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The status code of the first reply line.
    pub code: u16,
    /// The newline-joined text of every reply line.
    pub text: String,
}

impl Response {
    /// Creates a new `Response`.
    #[must_use]
    pub const fn new(code: u16, text: String) -> Self {
        Self { code, text }
    }

    /// Returns `true` if this response indicates success (2xx code).
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// Returns `true` if this response indicates a temporary failure (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.code >= 400 && self.code < 500
    }

    /// Returns `true` if this response indicates a permanent failure (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        self.code >= 500 && self.code < 600
    }

    /// Parses a complete, possibly multi-line response from a buffer of
    /// received bytes.
    ///
    /// Returns `Ok(None)` while the buffer does not yet hold a terminal
    /// reply line; otherwise returns the assembled response together with
    /// the number of bytes consumed. The status code is taken from the
    /// first line; codes on continuation lines are not re-checked.
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::MalformedReply`] for lines without a leading
    /// three-digit code, or [`SmtpError::Utf8`] if the buffer is not valid
    /// UTF-8.
    pub fn parse(buffer: &[u8]) -> Result<Option<(Self, usize)>> {
        let text = std::str::from_utf8(buffer)?;

        let mut code = None;
        let mut lines = Vec::new();
        let mut consumed = 0;

        for line in text.split_inclusive('\n') {
            if !line.ends_with('\n') {
                // Incomplete trailing line, wait for more data.
                break;
            }
            consumed += line.len();

            let reply = Reply::parse(line.trim_end_matches(['\r', '\n']))?;
            code.get_or_insert(reply.code);
            lines.push(reply.text);

            if !reply.continues {
                return Ok(code.map(|code| (Self::new(code, lines.join("\n")), consumed)));
            }
        }

        Ok(None)
    }
}
