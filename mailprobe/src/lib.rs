//! Check whether a mailbox would accept mail, without sending any.
//!
//! mailprobe resolves the mail exchangers of an address's domain, opens a
//! plain-text SMTP dialogue to the most preferred one that answers, and
//! runs it up to `RCPT TO` — far enough to see the server's verdict on the
//! recipient — then aborts with `RSET`/`QUIT` before anything is delivered.
//!
//! # Examples
//!
//! ```no_run
//! use mailprobe::VerifyOptions;
//!
//! # async fn example() -> Result<(), mailprobe::VerifyError> {
//! if mailprobe::verify("postmaster@example.com", &VerifyOptions::default()).await? {
//!     println!("the server accepts mail for this address");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The free function shares one process-wide [`Verifier`] — concurrent
//! calls reuse warm connections to common exchangers and share the global
//! socket admission cap. Construct a [`Verifier`] directly to control
//! configuration or supply a custom [`MxResolver`].

use std::sync::OnceLock;

pub mod logging;

pub use mailprobe_smtp::{ProbeTimeouts, Reply, Response, SmtpError, Verdict};
pub use mailprobe_verify::{
    AdmissionConfig, Client, Config, DnsConfig, DnsError, DnsResolver, MailExchanger, MxResolver,
    PoolConfig, SessionManager, Verifier, VerifierConfig, VerifyError, VerifyOptions,
};

static GLOBAL: OnceLock<Verifier> = OnceLock::new();

fn global_verifier() -> Result<&'static Verifier, VerifyError> {
    if let Some(verifier) = GLOBAL.get() {
        return Ok(verifier);
    }

    // Two callers may race here; the loser's verifier is dropped.
    let verifier = Verifier::new(Config::default())?;
    Ok(GLOBAL.get_or_init(|| verifier))
}

/// Checks `email` against the process-wide default verifier.
///
/// # Errors
///
/// Fails when the system DNS configuration cannot be loaded, the address is
/// malformed, MX resolution fails, or every candidate exchanger errors out;
/// see [`VerifyError`].
pub async fn verify(email: &str, options: &VerifyOptions) -> Result<bool, VerifyError> {
    global_verifier()?.verify(email, options).await
}
