//! The top-level verification controller.
//!
//! Ties the layers together: resolve the domain's exchangers, walk them in
//! preference order, probe each through a shared pooled client, and apply
//! the greylisting retry policy. A definitive verdict (accepted or
//! rejected) is authoritative and short-circuits fallback; anything else is
//! recorded and the next exchanger is tried.

use std::sync::Arc;

use mailprobe_smtp::{SmtpError, Verdict};

use crate::client::Client;
use crate::config::{Config, VerifierConfig};
use crate::dns::{DnsError, DnsResolver, MxResolver};
use crate::error::{Result, VerifyError};
use crate::manager::SessionManager;

/// Per-call options for [`Verifier::verify`].
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Domain to identify as in the `HELO` command.
    /// Defaults to the local hostname.
    pub sender_domain: Option<String>,

    /// Address to identify as in the `MAIL FROM` command.
    /// Defaults to `test@<sender_domain>`.
    pub sender_address: Option<String>,
}

/// Determines whether a mailbox would be accepted by its destination mail
/// server, without sending mail.
///
/// A `Verifier` is intended to be shared: concurrent [`verify`] calls
/// cooperate through its session manager (warm connection reuse) and its
/// global admission limiter (socket backpressure).
///
/// There is no overall deadline on a call — each SMTP command is bounded
/// individually, and greylisting can park a probe for minutes. Callers that
/// need one should race [`verify`] against a timer and abandon it on
/// expiry; the underlying connection is reclaimed by its own timeout.
///
/// [`verify`]: Verifier::verify
#[derive(Debug)]
pub struct Verifier {
    resolver: Arc<dyn MxResolver>,
    sessions: SessionManager,
    config: VerifierConfig,
}

impl Verifier {
    /// Creates a verifier resolving MX records through the system DNS
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the system DNS configuration cannot be loaded.
    pub fn new(config: Config) -> std::result::Result<Self, DnsError> {
        let resolver = Arc::new(DnsResolver::new(&config.dns)?);
        Ok(Self::with_resolver(config, resolver))
    }

    /// Creates a verifier with a custom MX resolution collaborator.
    #[must_use]
    pub fn with_resolver(config: Config, resolver: Arc<dyn MxResolver>) -> Self {
        let admission = crate::admission::Admission::new(&config.admission);

        Self {
            resolver,
            sessions: SessionManager::new(config.timeouts, config.pool, admission),
            config: config.verifier,
        }
    }

    /// Checks whether mail to `email` would be accepted.
    ///
    /// Resolves the domain's exchangers and probes them in preference
    /// order. Returns `Ok(false)` immediately when the domain has no mail
    /// exchanger. A greylisting exchanger is retried once after its
    /// estimated delay.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidAddress`] for an address without the
    /// `local@domain` shape, a DNS error when resolution itself fails, and
    /// [`VerifyError::AllExchangersFailed`] when every candidate exchanger
    /// errored out without a definitive verdict.
    pub async fn verify(&self, email: &str, options: &VerifyOptions) -> Result<bool> {
        let domain = match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => domain,
            _ => return Err(VerifyError::InvalidAddress(email.to_string())),
        };

        let mut exchangers = self.resolver.resolve_mx(domain).await?;
        if exchangers.is_empty() {
            // No mail exchanger means the domain cannot accept mail at all.
            tracing::debug!(domain, "No mail exchangers, address cannot receive mail");
            return Ok(false);
        }
        exchangers.sort_by_key(|mx| mx.priority);

        let sender_domain = options
            .sender_domain
            .clone()
            .unwrap_or_else(local_hostname);
        let sender_address = options
            .sender_address
            .clone()
            .unwrap_or_else(|| format!("test@{sender_domain}"));

        let mut last_error = None;
        for exchanger in &exchangers {
            let address = exchanger.address();
            tracing::debug!(exchanger = %address, priority = exchanger.priority, "Probing exchanger");

            let outcome = self
                .sessions
                .with_client(&address, &sender_domain, |client| {
                    self.test_server(client, email, &sender_address)
                })
                .await;

            match outcome {
                Ok(accepted) => return Ok(accepted),
                Err(err) => {
                    tracing::warn!(
                        exchanger = %address,
                        error = %err,
                        "Exchanger failed, trying next"
                    );
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(source) => Err(VerifyError::AllExchangersFailed {
                domain: domain.to_string(),
                source: Box::new(source),
            }),
            // Unreachable with a non-empty exchanger list, but harmless.
            None => Ok(false),
        }
    }

    /// Probes a single exchanger, retrying greylisting at most once.
    async fn test_server(
        &self,
        client: Arc<Client>,
        email: &str,
        sender_address: &str,
    ) -> Result<bool> {
        let mut retry_allowed = self.config.greylist_retry;

        loop {
            match client.test(email, sender_address).await? {
                Verdict::Accepted => {
                    tracing::debug!(email, "Server accepts email");
                    return Ok(true);
                }
                Verdict::Rejected => {
                    tracing::debug!(email, "Mailbox is unavailable");
                    return Ok(false);
                }
                Verdict::Greylisted { retry_after } => {
                    if !retry_allowed {
                        return Err(VerifyError::GreylistedPermanently);
                    }
                    retry_allowed = false;

                    let wait = self
                        .config
                        .greylist_wait_cap
                        .map_or(retry_after, |cap| retry_after.min(cap));
                    tracing::info!(
                        email,
                        wait_secs = wait.as_secs_f64(),
                        "Server is greylisting, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                }
                // The client surfaces unclassifiable responses as errors,
                // but the match stays total.
                Verdict::ProtocolError { code, message } => {
                    return Err(SmtpError::UnexpectedResponse { code, message }.into());
                }
            }
        }
    }
}

/// The local hostname, used as the default `HELO` identity.
fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}
