//! Classification of `RCPT TO` responses into verdicts.
//!
//! Mail providers disagree wildly on how to say "this mailbox does not
//! exist" and "come back later": ProtonMail rejects with 554, Postfix
//! installations answer 450 or 501, Yandex uses 504, Mimecast and postgrey
//! greylist with 451/450 and distinctive help URLs. Every known quirk lives
//! in the [`QUIRKS`] table below so the dialogue driver stays generic —
//! extending support for another provider means adding a row, not touching
//! any state machine.

use std::time::Duration;

use crate::response::Response;

/// The outcome of asking a mail exchanger about one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The server accepted the recipient.
    Accepted,
    /// The server definitively rejected the recipient.
    Rejected,
    /// The server is greylisting; retry after the estimated delay.
    Greylisted {
        /// The provider's documented (or estimated) greylisting window.
        retry_after: Duration,
    },
    /// The response matched no known pattern.
    ProtocolError {
        /// The status code the server answered with.
        code: u16,
        /// The full response text.
        message: String,
    },
}

/// How a quirk row matches the response text.
#[derive(Debug, Clone, Copy)]
enum TextMatch {
    /// The status code alone is decisive.
    Any,
    /// The response text must contain this fragment.
    Contains(&'static str),
    /// The response text must contain `<recipient>: ` (Runbox prefixes its
    /// diagnostics with the rejected address).
    RecipientTagged,
}

impl TextMatch {
    fn matches(self, response: &Response, recipient: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Contains(fragment) => response.text.contains(fragment),
            Self::RecipientTagged => response.text.contains(&format!("<{recipient}>: ")),
        }
    }
}

/// What a matched quirk row means.
#[derive(Debug, Clone, Copy)]
enum Outcome {
    /// The mailbox is unavailable or the name is not allowed.
    Reject,
    /// The server is greylisting with this estimated delay.
    Greylist { retry_after_secs: u64 },
}

/// One provider-specific response pattern.
#[derive(Debug, Clone, Copy)]
struct Quirk {
    code: u16,
    text: TextMatch,
    outcome: Outcome,
}

/// Every known provider quirk, in match order. The 450 rows rely on their
/// text fragments to keep Postfix's "unknown user" rejection distinct from
/// postgrey's greylisting.
static QUIRKS: &[Quirk] = &[
    // RFC 5321: mailbox unavailable / mailbox name not allowed.
    Quirk {
        code: 550,
        text: TextMatch::Any,
        outcome: Outcome::Reject,
    },
    Quirk {
        code: 553,
        text: TextMatch::Any,
        outcome: Outcome::Reject,
    },
    // ProtonMail.
    Quirk {
        code: 554,
        text: TextMatch::Contains("this address does not exist"),
        outcome: Outcome::Reject,
    },
    // ProtonMail and ESMTP Postfix.
    Quirk {
        code: 501,
        text: TextMatch::Contains("Bad recipient address syntax"),
        outcome: Outcome::Reject,
    },
    // Yandex.
    Quirk {
        code: 504,
        text: TextMatch::Contains("Recipient address rejected"),
        outcome: Outcome::Reject,
    },
    // Runbox.
    Quirk {
        code: 501,
        text: TextMatch::RecipientTagged,
        outcome: Outcome::Reject,
    },
    // ESMTP Postfix.
    Quirk {
        code: 450,
        text: TextMatch::Contains("unknown user"),
        outcome: Outcome::Reject,
    },
    // ESMTP Postfix.
    Quirk {
        code: 554,
        text: TextMatch::Contains("Invalid-Recipient"),
        outcome: Outcome::Reject,
    },
    // Mimecast, estimated wait 60s.
    Quirk {
        code: 451,
        text: TextMatch::Contains("https://community.mimecast.com/docs/DOC-1369#451"),
        outcome: Outcome::Greylist {
            retry_after_secs: 60,
        },
    },
    // postgrey, estimated wait 5m.
    Quirk {
        code: 450,
        text: TextMatch::Contains("Greylisted, see http://postgrey.schweikert.ch/help/"),
        outcome: Outcome::Greylist {
            retry_after_secs: 300,
        },
    },
    // Generic greylisting wording, estimated wait 10m.
    Quirk {
        code: 451,
        text: TextMatch::Contains("is not yet authorized to deliver mail from"),
        outcome: Outcome::Greylist {
            retry_after_secs: 600,
        },
    },
];

/// Classifies the response to a `RCPT TO` command.
///
/// `recipient` is the probed address; it feeds the Runbox pattern, which
/// tags its diagnostics with the rejected recipient.
#[must_use]
pub fn classify(response: &Response, recipient: &str) -> Verdict {
    if response.code == 250 {
        return Verdict::Accepted;
    }

    for quirk in QUIRKS {
        if quirk.code == response.code && quirk.text.matches(response, recipient) {
            return match quirk.outcome {
                Outcome::Reject => Verdict::Rejected,
                Outcome::Greylist { retry_after_secs } => Verdict::Greylisted {
                    retry_after: Duration::from_secs(retry_after_secs),
                },
            };
        }
    }

    Verdict::ProtocolError {
        code: response.code,
        message: response.text.clone(),
    }
}
