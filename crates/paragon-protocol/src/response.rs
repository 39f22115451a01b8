//! Interpretation of printer responses.
//!
//! The printer answers every command with a frame whose payload is matched
//! by substring, after a lossy UTF-8 decode:
//!
//! - `ERR` anywhere is a failure.
//! - `?` is a failure for reports. For other commands a `?` is tolerated
//!   when the response also echoes the command name (`trinit?` after
//!   `trinit` is an acknowledgement, a bare `?` is not).

use crate::commands::CommandName;

/// How strictly a `?` in the response is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseRule {
    /// `?` fails unless the response also contains the command name.
    EchoTolerant,
    /// Any `?` fails.
    Strict,
}

impl ResponseRule {
    pub fn for_command(name: CommandName) -> Self {
        if name.is_report() {
            ResponseRule::Strict
        } else {
            ResponseRule::EchoTolerant
        }
    }
}

/// Outcome of classifying a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Rejected, carrying the decoded response text.
    Rejected(String),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Classify the response payload received for `name`.
///
/// ```
/// use paragon_protocol::{CommandName, classify_response};
///
/// assert!(classify_response(CommandName::TransactionInit, b"trinit?").is_accepted());
/// assert!(!classify_response(CommandName::DailyReport, b"dailyrep?").is_accepted());
/// assert!(!classify_response(CommandName::TransactionLine, b"ERR 12").is_accepted());
/// ```
pub fn classify_response(name: CommandName, payload: &[u8]) -> Verdict {
    let text = String::from_utf8_lossy(payload);

    let rejected = text.contains("ERR")
        || (text.contains('?')
            && match ResponseRule::for_command(name) {
                ResponseRule::Strict => true,
                ResponseRule::EchoTolerant => !text.contains(name.as_str()),
            });

    if rejected {
        Verdict::Rejected(text.into_owned())
    } else {
        Verdict::Accepted
    }
}
