use paragon_network::TransportError;
use paragon_protocol::CommandName;
use thiserror::Error;

use crate::session::TransactionState;

/// Errors raised by fiscal operations.
#[derive(Debug, Error)]
pub enum FiscalError {
    /// Sending a command or receiving its response failed.
    #[error("{command}: {source}")]
    Transport {
        command: CommandName,
        #[source]
        source: TransportError,
    },

    /// The command or receipt could not be built (encoding, field or
    /// receipt validation). Nothing was sent.
    #[error(transparent)]
    Protocol(#[from] paragon_core::Error),

    /// The printer answered with an error marker.
    #[error("{command} rejected by printer: {response:?}")]
    Rejected {
        command: CommandName,
        response: String,
    },

    /// The operation is not allowed in the current transaction state.
    #[error("{operation} not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: TransactionState,
    },
}

impl FiscalError {
    /// Name of the command the error is attributed to, if any.
    pub fn command(&self) -> Option<CommandName> {
        match self {
            FiscalError::Transport { command, .. } | FiscalError::Rejected { command, .. } => {
                Some(*command)
            }
            FiscalError::Protocol(_) | FiscalError::InvalidState { .. } => None,
        }
    }
}

pub type FiscalResult<T> = std::result::Result<T, FiscalError>;
