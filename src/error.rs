use embedded_error::mci::{CommandOrDataError, MciError};
use embedded_error::ImplError;

use crate::command_flags::CardFamily;
use crate::command_responses::ResponseShape;
use crate::registers::card_status::CardState;
use crate::status::{CardStatus, Severity};

/// Failures reported by the transport
#[derive(Debug)]
pub enum TransportError {
    CommandTimeout,
    DataTimeout,
    /// The busy line was still asserted when the wait expired
    BusyTimeout,
    CommandCrc,
    DataCrc,
    DmaAlloc,
    DmaTransfer,
    /// Anything else the controller driver reports
    Controller(MciError),
}

impl From<MciError> for TransportError {
    fn from(error: MciError) -> Self {
        Self::Controller(error)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimeoutKind {
    Command,
    Data,
    Busy,
    /// Card never finished its power up routine
    OpCond,
}

#[derive(Debug)]
pub enum Error {
    /// No descriptor for this index, family and application flag
    UnknownCommand { opcode: u8, family: CardFamily, app: bool },
    /// Command belongs to another card family
    Mismatch { expected: CardFamily, actual: CardFamily },
    /// Reply form does not match the response shape of the command
    ShapeMismatch { opcode: u8, shape: ResponseShape },
    Card { severity: Severity, status: CardStatus },
    Timeout(TimeoutKind),
    Transport(TransportError),
    /// CMD55 was answered without APP_CMD set
    AppCommandRejected,
    UnexpectedState(CardState),
    NoCard,
    /// Card has not reached transfer state yet
    NotReady,
    BlockCountExceeded { requested: u32, max: u32 },
}

impl Error {
    /// Transient faults, worth sending the command again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(TimeoutKind::Command) => true,
            Self::Transport(TransportError::CommandCrc) => true,
            Self::Transport(TransportError::DataCrc) => true,
            Self::AppCommandRejected => true,
            _ => false,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Card { severity: Severity::Fatal, .. })
    }
}

impl From<TransportError> for Error {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::CommandTimeout => Self::Timeout(TimeoutKind::Command),
            TransportError::DataTimeout => Self::Timeout(TimeoutKind::Data),
            TransportError::BusyTimeout => Self::Timeout(TimeoutKind::Busy),
            error => Self::Transport(error),
        }
    }
}

impl From<MciError> for Error {
    fn from(error: MciError) -> Self {
        Self::Transport(TransportError::Controller(error))
    }
}

impl From<Error> for MciError {
    fn from(error: Error) -> Self {
        match error {
            Error::Transport(TransportError::Controller(error)) => error,
            Error::Timeout(TimeoutKind::Data) => MciError::DataError(CommandOrDataError::Timeout),
            Error::Timeout(_) => MciError::Impl(ImplError::TimedOut),
            Error::NoCard => MciError::NoCard,
            Error::UnknownCommand { .. }
            | Error::Mismatch { .. }
            | Error::NotReady
            | Error::BlockCountExceeded { .. } => MciError::Impl(ImplError::InvalidConfiguration),
            _ => MciError::UnusableCard,
        }
    }
}
