mod controller;
mod mmc;
mod sdcard;
mod sdmmc;

use embedded_error::mci::MciError;
use embedded_hal::blocking::delay::DelayUs;
use log::{debug, trace, warn};

use crate::bus::Transport;
use crate::card::CardInfo;
use crate::command_arguments::rca_argument;
use crate::command_flags::CardFamily;
use crate::command_responses::{self, Response};
use crate::commands::{CommandDescriptor, CMD13_SEND_STATUS, CMD55_APP_CMD};
use crate::detect::CardDetect;
use crate::error::{Error, TransportError};
use crate::status::{classify, CardStatus, Outcome, Severity};

pub use controller::Controller;

/// Steps of card initialization
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitState {
    PowerUp,
    IdentifyVoltage,
    SendOpCond,
    AllSendCid,
    AddressAssignment,
    /// MMC only
    SendCsd,
    Standby,
    TransferReady,
    Failed,
}

/// Initialization stopped in `state` because of `cause`
#[derive(Debug)]
pub struct InitError {
    pub state: InitState,
    pub cause: Error,
}

impl From<InitError> for MciError {
    fn from(error: InitError) -> Self {
        error.cause.into()
    }
}

/// Optional capabilities that could not be enabled
#[derive(Debug, Default)]
pub struct Degraded {
    pub bus_width: Option<Error>,
    pub high_speed: Option<Error>,
}

impl Degraded {
    pub fn is_empty(&self) -> bool {
        self.bus_width.is_none() && self.high_speed.is_none()
    }
}

#[derive(Debug)]
pub struct TransferReady {
    pub card: CardInfo,
    pub degraded: Degraded,
}

/// A finished exchange
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub response: Response,
    /// Present for shapes carrying card status, may hold advisory bits
    pub status: Option<CardStatus>,
}

impl Completion {
    fn is_advisory(&self) -> bool {
        self.status.and_then(|status| status.severity()) == Some(Severity::Advisory)
    }
}

impl<T: Transport, D: DelayUs<u32>, C: CardDetect> Controller<T, D, C> {
    /// Send, validate, classify and wait for the busy line to clear.
    /// Fatal card status is returned as error without waiting for busy.
    fn exchange_once(
        &mut self,
        command: &CommandDescriptor,
        argument: u32,
        ignore_mask: u32,
    ) -> Result<Completion, Error> {
        trace!("{} argument {:#010x}", command.name, argument);
        let reply = self.transport.send_command(command, argument)?;
        let response = command_responses::validate(command, argument, &reply)?;
        let status = match response.status_word().map(|raw| classify(raw, ignore_mask)) {
            Some(Outcome::CardError { severity: Severity::Fatal, status }) => {
                for (position, name, _) in status.errors() {
                    debug!("{} status bit {} {}", command.name, position, name);
                }
                return Err(Error::Card { severity: Severity::Fatal, status });
            }
            Some(outcome) => Some(outcome.status()),
            None => None,
        };
        if command.response_shape.fields().busy {
            self.wait_busy()?;
        }
        Ok(Completion { response, status })
    }

    /// A busy timeout waits again without sending the command again
    fn wait_busy(&mut self) -> Result<(), Error> {
        let timeout_ms = self.policy.busy_timeout_ms;
        let mut remaining = self.policy.retries_after_fail;
        loop {
            match self.transport.wait_busy_clear(timeout_ms) {
                Ok(()) => return Ok(()),
                Err(TransportError::BusyTimeout) if remaining > 0 => {
                    remaining -= 1;
                    debug!("Card still busy after {}ms", timeout_ms);
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// One try of `command`, preceded by CMD55 for application commands
    fn attempt(
        &mut self,
        command: &CommandDescriptor,
        argument: u32,
        ignore_mask: u32,
        app_rca: Option<u16>,
    ) -> Result<Completion, Error> {
        if let Some(rca) = app_rca {
            let prefix = self.exchange_once(&CMD55_APP_CMD, rca_argument(rca), 0)?;
            if !prefix.status.map(|status| status.app_cmd()).unwrap_or(false) {
                return Err(Error::AppCommandRejected);
            }
        }
        self.exchange_once(command, argument, ignore_mask)
    }

    /// Try `command` until it succeeds or the retry budget is spent. Only command timeouts
    /// and CRC errors are retried, advisory status is returned with the completion.
    pub(crate) fn exchange_with(
        &mut self,
        command: &CommandDescriptor,
        argument: u32,
        ignore_mask: u32,
        app_rca: Option<u16>,
    ) -> Result<Completion, Error> {
        let attempts = self.policy.attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(command, argument, ignore_mask, app_rca) {
                Ok(completion) => {
                    if completion.is_advisory() {
                        let status = completion.status.map(|status| status.raw()).unwrap_or(0);
                        warn!("{} accepted with status {:#010x}", command.name, status);
                    }
                    return Ok(completion);
                }
                Err(error) if error.is_retryable() && attempt < attempts => {
                    debug!("{} failed with {:?}, retry {}", command.name, error, attempt);
                }
                Err(error) => return Err(error),
            }
        }
    }

    pub(crate) fn exchange(
        &mut self,
        command: &CommandDescriptor,
        argument: u32,
        ignore_mask: u32,
    ) -> Result<Completion, Error> {
        self.exchange_with(command, argument, ignore_mask, None)
    }

    /// CMD13: card status of the addressed card
    pub(crate) fn send_status(&mut self, rca: u16, ignore_mask: u32) -> Result<CardStatus, Error> {
        let completion = self.exchange(&CMD13_SEND_STATUS, rca_argument(rca), ignore_mask)?;
        completion.status.ok_or(Error::ShapeMismatch {
            opcode: CMD13_SEND_STATUS.opcode,
            shape: CMD13_SEND_STATUS.response_shape,
        })
    }

    fn ready_card(&self) -> Result<CardInfo, Error> {
        match (self.state, self.card) {
            (InitState::TransferReady, Some(card)) => Ok(card),
            _ => Err(Error::NotReady),
        }
    }

    /// Send command `opcode` of `family` to the card in transfer state
    pub fn issue(
        &mut self,
        opcode: u8,
        family: CardFamily,
        app: bool,
        argument: u32,
    ) -> Result<Completion, Error> {
        self.issue_masked(opcode, family, app, argument, 0)
    }

    /// Like [`issue`](Self::issue), error bits in `ignore_mask` are not reported
    pub fn issue_masked(
        &mut self,
        opcode: u8,
        family: CardFamily,
        app: bool,
        argument: u32,
        ignore_mask: u32,
    ) -> Result<Completion, Error> {
        let command = self.registry.resolve(opcode, family, app)?;
        self.issue_descriptor(command, argument, ignore_mask)
    }

    /// Send a descriptor directly, required for variants sharing their index with another
    /// command such as CMD12 after a write
    pub fn issue_descriptor(
        &mut self,
        command: &CommandDescriptor,
        argument: u32,
        ignore_mask: u32,
    ) -> Result<Completion, Error> {
        let card = self.ready_card()?;
        self.registry.validate(command, card.family)?;
        if command.opcode == 23 && !command.is_app_command {
            // Bits 15..0 of CMD23 hold the number of blocks
            let requested = argument & 0xFFFF;
            if let Some(max) = self.hw.max_block_count {
                if requested > max {
                    return Err(Error::BlockCountExceeded { requested, max });
                }
            }
        }
        let app_rca = if command.is_app_command { Some(card.rca) } else { None };
        self.exchange_with(command, argument, ignore_mask, app_rca)
    }
}
