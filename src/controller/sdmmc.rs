use embedded_hal::blocking::delay::DelayUs;
use log::{debug, error, info};

use crate::bus::{Transport, SD_MMC_BLOCK_SIZE};
use crate::card::CardInfo;
use crate::command_arguments::rca_argument;
use crate::command_arguments::sd::Cmd8;
use crate::command_flags::CardFamily;
use crate::command_responses::Response;
use crate::commands::{CMD0_GO_IDLE_STATE, CMD16_SET_BLOCKLEN, CMD7_SELECT_CARD};
use crate::config::{BusConfig, Presence};
use crate::detect::CardDetect;
use crate::error::{Error, TimeoutKind};
use crate::registers::cid::CidRegister;

use super::controller::Controller;
use super::{InitError, InitState, TransferReady};

impl<T: Transport, D: DelayUs<u32>, C: CardDetect> Controller<T, D, C> {
    /// Bring the card from power up to transfer state.
    ///
    /// The card is identified on a 1-bit bus at 400kHz, addressed and selected. Wider bus and
    /// high speed are then enabled as far as both sides support them; failing to enable them
    /// is reported in [`TransferReady::degraded`] and does not fail initialization.
    pub fn initialize(&mut self) -> Result<TransferReady, InitError> {
        self.card = None;
        match self.init_sequence() {
            Ok(ready) => {
                self.state = InitState::TransferReady;
                self.card = Some(ready.card);
                info!(
                    "{:?} card {:#010x} ready, rca {}, {}-bit bus at {}Hz",
                    ready.card.family,
                    ready.card.cid.serial_number(),
                    ready.card.rca,
                    ready.card.bus_width.lines(),
                    ready.card.clock
                );
                Ok(ready)
            }
            Err(cause) => {
                let state = self.state;
                self.state = InitState::Failed;
                error!("Initialization failed in {:?}: {:?}", state, cause);
                Err(InitError { state, cause })
            }
        }
    }

    fn enter(&mut self, state: InitState) {
        debug!("Enter {:?}", state);
        self.state = state;
    }

    fn init_sequence(&mut self) -> Result<TransferReady, Error> {
        self.enter(InitState::PowerUp);
        if self.hw.card_removable && self.detect.presence()? == Presence::CardIsOut {
            return Err(Error::NoCard);
        }
        self.transport.configure(&BusConfig::identification())?;
        // CMD0 - Reset all cards to idle state.
        self.exchange(&CMD0_GO_IDLE_STATE, 0, 0)?;

        self.enter(InitState::IdentifyVoltage);
        let family = self.identify_voltage()?;
        info!("{:?} card detected", family);
        let mut card = CardInfo::new(family);

        self.enter(InitState::SendOpCond);
        card.high_capacity = match family {
            CardFamily::Sd => self.sd_send_op_cond()?,
            _ => self.mmc_send_op_cond()?,
        };

        self.enter(InitState::AllSendCid);
        card.cid = self.all_send_cid(family)?;

        self.enter(InitState::AddressAssignment);
        card.rca = match family {
            CardFamily::Sd => self.sd_address_assignment()?,
            _ => self.mmc_address_assignment()?,
        };

        if family != CardFamily::Sd {
            self.enter(InitState::SendCsd);
            self.mmc_send_csd(&mut card)?;
        }

        self.enter(InitState::Standby);
        // Select the card and put it into Transfer mode
        self.exchange(&CMD7_SELECT_CARD, rca_argument(card.rca), 0)?;

        let degraded = match family {
            CardFamily::Sd => self.sd_negotiate(&mut card)?,
            _ => self.mmc_negotiate(&mut card)?,
        };
        self.exchange(&CMD16_SET_BLOCKLEN, SD_MMC_BLOCK_SIZE as u32, 0)?;

        card.clock = self.hw.cap_clock(card.clock);
        let (width, clock, high_speed) = (card.bus_width, card.clock, card.high_speed);
        self.transport.configure(&BusConfig { width, clock, high_speed })?;
        Ok(TransferReady { card, degraded })
    }

    /// CMD8: only SD cards of version 2 or later answer with the echoed check pattern.
    /// Silence or a wrong echo means MMC.
    fn identify_voltage(&mut self) -> Result<CardFamily, Error> {
        let command = self.registry.resolve(8, CardFamily::Sd, false)?;
        let argument = Cmd8::standard().val;
        let attempts = self.policy.attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.exchange_once(command, argument, 0) {
                Ok(_) => return Ok(CardFamily::Sd),
                Err(Error::Timeout(TimeoutKind::Command)) => return Ok(CardFamily::Mmc),
                Err(Error::ShapeMismatch { .. }) => {
                    debug!("No compliant R7, assuming MMC");
                    return Ok(CardFamily::Mmc);
                }
                Err(error) if error.is_retryable() && attempt < attempts => {
                    debug!("CMD8 failed with {:?}, retry {}", error, attempt)
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// CMD2: Card identification register of the single card on the bus
    fn all_send_cid(&mut self, family: CardFamily) -> Result<CidRegister, Error> {
        let command = self.registry.resolve(2, family, false)?;
        let completion = self.exchange(command, 0, 0)?;
        match completion.response {
            Response::Register(words) => Ok(CidRegister(words)),
            _ => {
                Err(Error::ShapeMismatch { opcode: command.opcode, shape: command.response_shape })
            }
        }
    }
}
