use embedded_hal::blocking::delay::DelayUs;
use log::{debug, warn};

use crate::bus::Transport;
use crate::card::CardInfo;
use crate::command_arguments::mmc::Cmd6;
use crate::command_arguments::rca_argument;
use crate::command_flags::CardFamily;
use crate::command_responses::Response;
use crate::commands::CMD9_SEND_CSD;
use crate::config::DataWidth;
use crate::detect::CardDetect;
use crate::error::{Error, TimeoutKind};
use crate::registers::card_status::SWITCH_ERROR;
use crate::registers::csd::CsdRegister;
use crate::registers::ocr::{ocr_voltage_support, AccessMode};
use crate::status::Severity;

use super::controller::Controller;
use super::{Completion, Degraded};

/// Relative card address the host assigns to the single MMC on the bus
pub const MMC_RCA: u16 = 1;

/// EXT_CSD, and so bus width and timing switches, exist from spec version 4
const MMC_SPEC_VERSION_4: u8 = 4;

impl<T: Transport, D: DelayUs<u32>, C: CardDetect> Controller<T, D, C> {
    /// CMD1 until the card finished its power up. Returns whether the card is sector
    /// addressed.
    pub(super) fn mmc_send_op_cond(&mut self) -> Result<bool, Error> {
        let command = self.registry.resolve(1, CardFamily::Mmc, false)?;
        let mut ocr = ocr_voltage_support();
        ocr.set_access_mode(AccessMode::Sector);
        let attempts = self.policy.attempts();
        for attempt in 1..=attempts {
            match self.attempt(command, ocr.val, 0, None) {
                Ok(Completion { response: Response::Ocr(reply), .. })
                    if reply.card_powered_up_status() =>
                {
                    return Ok(reply.access_mode() == AccessMode::Sector)
                }
                Ok(_) => debug!("CMD1 card busy, attempt {}", attempt),
                Err(error) if error.is_retryable() => {
                    debug!("CMD1 failed with {:?}, attempt {}", error, attempt)
                }
                Err(error) => return Err(error),
            }
            if attempt < attempts {
                self.delay.delay_us(self.policy.op_cond_poll_delay_us);
            }
        }
        Err(Error::Timeout(TimeoutKind::OpCond))
    }

    /// CMD3: assign the relative address
    pub(super) fn mmc_address_assignment(&mut self) -> Result<u16, Error> {
        let command = self.registry.resolve(3, CardFamily::Mmc, false)?;
        let completion = self.exchange(command, rca_argument(MMC_RCA), 0)?;
        match completion.status {
            Some(status) if status.ready_for_data() => Ok(MMC_RCA),
            Some(status) => Err(Error::UnexpectedState(status.state())),
            None => {
                Err(Error::ShapeMismatch { opcode: command.opcode, shape: command.response_shape })
            }
        }
    }

    /// CMD9: card specific data, sets the legacy interface clock
    pub(super) fn mmc_send_csd(&mut self, card: &mut CardInfo) -> Result<(), Error> {
        let completion = self.exchange(&CMD9_SEND_CSD, rca_argument(card.rca), 0)?;
        let csd = match completion.response {
            Response::Register(words) => CsdRegister(words),
            _ => {
                let shape = CMD9_SEND_CSD.response_shape;
                return Err(Error::ShapeMismatch { opcode: CMD9_SEND_CSD.opcode, shape });
            }
        };
        if let Some(clock) = CardInfo::decode_mmc_clock(&csd) {
            card.clock = clock;
        }
        card.csd = Some(csd);
        Ok(())
    }

    /// CMD6 followed by CMD13, SWITCH_ERROR in either reply means the card refused
    fn mmc_switch(&mut self, rca: u16, argument: u32) -> Result<(), Error> {
        let command = self.registry.resolve(6, CardFamily::Mmc, false)?;
        let completion = self.exchange(command, argument, SWITCH_ERROR)?;
        let status = self.send_status(rca, SWITCH_ERROR)?;
        let switched = completion.status.into_iter().chain(Some(status));
        for status in switched {
            if status.register().switch_error() {
                return Err(Error::Card { severity: Severity::Advisory, status });
            }
        }
        Ok(())
    }

    /// Widen the bus and enable high speed timing. Only fatal card status fails.
    pub(super) fn mmc_negotiate(&mut self, card: &mut CardInfo) -> Result<Degraded, Error> {
        let mut degraded = Degraded::default();
        let spec_version = card.csd.map(|csd| csd.mmc_csd_spec_version()).unwrap_or(0);
        if spec_version < MMC_SPEC_VERSION_4 {
            debug!("MMC spec version {}, keep 1-bit legacy timing", spec_version);
            return Ok(degraded);
        }

        let width = self.hw.max_data_width;
        if width >= DataWidth::FourBit {
            let mut arg = Cmd6::default();
            arg.set_bus_width(width);
            match self.mmc_switch(card.rca, arg.val) {
                Ok(()) => card.bus_width = width,
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    warn!("Could not set {}-bit bus: {:?}", width.lines(), error);
                    degraded.bus_width = Some(error);
                }
            }
        }

        if self.hw.hs_mode_supported {
            let mut arg = Cmd6::default();
            arg.set_high_speed();
            match self.mmc_switch(card.rca, arg.val) {
                Ok(()) => {
                    card.high_speed = true;
                    card.clock = card.high_speed_clock();
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    warn!("Could not set high speed: {:?}", error);
                    degraded.high_speed = Some(error);
                }
            }
        }
        Ok(degraded)
    }
}
