use embedded_hal::blocking::delay::DelayUs;
use log::{debug, warn};

use crate::bus::Transport;
use crate::card::CardInfo;
use crate::command_arguments::sd::{Cmd6, BUS_WIDTH_4BIT};
use crate::command_flags::CardFamily;
use crate::command_responses::Response;
use crate::config::DataWidth;
use crate::detect::CardDetect;
use crate::error::{Error, TimeoutKind};
use crate::registers::card_status::SWITCH_ERROR;
use crate::registers::ocr::ocr_voltage_support;
use crate::status::Severity;

use super::controller::Controller;
use super::{Completion, Degraded};

impl<T: Transport, D: DelayUs<u32>, C: CardDetect> Controller<T, D, C> {
    /// Ask the card to send its operation conditions until it finished its power up.
    /// Every try is CMD55 followed by ACMD41. Returns the card capacity status.
    pub(super) fn sd_send_op_cond(&mut self) -> Result<bool, Error> {
        let command = self.registry.resolve(41, CardFamily::Sd, true)?;
        let mut arg = ocr_voltage_support();
        arg.set_high_capacity(true);
        let attempts = self.policy.attempts();
        for attempt in 1..=attempts {
            match self.attempt(command, arg.val, 0, Some(0)) {
                Ok(Completion { response: Response::Ocr(ocr), .. })
                    if ocr.card_powered_up_status() =>
                {
                    return Ok(ocr.card_capacity_status())
                }
                Ok(_) => debug!("ACMD41 card busy, attempt {}", attempt),
                Err(error) if error.is_retryable() => {
                    debug!("ACMD41 failed with {:?}, attempt {}", error, attempt)
                }
                Err(error) => return Err(error),
            }
            if attempt < attempts {
                self.delay.delay_us(self.policy.op_cond_poll_delay_us);
            }
        }
        Err(Error::Timeout(TimeoutKind::OpCond))
    }

    /// CMD3: the card publishes its relative address. Zero is not a valid address, the
    /// card is asked again. Timeouts and CRC errors use the same attempts.
    pub(super) fn sd_address_assignment(&mut self) -> Result<u16, Error> {
        let command = self.registry.resolve(3, CardFamily::Sd, false)?;
        let attempts = self.policy.attempts();
        let mut last_error = None;
        for attempt in 1..=attempts {
            let completion = match self.attempt(command, 0, 0, None) {
                Ok(completion) => completion,
                Err(error) if error.is_retryable() => {
                    debug!("CMD3 failed with {:?}, attempt {}", error, attempt);
                    last_error = Some(error);
                    continue;
                }
                Err(error) => return Err(error),
            };
            last_error = None;
            let published = match completion.response {
                Response::PublishedRca(published) => published,
                _ => {
                    let shape = command.response_shape;
                    return Err(Error::ShapeMismatch { opcode: command.opcode, shape });
                }
            };
            let status = completion.status.map(|status| status.register());
            match status {
                Some(status) if !status.ready_for_data() && !status.app_cmd() => {
                    return Err(Error::UnexpectedState(status.state()))
                }
                _ => (),
            }
            if published.address() != 0 {
                return Ok(published.address());
            }
            debug!("Card published RCA 0, attempt {}", attempt);
        }
        Err(last_error.unwrap_or(Error::Timeout(TimeoutKind::Command)))
    }

    /// Switch to a 4-bit bus and high speed. Only fatal card status fails.
    pub(super) fn sd_negotiate(&mut self, card: &mut CardInfo) -> Result<Degraded, Error> {
        let mut degraded = Degraded::default();

        if self.hw.max_data_width >= DataWidth::FourBit {
            // ACMD6 - Define the data bus width to be 4 bits
            let command = self.registry.resolve(6, CardFamily::Sd, true)?;
            match self.exchange_with(command, BUS_WIDTH_4BIT, 0, Some(card.rca)) {
                Ok(_) => card.bus_width = DataWidth::FourBit,
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    warn!("Could not set 4-bit bus: {:?}", error);
                    degraded.bus_width = Some(error);
                }
            }
        }

        if self.hw.hs_mode_supported {
            match self.sd_switch_high_speed() {
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

    /// CMD6 SWITCH_FUNC to access mode high speed. The 512-bit switch status is read by the
    /// transport as the data phase of the command.
    fn sd_switch_high_speed(&mut self) -> Result<(), Error> {
        let command = self.registry.resolve(6, CardFamily::Sd, false)?;
        let completion = self.exchange(command, Cmd6::high_speed().val, SWITCH_ERROR)?;
        match completion.status {
            Some(status) if status.register().switch_error() => {
                Err(Error::Card { severity: Severity::Advisory, status })
            }
            _ => Ok(()),
        }
    }
}
