use embedded_error::mci::MciError;
use embedded_hal::digital::v2::InputPin;

use crate::config::Presence;

/// Reports whether a card sits in a removable slot
pub trait CardDetect {
    fn presence(&mut self) -> Result<Presence, MciError>;
}

/// Soldered down eMMC or a slot without a detect switch
#[derive(Copy, Clone, Debug, Default)]
pub struct AlwaysPresent;

impl CardDetect for AlwaysPresent {
    fn presence(&mut self) -> Result<Presence, MciError> {
        Ok(Presence::CardIsIn)
    }
}

/// Card detect switch wired to an input pin
pub struct DetectPin<P> {
    pin: P,
    high_is_present: bool,
}

impl<P: InputPin> DetectPin<P> {
    pub fn new(pin: P, high_is_present: bool) -> Self {
        Self { pin, high_is_present }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> CardDetect for DetectPin<P> {
    fn presence(&mut self) -> Result<Presence, MciError> {
        let high = self.pin.is_high().map_err(|_| MciError::PinLevelReadError)?;
        Ok(if high == self.high_is_present { Presence::CardIsIn } else { Presence::CardIsOut })
    }
}
