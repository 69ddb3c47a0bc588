use embedded_hal::blocking::delay::DelayUs;

use crate::bus::Transport;
use crate::card::CardInfo;
use crate::config::{HwCapabilities, InitPolicy};
use crate::detect::{AlwaysPresent, CardDetect};
use crate::registry::CommandRegistry;

use super::InitState;

/// One card slot driven through `transport`
pub struct Controller<T, D, C = AlwaysPresent> {
    pub(crate) transport: T,
    pub(crate) delay: D,
    pub(crate) detect: C,
    pub(crate) hw: HwCapabilities,
    pub(crate) policy: InitPolicy,
    pub(crate) registry: CommandRegistry,
    pub(crate) state: InitState,
    pub(crate) card: Option<CardInfo>,
}

impl<T: Transport, D: DelayUs<u32>> Controller<T, D> {
    pub fn new(transport: T, delay: D, hw: HwCapabilities, policy: InitPolicy) -> Self {
        Controller {
            transport,
            delay,
            detect: AlwaysPresent,
            hw,
            policy,
            registry: CommandRegistry::new(),
            state: InitState::PowerUp,
            card: None,
        }
    }
}

impl<T, D, C> Controller<T, D, C> {
    /// Check `detect` before every initialization of a removable card
    pub fn with_card_detect<P: CardDetect>(self, detect: P) -> Controller<T, D, P> {
        Controller {
            transport: self.transport,
            delay: self.delay,
            detect,
            hw: self.hw,
            policy: self.policy,
            registry: self.registry,
            state: self.state,
            card: self.card,
        }
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    /// Known once the card reached transfer state
    pub fn card(&self) -> Option<&CardInfo> {
        self.card.as_ref()
    }

    pub fn hw_capabilities(&self) -> &HwCapabilities {
        &self.hw
    }

    pub fn registry(&self) -> CommandRegistry {
        self.registry
    }

    pub fn release(self) -> (T, D, C) {
        (self.transport, self.delay, self.detect)
    }
}
