use bit_field::BitField;

/// Clock used while the card is identified
pub const IDENTIFICATION_CLOCK: u32 = 400_000;

/// Number of DAT lines
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataWidth {
    OneBit = 0,
    FourBit = 1,
    EightBit = 2,
}

impl DataWidth {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::OneBit),
            1 => Some(Self::FourBit),
            2 => Some(Self::EightBit),
            _ => None,
        }
    }

    pub fn lines(self) -> u8 {
        match self {
            Self::OneBit => 1,
            Self::FourBit => 4,
            Self::EightBit => 8,
        }
    }
}

/// Packed version of the platform's host controller driver
///
/// Major in bits 31..24, minor in 23..16, release year since 2000 in 15..8 and release week
/// in 7..0, so 4.0 released on week 46 of 2008 reads 0x0400_082E.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ApiVersion(pub u32);

impl ApiVersion {
    pub fn major(&self) -> u8 {
        self.0.get_bits(24..32) as u8
    }

    pub fn minor(&self) -> u8 {
        self.0.get_bits(16..24) as u8
    }

    pub fn year(&self) -> u16 {
        2000 + self.0.get_bits(8..16) as u16
    }

    pub fn week(&self) -> u8 {
        self.0.get_bits(0..8) as u8
    }
}

/// What the host controller can do, provided once by the platform
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HwCapabilities {
    pub api_version: Option<ApiVersion>,
    /// Largest block count of one transfer, `None` when unlimited
    pub max_block_count: Option<u32>,
    /// Highest clock in Hz, `None` when not limited by the controller
    pub max_clock_freq: Option<u32>,
    pub max_data_width: DataWidth,
    pub hs_mode_supported: bool,
    pub card_removable: bool,
}

const NOT_AVAILABLE_U32: u32 = 0xFFFF_FFFF;

impl HwCapabilities {
    /// Build from the legacy layout where fields the controller cannot report are filled
    /// with 0xFF bytes. An unknown flag reads as unsupported.
    pub fn from_raw(
        api_version: u32,
        max_block_count: u32,
        max_clock_freq: u32,
        max_data_width: u16,
        hs_mode_supported: u8,
        card_removable: u8,
    ) -> Self {
        let available = |value: u32| Some(value).filter(|&v| v != NOT_AVAILABLE_U32);
        let data_width = DataWidth::from_code(max_data_width).unwrap_or(DataWidth::OneBit);
        Self {
            api_version: available(api_version).map(ApiVersion),
            max_block_count: available(max_block_count),
            max_clock_freq: available(max_clock_freq),
            max_data_width: data_width,
            hs_mode_supported: hs_mode_supported == 1,
            card_removable: card_removable == 1,
        }
    }

    /// `clock` limited to what the controller supports
    pub fn cap_clock(&self, clock: u32) -> u32 {
        match self.max_clock_freq {
            Some(max) => clock.min(max),
            None => clock,
        }
    }
}

impl Default for HwCapabilities {
    fn default() -> Self {
        Self {
            api_version: None,
            max_block_count: None,
            max_clock_freq: None,
            max_data_width: DataWidth::OneBit,
            hs_mode_supported: false,
            card_removable: false,
        }
    }
}

/// Retry behavior of a session
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InitPolicy {
    /// How many times an exchange is tried again after it failed
    pub retries_after_fail: u32,
    /// Pause between two operation condition polls
    pub op_cond_poll_delay_us: u32,
    /// Bound of one busy line wait
    pub busy_timeout_ms: u32,
}

impl InitPolicy {
    pub fn new(retries_after_fail: u32) -> Self {
        Self { retries_after_fail, op_cond_poll_delay_us: 1000, busy_timeout_ms: 1000 }
    }

    /// Total tries of one step
    pub fn attempts(&self) -> u32 {
        self.retries_after_fail.saturating_add(1)
    }
}

/// Bus parameters the transport has to apply
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusConfig {
    pub width: DataWidth,
    /// Hz
    pub clock: u32,
    pub high_speed: bool,
}

impl BusConfig {
    pub fn identification() -> Self {
        Self { width: DataWidth::OneBit, clock: IDENTIFICATION_CLOCK, high_speed: false }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Presence {
    CardIsIn,
    CardIsOut,
}
