use crate::command_flags::CardFamily;
use crate::config::DataWidth;
use crate::registers::cid::CidRegister;
use crate::registers::csd::CsdRegister;

// SD/MMC transfer rate unit codes (10K) list
pub const SD_MMC_TRANS_UNITS: [u32; 8] = [10, 100, 1_000, 10_000, 0, 0, 0, 0];
// MMC transfer multiplier factor codes (1/10) list
pub const MMC_TRANS_MULTIPLIERS: [u32; 16] =
    [0, 10, 12, 13, 15, 20, 26, 30, 35, 40, 45, 52, 55, 60, 70, 80];

pub const MMC_DEFAULT_CLOCK: u32 = 26_000_000;
pub const MMC_HIGH_SPEED_CLOCK: u32 = 52_000_000;
pub const SD_DEFAULT_CLOCK: u32 = 25_000_000;
pub const SD_HIGH_SPEED_CLOCK: u32 = 50_000_000;

/// What initialization learned about the card
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CardInfo {
    pub family: CardFamily,
    /// Relative card address
    pub rca: u16,
    pub cid: CidRegister,
    /// Only read from MMC
    pub csd: Option<CsdRegister>,
    /// Sector rather than byte addressing
    pub high_capacity: bool,
    pub bus_width: DataWidth,
    pub high_speed: bool,
    /// Card access clock in Hz
    pub clock: u32,
}

impl CardInfo {
    pub(crate) fn new(family: CardFamily) -> Self {
        let clock = match family {
            CardFamily::Sd => SD_DEFAULT_CLOCK,
            _ => MMC_DEFAULT_CLOCK,
        };
        Self {
            family,
            rca: 0,
            cid: CidRegister::default(),
            csd: None,
            high_capacity: false,
            bus_width: DataWidth::OneBit,
            high_speed: false,
            clock,
        }
    }

    /// MMC legacy interface clock from CSD TRAN_SPEED
    pub(crate) fn decode_mmc_clock(csd: &CsdRegister) -> Option<u32> {
        let trans_speed = csd.transmission_speed();
        let unit = SD_MMC_TRANS_UNITS[(trans_speed & 0x7) as usize];
        let mult = MMC_TRANS_MULTIPLIERS[((trans_speed >> 3) & 0xF) as usize];
        Some(unit * mult * 1000).filter(|&clock| clock != 0)
    }

    /// Clock after switching to high speed timing
    pub fn high_speed_clock(&self) -> u32 {
        match self.family {
            CardFamily::Sd => SD_HIGH_SPEED_CLOCK,
            _ => MMC_HIGH_SPEED_CLOCK,
        }
    }
}
