mod card;

pub use card::{
    CardInfo, MMC_DEFAULT_CLOCK, MMC_HIGH_SPEED_CLOCK, MMC_TRANS_MULTIPLIERS, SD_DEFAULT_CLOCK,
    SD_HIGH_SPEED_CLOCK, SD_MMC_TRANS_UNITS,
};
