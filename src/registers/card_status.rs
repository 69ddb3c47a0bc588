use bit_field::BitField;

pub const OUT_OF_RANGE: u32 = 0x8000_0000;
pub const ADDRESS_ERROR: u32 = 0x4000_0000;
pub const BLOCK_LEN_ERROR: u32 = 0x2000_0000;
pub const ERASE_SEQ_ERROR: u32 = 0x1000_0000;
pub const ERASE_PARAM: u32 = 0x0800_0000;
pub const WP_VIOLATION: u32 = 0x0400_0000;
pub const CARD_IS_LOCKED: u32 = 0x0200_0000;
pub const LOCK_UNLOCK_FAILED: u32 = 0x0100_0000;
pub const COM_CRC_ERROR: u32 = 0x0080_0000;
pub const ILLEGAL_COMMAND: u32 = 0x0040_0000;
pub const CARD_ECC_FAILED: u32 = 0x0020_0000;
pub const CC_ERROR: u32 = 0x0010_0000;
pub const ERROR: u32 = 0x0008_0000;
pub const UNDERRUN: u32 = 0x0004_0000;
pub const OVERRUN: u32 = 0x0002_0000;
pub const CID_CSD_OVERWRITE: u32 = 0x0001_0000;
pub const WP_ERASE_SKIP: u32 = 0x0000_8000;
pub const CARD_ECC_DISABLED: u32 = 0x0000_4000;
pub const ERASE_RESET: u32 = 0x0000_2000;
pub const CARD_STATE: u32 = 0x0000_1E00;
pub const READY_FOR_DATA: u32 = 0x0000_0100;
pub const SWITCH_ERROR: u32 = 0x0000_0080;
pub const APP_CMD: u32 = 0x0000_0020;
pub const AKE_SEQ_ERROR: u32 = 0x0000_0008;

pub const CARD_STATE_SHIFT: u32 = 9;

/// CURRENT_STATE field of the card status
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CardState {
    Idle,
    Ready,
    Identification,
    Standby,
    Transfer,
    Sending,
    Receiving,
    Programming,
    Disconnected,
    /// MMC only
    BusTest,
    /// MMC only
    Sleep,
    Reserved(u8),
}

impl From<u8> for CardState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Ready,
            2 => Self::Identification,
            3 => Self::Standby,
            4 => Self::Transfer,
            5 => Self::Sending,
            6 => Self::Receiving,
            7 => Self::Programming,
            8 => Self::Disconnected,
            9 => Self::BusTest,
            10 => Self::Sleep,
            n => Self::Reserved(n),
        }
    }
}

impl From<CardState> for u8 {
    fn from(state: CardState) -> u8 {
        match state {
            CardState::Idle => 0,
            CardState::Ready => 1,
            CardState::Identification => 2,
            CardState::Standby => 3,
            CardState::Transfer => 4,
            CardState::Sending => 5,
            CardState::Receiving => 6,
            CardState::Programming => 7,
            CardState::Disconnected => 8,
            CardState::BusTest => 9,
            CardState::Sleep => 10,
            CardState::Reserved(n) => n,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CardStatusRegister {
    pub val: u32,
}

impl CardStatusRegister {
    pub fn out_of_range(&self) -> bool {
        self.val.get_bit(31)
    }

    pub fn address_error(&self) -> bool {
        self.val.get_bit(30)
    }

    pub fn block_len_error(&self) -> bool {
        self.val.get_bit(29)
    }

    pub fn write_protect_violation(&self) -> bool {
        self.val.get_bit(26)
    }

    pub fn card_is_locked(&self) -> bool {
        self.val.get_bit(25)
    }

    pub fn com_crc_error(&self) -> bool {
        self.val.get_bit(23)
    }

    pub fn illegal_command(&self) -> bool {
        self.val.get_bit(22)
    }

    pub fn state(&self) -> CardState {
        CardState::from(self.val.get_bits(9..13) as u8)
    }

    pub fn set_state(&mut self, state: CardState) -> &mut Self {
        self.val.set_bits(9..13, u8::from(state) as u32);
        self
    }

    pub fn ready_for_data(&self) -> bool {
        self.val.get_bit(8)
    }

    pub fn switch_error(&self) -> bool {
        self.val.get_bit(7)
    }

    pub fn app_cmd(&self) -> bool {
        self.val.get_bit(5)
    }
}
