/// Whether a command is broadcast or addressed, and whether a data phase follows
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandClass {
    /// Broadcast, no response (bc)
    Broadcast = 0,
    /// Broadcast with response (bcr)
    BroadcastWithResponse = 1,
    /// Addressed, no data transfer (ac)
    AddressedNoData = 2,
    /// Addressed data transfer, host to card (adtc)
    AddressedDataWrite = 3,
    /// Addressed data transfer, card to host (adtc)
    AddressedDataRead = 4,
}

pub const COMMAND_CLASS_MASK: u32 = 0x7000;

impl CommandClass {
    pub fn code(self) -> u32 {
        (self as u32) << 12
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match (code & COMMAND_CLASS_MASK) >> 12 {
            0 => Self::Broadcast,
            1 => Self::BroadcastWithResponse,
            2 => Self::AddressedNoData,
            3 => Self::AddressedDataWrite,
            4 => Self::AddressedDataRead,
            _ => return None,
        })
    }

    /// Direction of the data phase, if the command has one
    pub fn data_phase(self) -> Option<Operation> {
        match self {
            Self::AddressedDataRead => Some(Operation::Read),
            Self::AddressedDataWrite => Some(Operation::Write),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

/// Protocol dialect a command belongs to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CardFamily {
    Common = 0,
    Mmc = 1,
    Sd = 2,
}

pub const CARD_FAMILY_MASK: u32 = 0x1_8000;
pub const APP_COMMAND_FLAG: u32 = 0x2_0000;

impl CardFamily {
    pub fn code(self) -> u32 {
        (self as u32) << 15
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match (code & CARD_FAMILY_MASK) >> 15 {
            0 => Self::Common,
            1 => Self::Mmc,
            2 => Self::Sd,
            _ => return None,
        })
    }

    /// Whether a command of this family may be sent to a card of family `card`
    pub fn applies_to(self, card: CardFamily) -> bool {
        self == CardFamily::Common || self == card
    }
}
