//! Card status classification
//!
//! Every bit of the 32-bit card status carries exactly one severity. The table below is the
//! single source for names and severities; masks are derived from it at compile time.

use bit_field::BitField;

use crate::registers::card_status::{CardState, CardStatusRegister};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    /// The card rejected the command, never retried
    Fatal,
    /// Worth reporting, does not fail the exchange on its own
    Advisory,
    /// State information
    Informational,
    /// Not defined for either card family
    Reserved,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StatusBit {
    pub name: &'static str,
    pub severity: Severity,
}

const fn bit(name: &'static str, severity: Severity) -> StatusBit {
    StatusBit { name, severity }
}

const RESERVED: StatusBit = bit("RESERVED", Severity::Reserved);
const CARD_STATE: StatusBit = bit("CARD_STATE", Severity::Informational);

/// Indexed by bit position
pub const STATUS_BITS: [StatusBit; 32] = [
    RESERVED,
    RESERVED,
    RESERVED,
    bit("AKE_SEQ_ERROR", Severity::Fatal),
    RESERVED,
    bit("APP_CMD", Severity::Informational),
    RESERVED,
    bit("SWITCH_ERROR", Severity::Advisory),
    bit("READY_FOR_DATA", Severity::Informational),
    CARD_STATE,
    CARD_STATE,
    CARD_STATE,
    CARD_STATE,
    bit("ERASE_RESET", Severity::Advisory),
    bit("CARD_ECC_DISABLED", Severity::Advisory),
    bit("WP_ERASE_SKIP", Severity::Advisory),
    bit("CID_CSD_OVERWRITE", Severity::Advisory),
    bit("OVERRUN", Severity::Fatal),
    bit("UNDERRUN", Severity::Fatal),
    bit("ERROR", Severity::Fatal),
    bit("CC_ERROR", Severity::Fatal),
    bit("CARD_ECC_FAILED", Severity::Fatal),
    bit("ILLEGAL_COMMAND", Severity::Fatal),
    bit("COM_CRC_ERROR", Severity::Fatal),
    bit("LOCK_UNLOCK_FAILED", Severity::Fatal),
    bit("CARD_IS_LOCKED", Severity::Informational),
    bit("WP_VIOLATION", Severity::Fatal),
    bit("ERASE_PARAM", Severity::Fatal),
    bit("ERASE_SEQ_ERROR", Severity::Fatal),
    bit("BLOCK_LEN_ERROR", Severity::Fatal),
    bit("ADDRESS_ERROR", Severity::Fatal),
    bit("OUT_OF_RANGE", Severity::Fatal),
];

const fn mask_of(severity: Severity) -> u32 {
    let mut mask = 0;
    let mut position = 0;
    while position < 32 {
        if STATUS_BITS[position].severity as u8 == severity as u8 {
            mask |= 1 << position;
        }
        position += 1;
    }
    mask
}

pub const FATAL_MASK: u32 = mask_of(Severity::Fatal);
pub const ADVISORY_MASK: u32 = mask_of(Severity::Advisory);
pub const INFORMATIONAL_MASK: u32 = mask_of(Severity::Informational);
pub const RESERVED_MASK: u32 = mask_of(Severity::Reserved);

pub fn severity_of(position: u8) -> Severity {
    STATUS_BITS[position as usize & 31].severity
}

/// Name of a defined bit, `None` for reserved positions
pub fn name_of(position: u8) -> Option<&'static str> {
    match STATUS_BITS[position as usize & 31] {
        StatusBit { severity: Severity::Reserved, .. } => None,
        StatusBit { name, .. } => Some(name),
    }
}

/// A classified card status word
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CardStatus {
    raw: u32,
    ignored: u32,
}

impl CardStatus {
    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// Fatal bits not covered by the ignore mask
    pub fn fatal_bits(&self) -> u32 {
        self.raw & !self.ignored & FATAL_MASK
    }

    /// Advisory bits not covered by the ignore mask
    pub fn advisory_bits(&self) -> u32 {
        self.raw & !self.ignored & ADVISORY_MASK
    }

    pub fn severity(&self) -> Option<Severity> {
        if self.fatal_bits() != 0 {
            Some(Severity::Fatal)
        } else if self.advisory_bits() != 0 {
            Some(Severity::Advisory)
        } else {
            None
        }
    }

    pub fn state(&self) -> CardState {
        self.register().state()
    }

    pub fn ready_for_data(&self) -> bool {
        self.register().ready_for_data()
    }

    pub fn app_cmd(&self) -> bool {
        self.register().app_cmd()
    }

    pub fn card_is_locked(&self) -> bool {
        self.register().card_is_locked()
    }

    pub fn register(&self) -> CardStatusRegister {
        CardStatusRegister { val: self.raw }
    }

    /// Every unmasked fatal or advisory bit, lowest position first
    pub fn errors(&self) -> impl Iterator<Item = (u8, &'static str, Severity)> {
        let bits = self.fatal_bits() | self.advisory_bits();
        (0..32u8).filter(move |&position| bits.get_bit(position as usize)).map(|position| {
            let StatusBit { name, severity } = STATUS_BITS[position as usize];
            (position, name, severity)
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ok(CardStatus),
    CardError { severity: Severity, status: CardStatus },
}

impl Outcome {
    pub fn status(&self) -> CardStatus {
        match self {
            Self::Ok(status) => *status,
            Self::CardError { status, .. } => *status,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CardError { severity: Severity::Fatal, .. })
    }
}

/// Classify `raw`, skipping any error bit present in `ignore_mask`
pub fn classify(raw: u32, ignore_mask: u32) -> Outcome {
    let status = CardStatus { raw, ignored: ignore_mask };
    match status.severity() {
        Some(severity) => Outcome::CardError { severity, status },
        None => Outcome::Ok(status),
    }
}
