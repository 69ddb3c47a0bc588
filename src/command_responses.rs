use bit_field::BitField;

use crate::commands::CommandDescriptor;
use crate::error::{Error, TransportError};
use crate::registers::ocr::OcrRegister;
use crate::registers::rca::PublishedRca;

/// Structural form of a command's reply
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseShape {
    None = 0,
    R1 = 1,
    R1b = 2,
    R2 = 3,
    R3 = 4,
    R4 = 5,
    R5 = 6,
    R6 = 7,
    R7 = 8,
}

pub const RESPONSE_TYPE_MASK: u32 = 0xF00;

impl ResponseShape {
    pub fn code(self) -> u32 {
        (self as u32) << 8
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code.get_bits(8..12) {
            0 => Self::None,
            1 => Self::R1,
            2 => Self::R1b,
            3 => Self::R2,
            4 => Self::R3,
            5 => Self::R4,
            6 => Self::R5,
            7 => Self::R6,
            8 => Self::R7,
            _ => return None,
        })
    }

    pub fn fields(self) -> FieldSet {
        expected_fields(self)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseLength {
    None,
    Bits48,
    Bits136,
}

/// Which card status layout a reply carries
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusLayout {
    None,
    Full,
    /// R6: bits 23, 22, 19 and 12..0 only
    Abbreviated,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FieldSet {
    pub length: ResponseLength,
    pub crc: bool,
    pub index_echo: bool,
    /// Card holds DAT0 low after the reply until it is ready
    pub busy: bool,
    pub status: StatusLayout,
}

const fn fields(
    length: ResponseLength,
    crc: bool,
    index_echo: bool,
    busy: bool,
    status: StatusLayout,
) -> FieldSet {
    FieldSet { length, crc, index_echo, busy, status }
}

pub fn expected_fields(shape: ResponseShape) -> FieldSet {
    use ResponseLength::*;
    match shape {
        ResponseShape::None => fields(None, false, false, false, StatusLayout::None),
        ResponseShape::R1 => fields(Bits48, true, true, false, StatusLayout::Full),
        ResponseShape::R1b => fields(Bits48, true, true, true, StatusLayout::Full),
        ResponseShape::R2 => fields(Bits136, true, false, false, StatusLayout::None),
        // OCR replies carry all ones in the CRC field
        ResponseShape::R3 => fields(Bits48, false, false, false, StatusLayout::None),
        ResponseShape::R4 => fields(Bits48, true, true, false, StatusLayout::None),
        ResponseShape::R5 => fields(Bits48, true, true, false, StatusLayout::None),
        ResponseShape::R6 => fields(Bits48, true, true, false, StatusLayout::Abbreviated),
        ResponseShape::R7 => fields(Bits48, true, true, false, StatusLayout::None),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RawResponse {
    None,
    Short(u32),
    /// `[0]` holds bits 127..96
    Long([u32; 4]),
}

/// Reply as received by the transport
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawReply {
    pub response: RawResponse,
    /// Command index field of the reply, all ones for R2 and R3
    pub index: u8,
    /// Transport computed a matching CRC7
    pub crc_ok: bool,
}

const NO_INDEX: u8 = 0x3F;

impl RawReply {
    pub fn none() -> Self {
        Self { response: RawResponse::None, index: 0, crc_ok: true }
    }

    pub fn short(index: u8, value: u32) -> Self {
        Self { response: RawResponse::Short(value), index, crc_ok: true }
    }

    pub fn ocr(value: u32) -> Self {
        Self { response: RawResponse::Short(value), index: NO_INDEX, crc_ok: false }
    }

    pub fn long(words: [u32; 4]) -> Self {
        Self { response: RawResponse::Long(words), index: NO_INDEX, crc_ok: true }
    }

    pub fn with_crc_error(mut self) -> Self {
        self.crc_ok = false;
        self
    }
}

/// Validated reply, interpreted according to its response shape
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Response {
    None,
    /// R1, R1b
    Status(u32),
    /// R2, CID or CSD
    Register([u32; 4]),
    /// R3
    Ocr(OcrRegister),
    /// R4
    FastIo(u32),
    /// R5
    InterruptRequest(u32),
    /// R6
    PublishedRca(PublishedRca),
    /// R7
    InterfaceCondition(u32),
}

impl Response {
    /// Card status in its full layout, if the shape carries one
    pub fn status_word(&self) -> Option<u32> {
        match self {
            Self::Status(status) => Some(*status),
            Self::PublishedRca(rca) => Some(rca.status()),
            _ => None,
        }
    }
}

/// Check `reply` against what the response shape of `command` promises
pub fn validate(
    command: &CommandDescriptor,
    argument: u32,
    reply: &RawReply,
) -> Result<Response, Error> {
    let shape = command.response_shape;
    let expected = expected_fields(shape);
    let mismatch = Error::ShapeMismatch { opcode: command.opcode, shape };

    let length = match reply.response {
        RawResponse::None => ResponseLength::None,
        RawResponse::Short(_) => ResponseLength::Bits48,
        RawResponse::Long(_) => ResponseLength::Bits136,
    };
    if length != expected.length {
        return Err(mismatch);
    }
    if expected.crc && !reply.crc_ok {
        return Err(TransportError::CommandCrc.into());
    }
    if expected.index_echo && reply.index != command.opcode {
        return Err(mismatch);
    }

    let response = match (shape, reply.response) {
        (ResponseShape::None, _) => Response::None,
        (ResponseShape::R2, RawResponse::Long(words)) => Response::Register(words),
        (ResponseShape::R1, RawResponse::Short(value)) => Response::Status(value),
        (ResponseShape::R1b, RawResponse::Short(value)) => Response::Status(value),
        (ResponseShape::R3, RawResponse::Short(value)) => Response::Ocr(OcrRegister { val: value }),
        (ResponseShape::R4, RawResponse::Short(value)) => Response::FastIo(value),
        (ResponseShape::R5, RawResponse::Short(value)) => Response::InterruptRequest(value),
        (ResponseShape::R6, RawResponse::Short(value)) => {
            Response::PublishedRca(PublishedRca(value))
        }
        (ResponseShape::R7, RawResponse::Short(value)) => {
            // Voltage accepted and check pattern must come back unchanged
            if value.get_bits(0..12) != argument.get_bits(0..12) {
                return Err(mismatch);
            }
            Response::InterfaceCondition(value)
        }
        _ => return Err(mismatch),
    };
    Ok(response)
}
