use bit_field::BitField;

use crate::config::DataWidth;

/// How CMD6 modifies the addressed EXT_CSD byte
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    /// The command set is changed according to the Cmd Set field
    CommandSet = 0,
    /// Bits set in Value are set in the addressed byte
    SetBits = 1,
    /// Bits set in Value are cleared in the addressed byte
    ClearBits = 2,
    /// Value is written into the addressed byte
    WriteByte = 3,
}

/// EXT_CSD byte offsets used during initialization
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModeIndex {
    BusWidth = 183,
    HsTiming = 185,
}

/// EXT_CSD BUS_WIDTH value for `width`
pub fn bus_width_value(width: DataWidth) -> u8 {
    match width {
        DataWidth::OneBit => 0,
        DataWidth::FourBit => 1,
        DataWidth::EightBit => 2,
    }
}

/// CMD6 SWITCH argument
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Cmd6 {
    pub val: u32,
}

impl Cmd6 {
    pub fn set_cmd_set(&mut self, cmd_set: u8) -> &mut Self {
        self.val.set_bits(0..3, cmd_set as u32);
        self
    }

    pub fn set_value(&mut self, value: u8) -> &mut Self {
        self.val.set_bits(8..16, value as u32);
        self
    }

    pub fn set_mode_index(&mut self, index: ModeIndex) -> &mut Self {
        self.val.set_bits(16..24, index as u32);
        self
    }

    pub fn set_access(&mut self, access: Access) -> &mut Self {
        self.val.set_bits(24..26, access as u32);
        self
    }

    pub fn set_bus_width(&mut self, width: DataWidth) -> &mut Self {
        self.set_access(Access::WriteByte)
            .set_mode_index(ModeIndex::BusWidth)
            .set_value(bus_width_value(width))
    }

    pub fn set_high_speed(&mut self) -> &mut Self {
        self.set_access(Access::WriteByte).set_mode_index(ModeIndex::HsTiming).set_value(1)
    }
}
