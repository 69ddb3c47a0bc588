use bit_field::BitField;

pub const IF_COND_CHECK_PATTERN: u8 = 0xAA;

/// CMD8 SEND_IF_COND argument
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Cmd8 {
    pub val: u32,
}

impl Cmd8 {
    pub fn set_check_pattern(&mut self, pattern: u8) -> &mut Self {
        self.val.set_bits(0..8, pattern as u32);
        self
    }

    /// Host supplies 2.7-3.6V
    pub fn set_high_voltage(&mut self, high: bool) -> &mut Self {
        self.val.set_bit(8, high);
        self
    }

    pub fn standard() -> Self {
        let mut arg = Self::default();
        arg.set_check_pattern(IF_COND_CHECK_PATTERN).set_high_voltage(true);
        arg
    }
}

/// SWITCH_FUNC function groups, numbered as in the argument nibbles
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionGroup {
    AccessMode = 1,
    CommandSystem = 2,
    DriverStrength = 3,
    PowerLimit = 4,
    Group5 = 5,
    Group6 = 6,
}

pub const FUNCTION_GROUPS: [FunctionGroup; 6] = [
    FunctionGroup::AccessMode,
    FunctionGroup::CommandSystem,
    FunctionGroup::DriverStrength,
    FunctionGroup::PowerLimit,
    FunctionGroup::Group5,
    FunctionGroup::Group6,
];

/// Keep the current function of a group
pub const FUNCTION_UNCHANGED: u8 = 0xF;
pub const ACCESS_MODE_HIGH_SPEED: u8 = 1;

/// CMD6 SWITCH_FUNC argument
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Cmd6 {
    pub val: u32,
}

impl Cmd6 {
    pub fn set_function(&mut self, group: FunctionGroup, function: u8) -> &mut Self {
        let offset = (group as usize - 1) * 4;
        self.val.set_bits(offset..offset + 4, (function & 0xF) as u32);
        self
    }

    /// Switch rather than check
    pub fn set_switch(&mut self, switch: bool) -> &mut Self {
        self.val.set_bit(31, switch);
        self
    }

    /// Switch access mode to high speed, every other group unchanged
    pub fn high_speed() -> Self {
        let mut arg = Self::default();
        for &group in FUNCTION_GROUPS.iter() {
            arg.set_function(group, FUNCTION_UNCHANGED);
        }
        arg.set_function(FunctionGroup::AccessMode, ACCESS_MODE_HIGH_SPEED).set_switch(true);
        arg
    }
}

/// ACMD6 argument selecting a 4-bit bus
pub const BUS_WIDTH_4BIT: u32 = 0b10;
