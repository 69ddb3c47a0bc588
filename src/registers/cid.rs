use bit_field::BitField;

/// Card identification, `0[0]` holds bits 127..96
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CidRegister(pub [u32; 4]);

impl CidRegister {
    pub fn manufacturer_id(&self) -> u8 {
        self.0[0].get_bits(24..32) as u8
    }

    pub fn serial_number(&self) -> u32 {
        // PSN sits at bits 47..16 for both SD and MMC
        (self.0[2].get_bits(0..16) << 16) | self.0[3].get_bits(16..32)
    }
}
