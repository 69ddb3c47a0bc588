use bit_field::BitField;

/// Card specific data, `0[0]` holds bits 127..96
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CsdRegister(pub [u32; 4]);

impl CsdRegister {
    pub fn csd_structure(&self) -> u8 {
        self.0[0].get_bits(30..32) as u8
    }

    /// MMC SPEC_VERS, bits 125..122
    pub fn mmc_csd_spec_version(&self) -> u8 {
        self.0[0].get_bits(26..30) as u8
    }

    /// TRAN_SPEED, bits 103..96
    pub fn transmission_speed(&self) -> u8 {
        self.0[0].get_bits(0..8) as u8
    }
}
