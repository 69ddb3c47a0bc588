use bit_field::BitField;

/// MMC access mode, OCR bits 30..29
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessMode {
    Byte = 0b00,
    Sector = 0b10,
}

/// Operation conditions register, carried by R3
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OcrRegister {
    pub val: u32,
}

impl OcrRegister {
    pub fn set_vdd_27_28(&mut self, value: bool) -> &mut Self {
        self.val.set_bit(15, value);
        self
    }

    pub fn set_vdd_28_29(&mut self, value: bool) -> &mut Self {
        self.val.set_bit(16, value);
        self
    }

    pub fn set_vdd_29_30(&mut self, value: bool) -> &mut Self {
        self.val.set_bit(17, value);
        self
    }

    pub fn set_vdd_30_31(&mut self, value: bool) -> &mut Self {
        self.val.set_bit(18, value);
        self
    }

    pub fn set_vdd_31_32(&mut self, value: bool) -> &mut Self {
        self.val.set_bit(19, value);
        self
    }

    pub fn set_vdd_32_33(&mut self, value: bool) -> &mut Self {
        self.val.set_bit(20, value);
        self
    }

    /// HCS on ACMD41, CCS in the reply
    pub fn set_high_capacity(&mut self, value: bool) -> &mut Self {
        self.val.set_bit(30, value);
        self
    }

    pub fn card_capacity_status(&self) -> bool {
        self.val.get_bit(30)
    }

    pub fn set_access_mode(&mut self, mode: AccessMode) -> &mut Self {
        self.val.set_bits(29..31, mode as u32);
        self
    }

    pub fn access_mode(&self) -> AccessMode {
        match self.val.get_bits(29..31) {
            0b10 => AccessMode::Sector,
            _ => AccessMode::Byte,
        }
    }

    /// Power up routine finished, the busy bit is active low
    pub fn card_powered_up_status(&self) -> bool {
        self.val.get_bit(31)
    }
}

/// Voltage window offered by the host, 2.7-3.3V
pub fn ocr_voltage_support() -> OcrRegister {
    let mut ocr = OcrRegister { val: 0 };
    ocr.set_vdd_27_28(true)
        .set_vdd_28_29(true)
        .set_vdd_29_30(true)
        .set_vdd_30_31(true)
        .set_vdd_31_32(true)
        .set_vdd_32_33(true);
    ocr
}
