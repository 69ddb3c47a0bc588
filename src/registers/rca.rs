use bit_field::BitField;

/// R6 reply: published relative card address and abbreviated card status
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PublishedRca(pub u32);

impl PublishedRca {
    pub fn address(&self) -> u16 {
        self.0.get_bits(16..32) as u16
    }

    /// Card status in its full layout. Bits 15, 14 and 13 of the reply carry status bits 23, 22
    /// and 19, the low 13 bits are kept in place.
    pub fn status(&self) -> u32 {
        let mut status = self.0.get_bits(0..13);
        status.set_bit(19, self.0.get_bit(13));
        status.set_bit(22, self.0.get_bit(14));
        status.set_bit(23, self.0.get_bit(15));
        status
    }
}
