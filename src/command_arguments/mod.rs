pub mod mmc;
pub mod sd;

/// Argument of addressed commands carrying the relative card address in bits 31..16
pub fn rca_argument(rca: u16) -> u32 {
    (rca as u32) << 16
}
