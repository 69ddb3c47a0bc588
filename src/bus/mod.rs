use crate::command_responses::RawReply;
use crate::commands::CommandDescriptor;
use crate::config::BusConfig;
use crate::error::TransportError;

pub const SD_MMC_BLOCK_SIZE: usize = 512;

/// Host controller driver the protocol core talks through
///
/// Implementations own clocking, voltage, DMA and the data phase of addressed data
/// transfer commands. Every call blocks until the controller is done.
pub trait Transport {
    /// Send `command` with `argument` and return its reply.
    ///
    /// For commands without response `RawReply::none()` is expected. A CRC failure on the
    /// reply is reported through `RawReply::crc_ok` rather than as an error.
    fn send_command(
        &mut self,
        command: &CommandDescriptor,
        argument: u32,
    ) -> Result<RawReply, TransportError>;

    /// Wait until the card releases DAT0, at most `timeout_ms`
    fn wait_busy_clear(&mut self, timeout_ms: u32) -> Result<(), TransportError>;

    /// Apply bus width and clock
    fn configure(&mut self, config: &BusConfig) -> Result<(), TransportError>;
}
