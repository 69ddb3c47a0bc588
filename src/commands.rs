use core::convert::TryFrom;

use bit_field::BitField;

use crate::command_flags::{CardFamily, CommandClass, APP_COMMAND_FLAG};
use crate::command_responses::ResponseShape;
use crate::error::Error;

pub const COMMAND_INDEX_MASK: u32 = 0x3F;

/// One logical command variant
///
/// The same index may appear several times with a different family, response shape or
/// application flag, so the index alone never identifies a command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub opcode: u8,
    pub response_shape: ResponseShape,
    pub command_class: CommandClass,
    pub card_family: CardFamily,
    pub is_app_command: bool,
}

const fn cmd(
    name: &'static str,
    opcode: u8,
    response_shape: ResponseShape,
    command_class: CommandClass,
    card_family: CardFamily,
) -> CommandDescriptor {
    CommandDescriptor {
        name,
        opcode,
        response_shape,
        command_class,
        card_family,
        is_app_command: false,
    }
}

const fn acmd(
    name: &'static str,
    opcode: u8,
    response_shape: ResponseShape,
    command_class: CommandClass,
) -> CommandDescriptor {
    CommandDescriptor {
        name,
        opcode,
        response_shape,
        command_class,
        card_family: CardFamily::Sd,
        is_app_command: true,
    }
}

use CardFamily::{Common, Mmc, Sd};
use CommandClass::{
    AddressedDataRead as AdtcRead, AddressedDataWrite as AdtcWrite, AddressedNoData as Ac,
    Broadcast as Bc, BroadcastWithResponse as Bcr,
};
use ResponseShape::{R1b, R1, R2, R3, R4, R5, R6, R7};

const NONE: ResponseShape = ResponseShape::None;

// class 0 and class 1
pub const CMD0_GO_IDLE_STATE: CommandDescriptor = cmd("CMD0_GO_IDLE_STATE", 0, NONE, Bc, Common);
pub const CMD1_SEND_OP_COND: CommandDescriptor = cmd("CMD1_SEND_OP_COND", 1, R3, Bcr, Mmc);
pub const CMD2_ALL_SEND_CID_MMC: CommandDescriptor = cmd("CMD2_ALL_SEND_CID_MMC", 2, R2, Bcr, Mmc);
pub const CMD2_ALL_SEND_CID_SD: CommandDescriptor = cmd("CMD2_ALL_SEND_CID_SD", 2, R2, Bcr, Sd);
pub const CMD3_SET_RELATIVE_ADDR: CommandDescriptor =
    cmd("CMD3_SET_RELATIVE_ADDR", 3, R1, Ac, Mmc);
pub const CMD3_SEND_RELATIVE_ADDR: CommandDescriptor =
    cmd("CMD3_SEND_RELATIVE_ADDR", 3, R6, Ac, Sd);
pub const CMD4_SET_DSR: CommandDescriptor = cmd("CMD4_SET_DSR", 4, NONE, Bc, Common);
pub const CMD5_SLEEP_AWAKE: CommandDescriptor = cmd("CMD5_SLEEP_AWAKE", 5, R1b, Ac, Mmc);
pub const CMD6_SWITCH: CommandDescriptor = cmd("CMD6_SWITCH", 6, R1b, Ac, Mmc);
pub const CMD6_SWITCH_FUNC: CommandDescriptor = cmd("CMD6_SWITCH_FUNC", 6, R1, Ac, Sd);
pub const ACMD6_SET_BUS_WIDTH: CommandDescriptor = acmd("ACMD6_SET_BUS_WIDTH", 6, R1, Ac);
pub const CMD7_SELECT_CARD: CommandDescriptor = cmd("CMD7_SELECT_CARD", 7, R1, Ac, Common);
/// CMD7 from disconnected state to programming state
pub const CMD7_SELECT_CARD_PROG: CommandDescriptor =
    cmd("CMD7_SELECT_CARD_PROG", 7, R1b, Ac, Common);
pub const CMD7_DESELECT_CARD: CommandDescriptor = cmd("CMD7_DESELECT_CARD", 7, R1, Ac, Common);
pub const CMD8_SEND_EXT_CSD: CommandDescriptor = cmd("CMD8_SEND_EXT_CSD", 8, R1, AdtcRead, Mmc);
pub const CMD8_SEND_IF_COND: CommandDescriptor = cmd("CMD8_SEND_IF_COND", 8, R7, Bcr, Sd);
pub const CMD9_SEND_CSD: CommandDescriptor = cmd("CMD9_SEND_CSD", 9, R2, Ac, Common);
pub const CMD10_SEND_CID: CommandDescriptor = cmd("CMD10_SEND_CID", 10, R2, Ac, Common);
pub const CMD11_READ_DAT_UNTIL_STOP: CommandDescriptor =
    cmd("CMD11_READ_DAT_UNTIL_STOP", 11, R1, AdtcRead, Sd);
pub const CMD12_STOP_TRANSMISSION: CommandDescriptor =
    cmd("CMD12_STOP_TRANSMISSION", 12, R1, Ac, Common);
/// CMD12 after a write, the card signals busy while programming
pub const CMD12_STOP_TRANSMISSION_WRITE: CommandDescriptor =
    cmd("CMD12_STOP_TRANSMISSION_WRITE", 12, R1b, Ac, Common);
pub const CMD13_SEND_STATUS: CommandDescriptor = cmd("CMD13_SEND_STATUS", 13, R1, Ac, Common);
pub const ACMD13_SD_STATUS: CommandDescriptor = acmd("ACMD13_SD_STATUS", 13, R1, AdtcRead);
pub const CMD14_BUSTEST_R: CommandDescriptor = cmd("CMD14_BUSTEST_R", 14, R1, AdtcRead, Mmc);
pub const CMD15_GO_INACTIVE_STATE: CommandDescriptor =
    cmd("CMD15_GO_INACTIVE_STATE", 15, NONE, Ac, Common);

// class 2
pub const CMD16_SET_BLOCKLEN: CommandDescriptor = cmd("CMD16_SET_BLOCKLEN", 16, R1, Ac, Common);
pub const CMD17_READ_SINGLE_BLOCK: CommandDescriptor =
    cmd("CMD17_READ_SINGLE_BLOCK", 17, R1, AdtcRead, Common);
pub const CMD18_READ_MULTIPLE_BLOCK: CommandDescriptor =
    cmd("CMD18_READ_MULTIPLE_BLOCK", 18, R1, AdtcRead, Common);
pub const CMD19_BUS_TEST_W: CommandDescriptor = cmd("CMD19_BUS_TEST_W", 19, R1, AdtcWrite, Mmc);

// class 3
pub const CMD20_WRITE_DAT_UNTIL_STOP: CommandDescriptor =
    cmd("CMD20_WRITE_DAT_UNTIL_STOP", 20, R1, AdtcWrite, Mmc);
pub const ACMD22_SEND_NUM_WR_BLOCKS: CommandDescriptor =
    acmd("ACMD22_SEND_NUM_WR_BLOCKS", 22, R1, Ac);

// class 4
pub const CMD23_SET_BLOCK_COUNT: CommandDescriptor =
    cmd("CMD23_SET_BLOCK_COUNT", 23, R1, Ac, Mmc);
pub const ACMD23_SET_WR_BLK_ERASE_COUNT: CommandDescriptor =
    acmd("ACMD23_SET_WR_BLK_ERASE_COUNT", 23, R1, Ac);
pub const CMD24_WRITE_BLOCK: CommandDescriptor =
    cmd("CMD24_WRITE_BLOCK", 24, R1, AdtcWrite, Common);
pub const CMD25_WRITE_MULTIPLE_BLOCK: CommandDescriptor =
    cmd("CMD25_WRITE_MULTIPLE_BLOCK", 25, R1, AdtcWrite, Common);
pub const CMD26_PROGRAM_CID: CommandDescriptor = cmd("CMD26_PROGRAM_CID", 26, R1, AdtcWrite, Mmc);
pub const CMD27_PROGRAM_CSD: CommandDescriptor =
    cmd("CMD27_PROGRAM_CSD", 27, R1, AdtcWrite, Common);

// class 6
pub const CMD28_SET_WRITE_PROT: CommandDescriptor =
    cmd("CMD28_SET_WRITE_PROT", 28, R1b, Ac, Common);
pub const CMD29_CLR_WRITE_PROT: CommandDescriptor =
    cmd("CMD29_CLR_WRITE_PROT", 29, R1b, Ac, Common);
pub const CMD30_SEND_WRITE_PROT: CommandDescriptor =
    cmd("CMD30_SEND_WRITE_PROT", 30, R1, AdtcRead, Common);
pub const CMD31_SEND_WRITE_PROT_TYPE: CommandDescriptor =
    cmd("CMD31_SEND_WRITE_PROT_TYPE", 31, R1, AdtcRead, Common);

// class 5
pub const CMD32_ERASE_WR_BLK_START: CommandDescriptor =
    cmd("CMD32_ERASE_WR_BLK_START", 32, R1, Ac, Sd);
pub const CMD33_ERASE_WR_BLK_END: CommandDescriptor =
    cmd("CMD33_ERASE_WR_BLK_END", 33, R1, Ac, Sd);
pub const CMD35_ERASE_GROUP_START: CommandDescriptor =
    cmd("CMD35_ERASE_GROUP_START", 35, R1, Ac, Mmc);
pub const CMD36_ERASE_GROUP_END: CommandDescriptor =
    cmd("CMD36_ERASE_GROUP_END", 36, R1, Ac, Mmc);
pub const CMD38_ERASE: CommandDescriptor = cmd("CMD38_ERASE", 38, R1b, Ac, Common);

// class 9
pub const CMD39_FASTIO: CommandDescriptor = cmd("CMD39_FASTIO", 39, R4, Ac, Mmc);
pub const CMD40_GO_IRQSTATE: CommandDescriptor = cmd("CMD40_GO_IRQSTATE", 40, R5, Bcr, Mmc);
pub const ACMD41_SD_SEND_OP_COND: CommandDescriptor =
    acmd("ACMD41_SD_SEND_OP_COND", 41, R3, Bcr);

// class 7
pub const CMD42_LOCK_UNLOCK: CommandDescriptor =
    cmd("CMD42_LOCK_UNLOCK", 42, R1, AdtcWrite, Common);
pub const ACMD42_SET_CLR_CARD_DETECT: CommandDescriptor =
    acmd("ACMD42_SET_CLR_CARD_DETECT", 42, R1, Ac);
pub const ACMD51_SEND_SCR: CommandDescriptor = acmd("ACMD51_SEND_SCR", 51, R1, AdtcRead);

// class 8
pub const CMD55_APP_CMD: CommandDescriptor = cmd("CMD55_APP_CMD", 55, R1, Ac, Common);
pub const CMD56_GEN_CMD: CommandDescriptor = cmd("CMD56_GEN_CMD", 56, R1, AdtcWrite, Common);

/// Every command that can be looked up by (index, family, application flag)
pub static COMMANDS: &[CommandDescriptor] = &[
    CMD0_GO_IDLE_STATE,
    CMD1_SEND_OP_COND,
    CMD2_ALL_SEND_CID_MMC,
    CMD2_ALL_SEND_CID_SD,
    CMD3_SET_RELATIVE_ADDR,
    CMD3_SEND_RELATIVE_ADDR,
    CMD4_SET_DSR,
    CMD5_SLEEP_AWAKE,
    CMD6_SWITCH,
    CMD6_SWITCH_FUNC,
    ACMD6_SET_BUS_WIDTH,
    CMD7_SELECT_CARD,
    CMD8_SEND_EXT_CSD,
    CMD8_SEND_IF_COND,
    CMD9_SEND_CSD,
    CMD10_SEND_CID,
    CMD11_READ_DAT_UNTIL_STOP,
    CMD12_STOP_TRANSMISSION,
    CMD13_SEND_STATUS,
    ACMD13_SD_STATUS,
    CMD14_BUSTEST_R,
    CMD15_GO_INACTIVE_STATE,
    CMD16_SET_BLOCKLEN,
    CMD17_READ_SINGLE_BLOCK,
    CMD18_READ_MULTIPLE_BLOCK,
    CMD19_BUS_TEST_W,
    CMD20_WRITE_DAT_UNTIL_STOP,
    ACMD22_SEND_NUM_WR_BLOCKS,
    CMD23_SET_BLOCK_COUNT,
    ACMD23_SET_WR_BLK_ERASE_COUNT,
    CMD24_WRITE_BLOCK,
    CMD25_WRITE_MULTIPLE_BLOCK,
    CMD26_PROGRAM_CID,
    CMD27_PROGRAM_CSD,
    CMD28_SET_WRITE_PROT,
    CMD29_CLR_WRITE_PROT,
    CMD30_SEND_WRITE_PROT,
    CMD31_SEND_WRITE_PROT_TYPE,
    CMD32_ERASE_WR_BLK_START,
    CMD33_ERASE_WR_BLK_END,
    CMD35_ERASE_GROUP_START,
    CMD36_ERASE_GROUP_END,
    CMD38_ERASE,
    CMD39_FASTIO,
    CMD40_GO_IRQSTATE,
    ACMD41_SD_SEND_OP_COND,
    CMD42_LOCK_UNLOCK,
    ACMD42_SET_CLR_CARD_DETECT,
    ACMD51_SEND_SCR,
    CMD55_APP_CMD,
    CMD56_GEN_CMD,
];

/// Variants that share their lookup key with an entry of [`COMMANDS`] and have to be named
/// directly
pub static VARIANTS: &[CommandDescriptor] =
    &[CMD7_SELECT_CARD_PROG, CMD7_DESELECT_CARD, CMD12_STOP_TRANSMISSION_WRITE];

/// Legacy packed command word: index in 5..0, response shape in 11..8, command class in
/// 14..12, card family in 16..15, application flag in bit 17
impl From<&CommandDescriptor> for u32 {
    fn from(command: &CommandDescriptor) -> u32 {
        let mut word = 0u32;
        word.set_bits(0..6, command.opcode as u32);
        word |= command.response_shape.code();
        word |= command.command_class.code();
        word |= command.card_family.code();
        word.set_bit(17, command.is_app_command);
        word
    }
}

impl From<CommandDescriptor> for u32 {
    fn from(command: CommandDescriptor) -> u32 {
        (&command).into()
    }
}

impl TryFrom<u32> for &'static CommandDescriptor {
    type Error = Error;

    /// Recover the descriptor a packed word was made from. Packings shared by several
    /// variants resolve to the canonical entry.
    fn try_from(word: u32) -> Result<Self, Error> {
        let opcode = word.get_bits(0..6) as u8;
        let family = CardFamily::from_code(word).unwrap_or(CardFamily::Common);
        let app = word & APP_COMMAND_FLAG != 0;
        let unknown = Error::UnknownCommand { opcode, family, app };
        if word & !(COMMAND_INDEX_MASK | 0x3_FF00) != 0 {
            return Err(unknown);
        }
        COMMANDS
            .iter()
            .chain(VARIANTS.iter())
            .find(|command| u32::from(*command) == word)
            .ok_or(unknown)
    }
}
