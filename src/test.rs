use std::collections::VecDeque;

use embedded_error::mci::MciError;
use embedded_hal::blocking::delay::DelayUs;

use crate::bus::Transport;
use crate::command_flags::CardFamily;
use crate::command_responses::{RawReply, Response};
use crate::commands::{CommandDescriptor, CMD12_STOP_TRANSMISSION_WRITE, CMD38_ERASE};
use crate::config::{BusConfig, DataWidth, HwCapabilities, InitPolicy, Presence};
use crate::controller::{Controller, InitState};
use crate::detect::CardDetect;
use crate::error::{Error, TimeoutKind, TransportError};
use crate::registers::card_status::*;
use crate::status::Severity;

const IDLE: u32 = 0;
const IDENT: u32 = 2 << CARD_STATE_SHIFT;
const STBY: u32 = 3 << CARD_STATE_SHIFT;
const TRAN: u32 = 4 << CARD_STATE_SHIFT;
const PRG: u32 = 7 << CARD_STATE_SHIFT;

const CID: [u32; 4] = [0x1501_0053, 0x454D_3332, 0x4701_2345, 0x6789_0100];
/// Spec version 4, TRAN_SPEED 26MHz
const CSD: [u32; 4] = [0xD02F_0032, 0x0F59_03FF, 0xFFFF_FFFF, 0x9640_0000];

/// OCR replies, busy and ready with sector access mode or CCS
const OCR_BUSY: u32 = 0x00FF_8080;
const OCR_READY_SECTOR: u32 = 0xC0FF_8080;

type Reply = Result<RawReply, TransportError>;

/// Plays back replies in order and records everything the controller does
#[derive(Default)]
struct ScriptedTransport {
    replies: VecDeque<(u8, Reply)>,
    busy: VecDeque<Result<(), TransportError>>,
    sent: Vec<(&'static str, u32)>,
    busy_waits: usize,
    configs: Vec<BusConfig>,
}

impl ScriptedTransport {
    fn reply(&mut self, opcode: u8, reply: Reply) -> &mut Self {
        self.replies.push_back((opcode, reply));
        self
    }

    fn r1(&mut self, opcode: u8, status: u32) -> &mut Self {
        self.reply(opcode, Ok(RawReply::short(opcode, status)))
    }

    fn no_reply(&mut self, opcode: u8) -> &mut Self {
        self.reply(opcode, Ok(RawReply::none()))
    }

    fn timeout(&mut self, opcode: u8) -> &mut Self {
        self.reply(opcode, Err(TransportError::CommandTimeout))
    }

    fn busy(&mut self, result: Result<(), TransportError>) -> &mut Self {
        self.busy.push_back(result);
        self
    }

    fn count(&self, name: &str) -> usize {
        self.sent.iter().filter(|(sent, _)| *sent == name).count()
    }

    fn names(&self) -> Vec<&'static str> {
        self.sent.iter().map(|(name, _)| *name).collect()
    }

    fn finished(&self) -> bool {
        self.replies.is_empty()
    }
}

impl Transport for ScriptedTransport {
    fn send_command(
        &mut self,
        command: &CommandDescriptor,
        argument: u32,
    ) -> Result<RawReply, TransportError> {
        self.sent.push((command.name, argument));
        let (opcode, reply) = match self.replies.pop_front() {
            Some(next) => next,
            None => panic!("{} sent after the end of the script", command.name),
        };
        assert_eq!(opcode, command.opcode, "{} sent instead of CMD{}", command.name, opcode);
        reply
    }

    fn wait_busy_clear(&mut self, _timeout_ms: u32) -> Result<(), TransportError> {
        self.busy_waits += 1;
        self.busy.pop_front().unwrap_or(Ok(()))
    }

    fn configure(&mut self, config: &BusConfig) -> Result<(), TransportError> {
        self.configs.push(*config);
        Ok(())
    }
}

#[derive(Default)]
struct NoDelay(usize);

impl DelayUs<u32> for NoDelay {
    fn delay_us(&mut self, _us: u32) {
        self.0 += 1;
    }
}

struct Slot(Presence);

impl CardDetect for Slot {
    fn presence(&mut self) -> Result<Presence, MciError> {
        Ok(self.0)
    }
}

fn controller(retries: u32, hw: HwCapabilities) -> Controller<ScriptedTransport, NoDelay> {
    Controller::new(ScriptedTransport::default(), NoDelay::default(), hw, InitPolicy::new(retries))
}

fn wide_hw() -> HwCapabilities {
    HwCapabilities {
        max_block_count: Some(128),
        max_clock_freq: Some(52_000_000),
        max_data_width: DataWidth::EightBit,
        hs_mode_supported: true,
        ..HwCapabilities::default()
    }
}

/// Plain MMC up to transfer state, three busy CMD1 replies
fn script_mmc(transport: &mut ScriptedTransport) {
    transport.no_reply(0).timeout(8);
    for _ in 0..3 {
        transport.reply(1, Ok(RawReply::ocr(OCR_BUSY)));
    }
    transport
        .reply(1, Ok(RawReply::ocr(OCR_READY_SECTOR)))
        .reply(2, Ok(RawReply::long(CID)))
        .r1(3, READY_FOR_DATA | IDENT)
        .reply(9, Ok(RawReply::long(CSD)))
        .r1(7, READY_FOR_DATA | STBY);
}

/// SD up to select, one busy ACMD41 reply
fn script_sd(transport: &mut ScriptedTransport) {
    transport
        .no_reply(0)
        .r1(8, 0x1AA)
        .r1(55, APP_CMD | IDLE)
        .reply(41, Ok(RawReply::ocr(0x00FF_8000)))
        .r1(55, APP_CMD | IDLE)
        .reply(41, Ok(RawReply::ocr(0xC0FF_8000)))
        .reply(2, Ok(RawReply::long(CID)))
        .r1(3, 0xB368_0500)
        .r1(7, READY_FOR_DATA | STBY);
}

fn ready_mmc(hw: HwCapabilities) -> Controller<ScriptedTransport, NoDelay> {
    let mut controller = controller(3, hw);
    script_mmc(&mut controller.transport);
    controller.transport.r1(16, READY_FOR_DATA | TRAN);
    controller.initialize().unwrap();
    controller
}

fn ready_sd() -> Controller<ScriptedTransport, NoDelay> {
    let mut controller = controller(3, HwCapabilities::default());
    script_sd(&mut controller.transport);
    controller.transport.r1(16, READY_FOR_DATA | TRAN);
    controller.initialize().unwrap();
    controller
}

#[test]
fn test_mmc_end_to_end() {
    let mut controller = controller(3, HwCapabilities::default());
    script_mmc(&mut controller.transport);
    controller.transport.r1(16, READY_FOR_DATA | TRAN);

    let ready = controller.initialize().unwrap();
    assert!(ready.degraded.is_empty());
    assert_eq!(ready.card.family, CardFamily::Mmc);
    assert_eq!(ready.card.rca, 1);
    assert!(ready.card.high_capacity);
    assert_eq!(ready.card.clock, 26_000_000);
    assert_eq!(ready.card.cid.manufacturer_id(), 0x15);
    assert_eq!(ready.card.csd.map(|csd| csd.mmc_csd_spec_version()), Some(4));
    assert_eq!(controller.state(), InitState::TransferReady);
    assert_eq!(controller.card(), Some(&ready.card));

    let transport = &controller.transport;
    assert!(transport.finished());
    assert_eq!(transport.count("CMD1_SEND_OP_COND"), 4);
    assert_eq!(transport.names()[..2], ["CMD0_GO_IDLE_STATE", "CMD8_SEND_IF_COND"]);
    assert_eq!(transport.names()[6..], [
        "CMD2_ALL_SEND_CID_MMC",
        "CMD3_SET_RELATIVE_ADDR",
        "CMD9_SEND_CSD",
        "CMD7_SELECT_CARD",
        "CMD16_SET_BLOCKLEN",
    ]);
    assert_eq!(transport.sent[7], ("CMD3_SET_RELATIVE_ADDR", 0x0001_0000));
    assert_eq!(transport.sent[10], ("CMD16_SET_BLOCKLEN", 512));
    assert_eq!(transport.configs[0], BusConfig::identification());
    let bus = BusConfig { width: DataWidth::OneBit, clock: 26_000_000, high_speed: false };
    assert_eq!(transport.configs[1], bus);
    assert_eq!(controller.delay.0, 3);
}

#[test]
fn test_sd_end_to_end() {
    let mut controller = controller(3, wide_hw());
    script_sd(&mut controller.transport);
    controller
        .transport
        .r1(55, APP_CMD | READY_FOR_DATA | TRAN)
        .r1(6, APP_CMD | READY_FOR_DATA | TRAN)
        .r1(6, READY_FOR_DATA | TRAN)
        .r1(16, READY_FOR_DATA | TRAN);

    let ready = controller.initialize().unwrap();
    assert!(ready.degraded.is_empty());
    assert_eq!(ready.card.family, CardFamily::Sd);
    assert_eq!(ready.card.rca, 0xB368);
    assert!(ready.card.high_capacity);
    assert!(ready.card.csd.is_none());
    assert_eq!(ready.card.bus_width, DataWidth::FourBit);
    assert!(ready.card.high_speed);
    assert_eq!(ready.card.clock, 50_000_000);

    let transport = &controller.transport;
    assert!(transport.finished());
    assert_eq!(transport.sent[1], ("CMD8_SEND_IF_COND", 0x1AA));
    assert_eq!(transport.sent[3], ("ACMD41_SD_SEND_OP_COND", 0x401F_8000));
    assert_eq!(transport.sent[7], ("CMD3_SEND_RELATIVE_ADDR", 0));
    assert_eq!(transport.sent[8], ("CMD7_SELECT_CARD", 0xB368_0000));
    assert_eq!(transport.sent[9], ("CMD55_APP_CMD", 0xB368_0000));
    assert_eq!(transport.sent[10], ("ACMD6_SET_BUS_WIDTH", 2));
    assert_eq!(transport.sent[11], ("CMD6_SWITCH_FUNC", 0x80FF_FFF1));
    let bus = BusConfig { width: DataWidth::FourBit, clock: 50_000_000, high_speed: true };
    assert_eq!(transport.configs.last(), Some(&bus));
}

#[test]
fn test_op_cond_attempts() {
    for retries in 0..4 {
        let mut controller = controller(retries, HwCapabilities::default());
        controller.transport.no_reply(0).timeout(8);
        for _ in 0..=retries {
            controller.transport.reply(1, Ok(RawReply::ocr(OCR_BUSY)));
        }
        let error = controller.initialize().unwrap_err();
        assert_eq!(error.state, InitState::SendOpCond);
        assert!(matches!(error.cause, Error::Timeout(TimeoutKind::OpCond)));
        assert_eq!(controller.transport.count("CMD1_SEND_OP_COND"), retries as usize + 1);
        assert_eq!(controller.state(), InitState::Failed);
        assert!(controller.card().is_none());
    }
}

#[test]
fn test_transient_faults_consume_attempts() {
    let mut controller = controller(2, HwCapabilities::default());
    controller
        .transport
        .no_reply(0)
        .r1(8, 0x1AA)
        .timeout(55)
        .r1(55, IDLE)
        .r1(55, APP_CMD | IDLE)
        .reply(41, Err(TransportError::CommandCrc));
    let error = controller.initialize().unwrap_err();
    assert!(matches!(error.cause, Error::Timeout(TimeoutKind::OpCond)));
    assert_eq!(controller.transport.count("CMD55_APP_CMD"), 3);
    assert_eq!(controller.transport.count("ACMD41_SD_SEND_OP_COND"), 1);
}

#[test]
fn test_fatal_status_is_not_retried() {
    let mut controller = controller(3, HwCapabilities::default());
    controller
        .transport
        .no_reply(0)
        .timeout(8)
        .reply(1, Ok(RawReply::ocr(OCR_READY_SECTOR)))
        .reply(2, Ok(RawReply::long(CID)))
        .r1(3, READY_FOR_DATA | IDENT)
        .reply(9, Ok(RawReply::long(CSD)))
        .r1(7, ADDRESS_ERROR | STBY);
    let error = controller.initialize().unwrap_err();
    assert_eq!(error.state, InitState::Standby);
    match error.cause {
        Error::Card { severity: Severity::Fatal, status } => {
            assert_eq!(status.fatal_bits(), ADDRESS_ERROR)
        }
        cause => panic!("unexpected {:?}", cause),
    }
    assert_eq!(controller.transport.count("CMD7_SELECT_CARD"), 1);
    assert!(controller.transport.finished());
}

#[test]
fn test_illegal_command_terminates() {
    let mut controller = controller(5, HwCapabilities::default());
    controller
        .transport
        .no_reply(0)
        .r1(8, 0x1AA)
        .r1(55, APP_CMD)
        .reply(41, Ok(RawReply::ocr(0x80FF_8000)))
        .reply(2, Ok(RawReply::long(CID)))
        .r1(3, 0x1234_4500);
    let error = controller.initialize().unwrap_err();
    assert_eq!(error.state, InitState::AddressAssignment);
    assert!(error.cause.is_fatal());
    match &error.cause {
        Error::Card { status, .. } => assert_ne!(status.raw() & ILLEGAL_COMMAND, 0),
        cause => panic!("unexpected {:?}", cause),
    }
    assert_eq!(controller.transport.count("CMD3_SEND_RELATIVE_ADDR"), 1);
    assert!(matches!(MciError::from(error), MciError::UnusableCard));
}

#[test]
fn test_if_cond_mismatch_selects_mmc() {
    let mut controller = controller(0, HwCapabilities::default());
    controller.transport.no_reply(0).r1(8, 0x155).reply(1, Ok(RawReply::ocr(0x80FF_8080)));
    controller.transport.reply(2, Ok(RawReply::long(CID))).r1(3, READY_FOR_DATA | IDENT);
    // CSD spec version 1, no negotiation
    controller.transport.reply(9, Ok(RawReply::long([0x8426_0032, 0, 0, 0])));
    controller.transport.r1(7, READY_FOR_DATA | STBY).r1(16, READY_FOR_DATA | TRAN);
    let ready = controller.initialize().unwrap();
    assert_eq!(ready.card.family, CardFamily::Mmc);
    assert!(!ready.card.high_capacity);
}

#[test]
fn test_sd_rca_zero_is_asked_again() {
    let mut controller = controller(1, HwCapabilities::default());
    controller
        .transport
        .no_reply(0)
        .r1(8, 0x1AA)
        .r1(55, APP_CMD)
        .reply(41, Ok(RawReply::ocr(0x80FF_8000)))
        .reply(2, Ok(RawReply::long(CID)))
        .r1(3, 0x0000_0500)
        .r1(3, 0x0007_0500)
        .r1(7, READY_FOR_DATA | STBY)
        .r1(16, READY_FOR_DATA | TRAN);
    let ready = controller.initialize().unwrap();
    assert_eq!(ready.card.rca, 7);
    assert!(!ready.card.high_capacity);
}

#[test]
fn test_sd_address_shares_one_budget() {
    let mut controller = controller(1, HwCapabilities::default());
    controller
        .transport
        .no_reply(0)
        .r1(8, 0x1AA)
        .r1(55, APP_CMD)
        .reply(41, Ok(RawReply::ocr(0x80FF_8000)))
        .reply(2, Ok(RawReply::long(CID)))
        .timeout(3)
        .r1(3, 0x0000_0500)
        .timeout(3)
        .r1(3, 0x0000_0500);
    let error = controller.initialize().unwrap_err();
    assert_eq!(error.state, InitState::AddressAssignment);
    assert!(matches!(error.cause, Error::Timeout(TimeoutKind::Command)));
    assert_eq!(controller.transport.count("CMD3_SEND_RELATIVE_ADDR"), 2);
}

#[test]
fn test_mmc_address_needs_ready_for_data() {
    let mut controller = controller(1, HwCapabilities::default());
    controller
        .transport
        .no_reply(0)
        .timeout(8)
        .reply(1, Ok(RawReply::ocr(OCR_READY_SECTOR)))
        .reply(2, Ok(RawReply::long(CID)))
        .r1(3, IDENT);
    let error = controller.initialize().unwrap_err();
    assert_eq!(error.state, InitState::AddressAssignment);
    assert!(matches!(error.cause, Error::UnexpectedState(CardState::Identification)));
}

#[test]
fn test_mmc_negotiation() {
    let mut controller = controller(3, wide_hw());
    script_mmc(&mut controller.transport);
    controller
        .transport
        .r1(6, READY_FOR_DATA | TRAN)
        .r1(13, READY_FOR_DATA | TRAN)
        .r1(6, READY_FOR_DATA | TRAN)
        .r1(13, READY_FOR_DATA | TRAN)
        .r1(16, READY_FOR_DATA | TRAN);
    let ready = controller.initialize().unwrap();
    assert!(ready.degraded.is_empty());
    assert_eq!(ready.card.bus_width, DataWidth::EightBit);
    assert!(ready.card.high_speed);
    assert_eq!(ready.card.clock, 52_000_000);
    let transport = &controller.transport;
    assert_eq!(transport.sent[10], ("CMD6_SWITCH", 0x03B7_0200));
    assert_eq!(transport.sent[11], ("CMD13_SEND_STATUS", 0x0001_0000));
    assert_eq!(transport.sent[12], ("CMD6_SWITCH", 0x03B9_0100));
    assert_eq!(transport.busy_waits, 2);
}

#[test]
fn test_mmc_switch_error_degrades() {
    let hw = HwCapabilities { max_clock_freq: Some(20_000_000), ..wide_hw() };
    let mut controller = controller(3, hw);
    script_mmc(&mut controller.transport);
    controller
        .transport
        .r1(6, READY_FOR_DATA | TRAN)
        .r1(13, READY_FOR_DATA | TRAN)
        .r1(6, READY_FOR_DATA | TRAN)
        .r1(13, SWITCH_ERROR | READY_FOR_DATA | TRAN)
        .r1(16, READY_FOR_DATA | TRAN);
    let ready = controller.initialize().unwrap();
    assert!(ready.degraded.bus_width.is_none());
    match ready.degraded.high_speed {
        Some(Error::Card { severity: Severity::Advisory, status }) => {
            assert!(status.register().switch_error())
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(ready.card.bus_width, DataWidth::EightBit);
    assert!(!ready.card.high_speed);
    // Capped by the controller
    assert_eq!(ready.card.clock, 20_000_000);
    assert_eq!(controller.transport.count("CMD13_SEND_STATUS"), 2);
}

#[test]
fn test_sd_negotiation_degrades() {
    let mut controller = controller(1, wide_hw());
    script_sd(&mut controller.transport);
    controller
        .transport
        .timeout(55)
        .timeout(55)
        .r1(6, SWITCH_ERROR | READY_FOR_DATA | TRAN)
        .r1(16, READY_FOR_DATA | TRAN);
    let ready = controller.initialize().unwrap();
    assert!(matches!(ready.degraded.bus_width, Some(Error::Timeout(TimeoutKind::Command))));
    assert!(ready.degraded.high_speed.is_some());
    assert_eq!(ready.card.bus_width, DataWidth::OneBit);
    assert!(!ready.card.high_speed);
    let bus = BusConfig { width: DataWidth::OneBit, clock: 25_000_000, high_speed: false };
    assert_eq!(controller.transport.configs.last(), Some(&bus));
    assert_eq!(controller.state(), InitState::TransferReady);
}

#[test]
fn test_set_blocklen_failure_is_terminal() {
    let mut controller = controller(3, HwCapabilities::default());
    script_mmc(&mut controller.transport);
    controller.transport.r1(16, BLOCK_LEN_ERROR | TRAN);
    let error = controller.initialize().unwrap_err();
    assert_eq!(error.state, InitState::Standby);
    assert!(error.cause.is_fatal());
}

#[test]
fn test_card_absent() {
    let hw = HwCapabilities { card_removable: true, ..HwCapabilities::default() };
    let mut controller = controller(3, hw).with_card_detect(Slot(Presence::CardIsOut));
    let error = controller.initialize().unwrap_err();
    assert_eq!(error.state, InitState::PowerUp);
    assert!(matches!(error.cause, Error::NoCard));
    assert!(controller.transport.sent.is_empty());
    assert!(matches!(MciError::from(error), MciError::NoCard));
}

#[test]
fn test_card_present() {
    let hw = HwCapabilities { card_removable: true, ..HwCapabilities::default() };
    let mut controller = controller(3, hw).with_card_detect(Slot(Presence::CardIsIn));
    script_mmc(&mut controller.transport);
    controller.transport.r1(16, READY_FOR_DATA | TRAN);
    assert!(controller.initialize().is_ok());
}

#[test]
fn test_issue_before_transfer_ready() {
    let mut controller = controller(3, HwCapabilities::default());
    assert!(matches!(controller.issue(13, CardFamily::Mmc, false, 0), Err(Error::NotReady)));
    assert!(controller.transport.sent.is_empty());
}

#[test]
fn test_issue_app_command() {
    let mut controller = ready_sd();
    controller.transport.r1(55, APP_CMD | READY_FOR_DATA | TRAN).r1(13, READY_FOR_DATA | TRAN);
    let completion = controller.issue(13, CardFamily::Sd, true, 0).unwrap();
    assert_eq!(completion.status.map(|status| status.state()), Some(CardState::Transfer));
    let sent = &controller.transport.sent;
    assert_eq!(sent[sent.len() - 2], ("CMD55_APP_CMD", 0xB368_0000));
    assert_eq!(sent[sent.len() - 1], ("ACMD13_SD_STATUS", 0));
}

#[test]
fn test_issue_app_command_rejected() {
    let mut controller = ready_sd();
    controller.transport.r1(55, READY_FOR_DATA | TRAN);
    controller.transport.r1(55, READY_FOR_DATA | TRAN);
    controller.transport.r1(55, READY_FOR_DATA | TRAN);
    controller.transport.r1(55, READY_FOR_DATA | TRAN);
    let result = controller.issue(51, CardFamily::Sd, true, 0);
    assert!(matches!(result, Err(Error::AppCommandRejected)));
    assert_eq!(controller.transport.count("ACMD51_SEND_SCR"), 0);
}

#[test]
fn test_issue_checks_family() {
    let mut controller = ready_sd();
    let result = controller.issue(1, CardFamily::Mmc, false, 0);
    assert!(matches!(
        result,
        Err(Error::Mismatch { expected: CardFamily::Sd, actual: CardFamily::Mmc })
    ));
    let result = controller.issue(21, CardFamily::Sd, false, 0);
    assert!(matches!(result, Err(Error::UnknownCommand { opcode: 21, .. })));
}

#[test]
fn test_issue_block_count() {
    let hw = HwCapabilities { max_block_count: Some(128), ..HwCapabilities::default() };
    let mut controller = ready_mmc(hw);
    let result = controller.issue(23, CardFamily::Mmc, false, 256);
    assert!(matches!(result, Err(Error::BlockCountExceeded { requested: 256, max: 128 })));
    controller.transport.r1(23, READY_FOR_DATA | TRAN);
    assert!(controller.issue(23, CardFamily::Mmc, false, 128).is_ok());
}

#[test]
fn test_issue_advisory_status() {
    let mut controller = ready_mmc(HwCapabilities::default());
    controller.transport.r1(13, ERASE_RESET | TRAN);
    let completion = controller.issue(13, CardFamily::Mmc, false, 0x1_0000).unwrap();
    assert_eq!(completion.status.and_then(|status| status.severity()), Some(Severity::Advisory));
    assert_eq!(completion.status.map(|status| status.advisory_bits()), Some(ERASE_RESET));
    assert_eq!(controller.transport.count("CMD13_SEND_STATUS"), 1);
    assert!(controller.transport.finished());
}

#[test]
fn test_partial_erase_is_not_repeated() {
    let mut controller = ready_mmc(HwCapabilities::default());
    let waits = controller.transport.busy_waits;
    controller
        .transport
        .r1(38, WP_ERASE_SKIP | READY_FOR_DATA | TRAN)
        .r1(38, ERASE_SEQ_ERROR | TRAN);
    let completion = controller.issue(38, CardFamily::Mmc, false, 0).unwrap();
    assert_eq!(completion.status.map(|status| status.advisory_bits()), Some(WP_ERASE_SKIP));
    assert_eq!(controller.transport.count("CMD38_ERASE"), 1);
    assert_eq!(controller.transport.busy_waits, waits + 1);
}

#[test]
fn test_issue_masked() {
    let mut controller = ready_mmc(HwCapabilities::default());
    controller.transport.r1(13, OUT_OF_RANGE | TRAN);
    let completion = controller.issue_masked(13, CardFamily::Mmc, false, 0, OUT_OF_RANGE);
    let status = completion.unwrap().status.map(|status| status.raw());
    assert_eq!(status.map(|raw| raw & OUT_OF_RANGE), Some(OUT_OF_RANGE));
    controller.transport.r1(13, OUT_OF_RANGE | TRAN);
    assert!(controller.issue(13, CardFamily::Mmc, false, 0).unwrap_err().is_fatal());
}

#[test]
fn test_issue_retries_crc() {
    let mut controller = ready_mmc(HwCapabilities::default());
    controller
        .transport
        .reply(10, Ok(RawReply::long(CID).with_crc_error()))
        .reply(10, Ok(RawReply::long(CID)));
    let completion = controller.issue(10, CardFamily::Mmc, false, 0x1_0000).unwrap();
    assert_eq!(completion.response, Response::Register(CID));
}

#[test]
fn test_r1b_waits_for_busy() {
    let mut controller = ready_mmc(HwCapabilities::default());
    let waits = controller.transport.busy_waits;
    controller.transport.r1(12, READY_FOR_DATA | PRG).busy(Err(TransportError::BusyTimeout));
    assert!(controller.issue_descriptor(&CMD12_STOP_TRANSMISSION_WRITE, 0, 0).is_ok());
    assert_eq!(controller.transport.busy_waits, waits + 2);
    assert_eq!(controller.transport.count("CMD12_STOP_TRANSMISSION_WRITE"), 1);
}

#[test]
fn test_r1b_unresolved_busy_fails() {
    let mut controller = ready_mmc(HwCapabilities::default());
    controller.transport.r1(38, READY_FOR_DATA | PRG);
    for _ in 0..4 {
        controller.transport.busy(Err(TransportError::BusyTimeout));
    }
    let result = controller.issue_descriptor(&CMD38_ERASE, 0, 0);
    assert!(matches!(result, Err(Error::Timeout(TimeoutKind::Busy))));
    assert_eq!(controller.transport.count("CMD38_ERASE"), 1);
}

#[test]
fn test_r1b_fatal_status_skips_busy() {
    let mut controller = ready_mmc(HwCapabilities::default());
    let waits = controller.transport.busy_waits;
    controller.transport.r1(38, ERASE_SEQ_ERROR | TRAN);
    let result = controller.issue_descriptor(&CMD38_ERASE, 0, 0);
    assert!(result.unwrap_err().is_fatal());
    assert_eq!(controller.transport.busy_waits, waits);
}
