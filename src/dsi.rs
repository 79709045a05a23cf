//! MIPI-DSI host and D-PHY
//!
//! [`DsiHost`] owns the DSI register block: it powers up the D-PHY,
//! carries DCS commands to and from the panel over the low-power data
//! lane, and manages ULPS and tearing-effect signalling.
//!
//! ```ignore
//! use bes2003_display_hal::dsi::{DsiConfig, DsiHost, DsiMode};
//!
//! let config = DsiConfig {
//!     mode: DsiMode::Command,
//!     ..Default::default()
//! };
//! let mut dsi = DsiHost::init(config, &mut clock)?;
//! dsi.start();
//! dsi.enable_bus_turn_around(); // must precede read attempts
//!
//! dsi.send_dcs(0x11, &[]); // exit sleep
//! let mut id = [0u8; 3];
//! let n = dsi.read_dcs(0x04, &mut id, &mut clock)?;
//! ```
//!
//! `read_dcs` is the only blocking operation; it busy-polls the RX FIFO
//! with a 1 ms ceiling and must not be called from interrupt context.

use log::{debug, trace, warn};

use crate::regs::dsi::{
    clk_cfg, cmd_hdr, ctrl, data_type, int, phy_ctrl, phy_timing, rx_ctrl, rx_data, video_cfg,
    CLK_CFG, CMD_HDR, CMD_PLD, CTRL, INT_ENA, INT_STATUS, PHY_CTRL, PHY_TIMING0, PHY_TIMING1,
    RX_CTRL, RX_DATA, VIDEO_CFG,
};
use crate::regs::{RegisterBlock, DSI_BASE};
use crate::time::{DelayClock, Hertz};

/// Interrupt line shared by the DSI host and the LCDC.
const DISPLAY_IRQ: u16 = 70;

/// Ceiling on the bus-turnaround read poll.
const RX_TIMEOUT_US: u32 = 1_000;

/// Ceiling on the ULPS entry command-done wait.
const ULPS_TIMEOUT_US: u32 = 1_000;

/// Protocol-mandated T_wakeup after ULPS exit.
const ULPS_WAKEUP_US: u32 = 1_500;

/// PHY regulator settle time after power-up.
const PHY_SETTLE_US: u32 = 100;

/// DSI link operating mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DsiMode {
    /// Continuous pixel stream to a synchronous (dumb) panel.
    Video,
    /// DCS-command-driven smart panel with its own frame memory.
    Command,
}

/// D-PHY silicon generation. Selects the lane-timing profile at `init`;
/// everything else is common to both.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PhyGeneration {
    V1,
    V2,
}

/// DSI host configuration.
#[derive(Clone, Copy, Debug)]
pub struct DsiConfig {
    pub mode: DsiMode,
    /// Active data lanes, 1 or 2.
    pub lanes: u8,
    pub phy_generation: PhyGeneration,
    /// Per-lane bit clock.
    pub bit_clock: Hertz,
    /// Composition pixel clock.
    pub pixel_clock: Hertz,
    /// Active line width in pixels; sizes the video-mode packet.
    pub active_width: u16,
}

impl Default for DsiConfig {
    fn default() -> Self {
        DsiConfig {
            mode: DsiMode::Command,
            lanes: 2,
            phy_generation: PhyGeneration::V1,
            bit_clock: Hertz(480_000_000),
            pixel_clock: Hertz(30_000_000),
            active_width: 480,
        }
    }
}

/// DSI host configuration errors.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Lane count outside the supported set {1, 2}.
    UnsupportedLaneCount,
    /// Bit-clock to pixel-clock ratio outside the divisor range 1..=31.
    PixelClockDivisor,
}

/// DSI RX transport errors.
#[derive(Debug, PartialEq)]
pub enum RxError {
    /// RX error or timeout flag on the link, or the poll bound expired.
    Transport,
    /// The panel answered with an acknowledge-and-error report.
    PanelNack,
    /// Unrecognized response framing.
    Malformed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum UlpsState {
    Entered,
    Exited,
}

/// Snapshot of the DSI interrupt status.
#[derive(Clone, Copy, Debug)]
pub struct DsiStatus(u32);

impl DsiStatus {
    /// Tearing-effect event pending.
    pub fn is_te(&self) -> bool {
        self.0 & int::TE != 0
    }

    /// RX error, RX timeout or bus-turnaround failure pending.
    pub fn is_error(&self) -> bool {
        self.0 & int::ERROR != 0
    }
}

/// Owned handle over the DSI host and PHY.
#[derive(Debug)]
pub struct DsiHost {
    rb: RegisterBlock,
    mode: DsiMode,
    ulps: UlpsState,
}

impl DsiHost {
    /// Validates `config`, brings up the PHY and programs the link at the
    /// fixed peripheral base.
    ///
    /// On a validation failure no register is touched. The caller must
    /// ensure this is the only live handle over the DSI block.
    pub fn init<C: DelayClock>(config: DsiConfig, clock: &mut C) -> Result<Self, ConfigError> {
        Self::init_at(DSI_BASE, config, clock)
    }

    /// As [`init`](Self::init), over an alternate register base for
    /// platforms that remap the AHB window.
    pub fn init_at<C: DelayClock>(
        base: usize,
        config: DsiConfig,
        clock: &mut C,
    ) -> Result<Self, ConfigError> {
        if config.lanes == 0 || config.lanes > 2 {
            return Err(ConfigError::UnsupportedLaneCount);
        }
        let divisor = if config.pixel_clock.0 == 0 {
            0
        } else {
            config.bit_clock.0 / config.pixel_clock.0
        };
        if divisor < 1 || divisor > 31 {
            return Err(ConfigError::PixelClockDivisor);
        }

        let mut host = DsiHost {
            rb: unsafe { RegisterBlock::new(base) },
            mode: config.mode,
            ulps: UlpsState::Exited,
        };

        // PHY power-up: regulators first, then a reset pulse, then the
        // clock lane.
        host.rb.write(PHY_CTRL, phy_ctrl::LDO_ENA | phy_ctrl::BIAS_ENA);
        clock.delay_us(PHY_SETTLE_US);
        host.rb.set_bits(PHY_CTRL, phy_ctrl::RESET);
        clock.delay_us(10);
        host.rb.clear_bits(PHY_CTRL, phy_ctrl::RESET);
        host.rb.set_bits(PHY_CTRL, phy_ctrl::CLK_LANE_ENA);

        let (clk_timing, data_timing) = timing_profile(config.phy_generation);
        host.rb.write(PHY_TIMING0, clk_timing);
        host.rb.write(PHY_TIMING1, data_timing);

        host.rb.write(CLK_CFG, clk_cfg::pixel_div(divisor));

        let mut control = ctrl::lanes(config.lanes as u32) | ctrl::TE_EDGE_SEL;
        if config.mode == DsiMode::Video {
            // Video mode streams continuously; there is no idle window
            // for EOTP or LP escape on the sync regions.
            control |= ctrl::MODE_VIDEO
                | ctrl::EOTP_DISABLE
                | ctrl::HSA_LP_DISABLE
                | ctrl::HBP_LP_DISABLE;
            host.rb
                .write(VIDEO_CFG, video_cfg::pkt_len(config.active_width as u32));
        }
        host.rb.write(CTRL, control);

        debug!(
            "dsi: {:?} {} lane(s) gen {:?} divisor {}",
            config.mode, config.lanes, config.phy_generation, divisor
        );
        Ok(host)
    }

    /// Enables the host; configuration must be complete.
    pub fn start(&mut self) {
        self.rb.set_bits(CTRL, ctrl::ENA);
    }

    /// Allows the panel to drive the bus for read responses. Must be
    /// called before the first [`read_dcs`](Self::read_dcs).
    pub fn enable_bus_turn_around(&mut self) {
        self.rb.set_bits(CTRL, ctrl::BTA_ENA);
    }

    /// Sends a DCS command over the low-power data lane.
    ///
    /// Commands whose payload (command byte plus parameters) fits the
    /// two data bytes of a short packet go out as one; anything longer
    /// is streamed as a long packet through the payload window.
    pub fn send_dcs(&mut self, cmd: u8, params: &[u8]) {
        trace!("dsi: dcs {:#04x} + {} param(s)", cmd, params.len());
        match params.len() {
            0 => self.rb.write(
                CMD_HDR,
                cmd_hdr::data_type(data_type::DCS_SHORT_WRITE) | cmd_hdr::data0(cmd as u32),
            ),
            1 => self.rb.write(
                CMD_HDR,
                cmd_hdr::data_type(data_type::DCS_SHORT_WRITE_PARAM)
                    | cmd_hdr::data0(cmd as u32)
                    | cmd_hdr::data1(params[0] as u32),
            ),
            _ => {
                let mut word = cmd as u32;
                let mut filled = 1;
                for &b in params {
                    word |= (b as u32) << (8 * filled);
                    filled += 1;
                    if filled == 4 {
                        self.rb.write(CMD_PLD, word);
                        word = 0;
                        filled = 0;
                    }
                }
                if filled > 0 {
                    self.rb.write(CMD_PLD, word);
                }
                self.rb.write(
                    CMD_HDR,
                    cmd_hdr::data_type(data_type::DCS_LONG_WRITE)
                        | cmd_hdr::word_count(1 + params.len() as u32),
                );
            }
        }
    }

    /// Reads a DCS register from the panel.
    ///
    /// Issues the read request plus a bus turnaround, then polls the RX
    /// FIFO at microsecond granularity with a 1 ms ceiling. The response
    /// is demultiplexed by its leading data type; a long response whose
    /// reported length exceeds `buf` is clamped, and the surplus FIFO
    /// bytes are drained with a warning rather than failing the read.
    ///
    /// Returns the number of payload bytes copied into `buf`.
    pub fn read_dcs<C: DelayClock>(
        &mut self,
        cmd: u8,
        buf: &mut [u8],
        clock: &mut C,
    ) -> Result<usize, RxError> {
        self.rb.write(
            CMD_HDR,
            cmd_hdr::data_type(data_type::DCS_READ) | cmd_hdr::data0(cmd as u32),
        );
        self.rb.set_bits(RX_CTRL, rx_ctrl::BTA);

        let start = clock.now_us();
        let mut parser = RxParser::new();
        loop {
            let status = self.rb.read(INT_STATUS);
            if status & int::ERROR != 0 {
                self.rb.write(INT_STATUS, status & int::ERROR);
                return Err(RxError::Transport);
            }
            if status & int::RX_NOT_EMPTY != 0 {
                let byte = (self.rb.read(RX_DATA) & rx_data::BYTE_MASK) as u8;
                parser.feed(byte, buf);
                continue;
            }
            if status & int::RX_DONE != 0 {
                self.rb.write(INT_STATUS, int::RX_DONE);
                break;
            }
            if clock.now_us().wrapping_sub(start) >= RX_TIMEOUT_US {
                return Err(RxError::Transport);
            }
            clock.delay_us(1);
        }
        parser.finish(cmd)
    }

    /// Moves the lanes into ultra-low-power state. A second call while
    /// entered is a no-op.
    pub fn enter_ulps<C: DelayClock>(&mut self, clock: &mut C) {
        if self.ulps == UlpsState::Entered {
            return;
        }
        self.rb.set_bits(PHY_CTRL, phy_ctrl::CLK_LANE_LP);
        self.rb
            .set_bits(PHY_CTRL, phy_ctrl::CLK_ULPS_REQ | phy_ctrl::DATA_ULPS_REQ);

        let start = clock.now_us();
        loop {
            if self.rb.read(INT_STATUS) & int::CMD_DONE != 0 {
                self.rb.write(INT_STATUS, int::CMD_DONE);
                break;
            }
            if clock.now_us().wrapping_sub(start) >= ULPS_TIMEOUT_US {
                warn!("dsi: ulps entry command-done wait expired");
                break;
            }
            clock.delay_us(1);
        }
        self.ulps = UlpsState::Entered;
    }

    /// Brings the lanes out of ultra-low-power state and waits the
    /// protocol-mandated T_wakeup before returning. A call while already
    /// exited is a no-op.
    pub fn exit_ulps<C: DelayClock>(&mut self, clock: &mut C) {
        if self.ulps == UlpsState::Exited {
            return;
        }
        self.rb
            .set_bits(PHY_CTRL, phy_ctrl::DATA_ULPS_EXIT | phy_ctrl::CLK_ULPS_EXIT);
        self.rb.clear_bits(
            PHY_CTRL,
            phy_ctrl::CLK_LANE_LP | phy_ctrl::CLK_ULPS_REQ | phy_ctrl::DATA_ULPS_REQ,
        );
        clock.delay_us(ULPS_WAKEUP_US);
        self.rb
            .clear_bits(PHY_CTRL, phy_ctrl::DATA_ULPS_EXIT | phy_ctrl::CLK_ULPS_EXIT);
        self.ulps = UlpsState::Exited;
    }

    /// Unmasks the tearing-effect interrupt. The active edge is selected
    /// once at `init`.
    pub fn enable_te_irq(&mut self) {
        self.rb.set_bits(INT_ENA, int::TE);
    }

    pub fn disable_te_irq(&mut self) {
        self.rb.clear_bits(INT_ENA, int::TE);
    }

    /// Raw interrupt status snapshot.
    pub fn status(&self) -> DsiStatus {
        DsiStatus(self.rb.read(INT_STATUS))
    }

    pub fn clear_te(&mut self) {
        self.rb.write(INT_STATUS, int::TE);
    }

    pub fn clear_error(&mut self) {
        self.rb.write(INT_STATUS, int::ERROR);
    }

    /// Gates the PHY regulators and the clock lane.
    pub fn sleep(&mut self) {
        self.rb.clear_bits(PHY_CTRL, phy_ctrl::CLK_LANE_ENA);
        self.rb
            .clear_bits(PHY_CTRL, phy_ctrl::LDO_ENA | phy_ctrl::BIAS_ENA);
        debug!("dsi: sleep");
    }

    /// Restores power after [`sleep`](Self::sleep), applying the
    /// regulator settle delay before the clock lane restarts.
    pub fn wakeup<C: DelayClock>(&mut self, clock: &mut C) {
        self.rb
            .set_bits(PHY_CTRL, phy_ctrl::LDO_ENA | phy_ctrl::BIAS_ENA);
        clock.delay_us(PHY_SETTLE_US);
        self.rb.set_bits(PHY_CTRL, phy_ctrl::CLK_LANE_ENA);
        debug!("dsi: wakeup");
    }

    /// Pulses the PHY reset. Link configuration is lost; re-run `init`
    /// afterwards.
    pub fn reset<C: DelayClock>(&mut self, clock: &mut C) {
        self.rb.set_bits(PHY_CTRL, phy_ctrl::RESET);
        clock.delay_us(10);
        self.rb.clear_bits(PHY_CTRL, phy_ctrl::RESET);
    }

    /// Interrupt line for the display subsystem.
    pub const fn irq_number(&self) -> u16 {
        DISPLAY_IRQ
    }

    /// Link operating mode this host was brought up in.
    pub fn mode(&self) -> DsiMode {
        self.mode
    }
}

fn timing_profile(gen: PhyGeneration) -> (u32, u32) {
    use phy_timing::{prepare, trail, zero};
    match gen {
        PhyGeneration::V1 => (
            prepare(0x12) | zero(0x38) | trail(0x10),
            prepare(0x0E) | zero(0x24) | trail(0x0C),
        ),
        PhyGeneration::V2 => (
            prepare(0x16) | zero(0x40) | trail(0x12),
            prepare(0x10) | zero(0x2A) | trail(0x0E),
        ),
    }
}

/// Incremental demultiplexer for a bus-turnaround response.
///
/// Fed one FIFO byte at a time so the poll loop never needs to buffer a
/// whole packet: the first byte selects the framing, a long response
/// carries its word count in the next two, and every payload byte beyond
/// the caller's buffer is counted instead of stored.
struct RxParser {
    header: [u8; 3],
    seen: usize,
    copied: usize,
    overflow: usize,
}

impl RxParser {
    fn new() -> Self {
        RxParser {
            header: [0; 3],
            seen: 0,
            copied: 0,
            overflow: 0,
        }
    }

    fn feed(&mut self, byte: u8, buf: &mut [u8]) {
        let header_len = match self.framing() {
            Some(Framing::Long) => 3,
            _ => 1,
        };
        if self.seen < header_len {
            self.header[self.seen] = byte;
            self.seen += 1;
            return;
        }
        self.seen += 1;
        let wanted = self.payload_len(buf.len());
        if self.copied < wanted {
            buf[self.copied] = byte;
            self.copied += 1;
        } else {
            self.overflow += 1;
        }
    }

    fn framing(&self) -> Option<Framing> {
        if self.seen == 0 {
            return None;
        }
        Some(match self.header[0] as u32 {
            data_type::ACK_ERROR_REPORT => Framing::Nack,
            data_type::DCS_SHORT_READ_RESP1 => Framing::Short(1),
            data_type::DCS_SHORT_READ_RESP2 => Framing::Short(2),
            data_type::DCS_LONG_READ_RESP | data_type::GEN_LONG_READ_RESP => Framing::Long,
            _ => Framing::Unknown,
        })
    }

    /// Payload bytes this response should deliver into the caller's
    /// buffer, clamped to its capacity.
    fn payload_len(&self, cap: usize) -> usize {
        match self.framing() {
            Some(Framing::Short(n)) => n.min(cap),
            Some(Framing::Long) if self.seen >= 3 => {
                let wc = self.header[1] as usize | (self.header[2] as usize) << 8;
                wc.min(cap)
            }
            _ => 0,
        }
    }

    fn finish(self, cmd: u8) -> Result<usize, RxError> {
        if self.overflow > 0 {
            warn!(
                "dsi: rx of {:#04x} returned {} byte(s) beyond the caller's buffer, drained",
                cmd, self.overflow
            );
        }
        match self.framing() {
            Some(Framing::Short(_)) | Some(Framing::Long) => Ok(self.copied),
            Some(Framing::Nack) => {
                warn!("dsi: panel acknowledge-and-error report for {:#04x}", cmd);
                Err(RxError::PanelNack)
            }
            Some(Framing::Unknown) | None => Err(RxError::Malformed),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Framing {
    Nack,
    Short(usize),
    Long,
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::dsi::{int, CLK_CFG, CTRL, INT_STATUS, PHY_CTRL, VIDEO_CFG};
    use crate::regs::mock::MockRegisters;
    use crate::time::TestClock;

    const SPAN: usize = 0x100;

    fn video_config() -> DsiConfig {
        DsiConfig {
            mode: DsiMode::Video,
            lanes: 2,
            bit_clock: Hertz(400_000_000),
            pixel_clock: Hertz(25_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn init_rejects_bad_lane_count() {
        let mut regs = MockRegisters::new(SPAN);
        let mut clock = TestClock::new();
        for lanes in [0u8, 3, 4] {
            let err = DsiHost::init_at(
                regs.base(),
                DsiConfig {
                    lanes,
                    ..video_config()
                },
                &mut clock,
            )
            .unwrap_err();
            assert_eq!(err, ConfigError::UnsupportedLaneCount);
        }
        for off in (0..SPAN).step_by(4) {
            assert_eq!(regs.peek(off), 0, "register {:#x} written", off);
        }
    }

    #[test]
    fn init_rejects_divisor_out_of_range() {
        let mut regs = MockRegisters::new(SPAN);
        let mut clock = TestClock::new();
        // 400 MHz over 1 MHz overflows the 5-bit divisor.
        let err = DsiHost::init_at(
            regs.base(),
            DsiConfig {
                pixel_clock: Hertz(1_000_000),
                ..video_config()
            },
            &mut clock,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::PixelClockDivisor);
        // Pixel clock above the bit clock leaves no whole divisor.
        let err = DsiHost::init_at(
            regs.base(),
            DsiConfig {
                pixel_clock: Hertz(500_000_000),
                ..video_config()
            },
            &mut clock,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::PixelClockDivisor);
        for off in (0..SPAN).step_by(4) {
            assert_eq!(regs.peek(off), 0, "register {:#x} written", off);
        }
    }

    #[test]
    fn video_init_programs_link() {
        let mut regs = MockRegisters::new(SPAN);
        let mut clock = TestClock::new();
        let mut host = DsiHost::init_at(regs.base(), video_config(), &mut clock).unwrap();

        let control = regs.peek(CTRL);
        assert_ne!(control & ctrl::MODE_VIDEO, 0);
        assert_ne!(control & ctrl::EOTP_DISABLE, 0);
        assert_ne!(control & ctrl::HSA_LP_DISABLE, 0);
        assert_ne!(control & ctrl::HBP_LP_DISABLE, 0);
        assert_eq!(control & ctrl::LANES_MASK, ctrl::lanes(2));
        assert_eq!(control & ctrl::ENA, 0);
        assert_eq!(regs.peek(CLK_CFG), clk_cfg::pixel_div(16));
        assert_eq!(regs.peek(VIDEO_CFG), video_cfg::pkt_len(480));

        host.start();
        assert_ne!(regs.peek(CTRL) & ctrl::ENA, 0);
    }

    #[test]
    fn short_write_packs_header() {
        let mut regs = MockRegisters::new(SPAN);
        let mut clock = TestClock::new();
        let mut host = DsiHost::init_at(regs.base(), video_config(), &mut clock).unwrap();

        host.send_dcs(0x11, &[]);
        assert_eq!(
            regs.peek(CMD_HDR),
            cmd_hdr::data_type(data_type::DCS_SHORT_WRITE) | cmd_hdr::data0(0x11)
        );

        host.send_dcs(0x36, &[0x48]);
        assert_eq!(
            regs.peek(CMD_HDR),
            cmd_hdr::data_type(data_type::DCS_SHORT_WRITE_PARAM)
                | cmd_hdr::data0(0x36)
                | cmd_hdr::data1(0x48)
        );
    }

    #[test]
    fn long_write_counts_command_byte() {
        let mut regs = MockRegisters::new(SPAN);
        let mut clock = TestClock::new();
        let mut host = DsiHost::init_at(regs.base(), video_config(), &mut clock).unwrap();

        host.send_dcs(0x2A, &[0x00, 0x00, 0x01, 0xDF]);
        assert_eq!(
            regs.peek(CMD_HDR),
            cmd_hdr::data_type(data_type::DCS_LONG_WRITE) | cmd_hdr::word_count(5)
        );
        // Final payload word carries the trailing parameter.
        assert_eq!(regs.peek(CMD_PLD), 0xDF);
    }

    #[test]
    fn read_short_circuits_on_rx_error() {
        let mut regs = MockRegisters::new(SPAN);
        let mut clock = TestClock::new();
        let mut host = DsiHost::init_at(regs.base(), video_config(), &mut clock).unwrap();
        host.enable_bus_turn_around();

        regs.poke(INT_STATUS, int::RX_ERR);
        let before = clock.elapsed();
        let mut buf = [0u8; 4];
        let err = host.read_dcs(0x0A, &mut buf, &mut clock).unwrap_err();
        assert_eq!(err, RxError::Transport);
        // First poll iteration, before any timeout accrues.
        assert_eq!(clock.elapsed(), before);
    }

    #[test]
    fn read_times_out_at_the_bound() {
        let mut regs = MockRegisters::new(SPAN);
        let mut clock = TestClock::new();
        let mut host = DsiHost::init_at(regs.base(), video_config(), &mut clock).unwrap();
        host.enable_bus_turn_around();

        let before = clock.elapsed();
        let mut buf = [0u8; 4];
        let err = host.read_dcs(0x0A, &mut buf, &mut clock).unwrap_err();
        assert_eq!(err, RxError::Transport);
        let waited = clock.elapsed().wrapping_sub(before);
        assert!(
            waited >= RX_TIMEOUT_US && waited < RX_TIMEOUT_US + 10,
            "waited {} us",
            waited
        );
    }

    #[test]
    fn read_with_empty_response_is_malformed() {
        let mut regs = MockRegisters::new(SPAN);
        let mut clock = TestClock::new();
        let mut host = DsiHost::init_at(regs.base(), video_config(), &mut clock).unwrap();
        host.enable_bus_turn_around();

        // Turnaround completed without the panel sending anything.
        regs.poke(INT_STATUS, int::RX_DONE);
        let mut buf = [0u8; 4];
        let err = host.read_dcs(0x0A, &mut buf, &mut clock).unwrap_err();
        assert_eq!(err, RxError::Malformed);
    }

    #[test]
    fn rx_parser_demuxes_short_response() {
        let mut buf = [0u8; 4];
        let mut parser = RxParser::new();
        for &b in &[data_type::DCS_SHORT_READ_RESP2 as u8, 0x5A, 0xA5] {
            parser.feed(b, &mut buf);
        }
        assert_eq!(parser.finish(0x0A), Ok(2));
        assert_eq!(&buf[..2], &[0x5A, 0xA5]);
    }

    #[test]
    fn rx_parser_clamps_long_response() {
        let mut buf = [0u8; 2];
        let mut parser = RxParser::new();
        // Panel reports four payload bytes; caller asked for two.
        let stream = [data_type::DCS_LONG_READ_RESP as u8, 4, 0, 1, 2, 3, 4];
        for &b in &stream {
            parser.feed(b, &mut buf);
        }
        assert_eq!(parser.finish(0x04), Ok(2));
        assert_eq!(buf, [1, 2]);
    }

    #[test]
    fn rx_parser_reports_panel_nack() {
        let mut buf = [0u8; 4];
        let mut parser = RxParser::new();
        for &b in &[data_type::ACK_ERROR_REPORT as u8, 0x00, 0x80] {
            parser.feed(b, &mut buf);
        }
        assert_eq!(parser.finish(0x0A), Err(RxError::PanelNack));
    }

    #[test]
    fn ulps_entry_is_idempotent() {
        let mut regs = MockRegisters::new(SPAN);
        let mut clock = TestClock::new();
        let mut host = DsiHost::init_at(regs.base(), video_config(), &mut clock).unwrap();

        // Exit before any entry is a no-op.
        let phy = regs.peek(PHY_CTRL);
        host.exit_ulps(&mut clock);
        assert_eq!(regs.peek(PHY_CTRL), phy);

        host.enter_ulps(&mut clock);
        assert_ne!(regs.peek(PHY_CTRL) & phy_ctrl::CLK_ULPS_REQ, 0);

        // A second entry must not issue the sequence again.
        regs.poke(PHY_CTRL, 0);
        host.enter_ulps(&mut clock);
        assert_eq!(regs.peek(PHY_CTRL), 0);

        host.exit_ulps(&mut clock);
        assert_eq!(regs.peek(PHY_CTRL) & phy_ctrl::CLK_ULPS_REQ, 0);
    }

    #[test]
    fn ulps_exit_enforces_wakeup_delay() {
        let mut regs = MockRegisters::new(SPAN);
        let mut clock = TestClock::new();
        let mut host = DsiHost::init_at(regs.base(), video_config(), &mut clock).unwrap();

        regs.poke(INT_STATUS, int::CMD_DONE);
        host.enter_ulps(&mut clock);
        let before = clock.elapsed();
        host.exit_ulps(&mut clock);
        assert!(clock.elapsed().wrapping_sub(before) >= ULPS_WAKEUP_US);
    }
}
