//! LCD composition controller
//!
//! [`Lcdc`] owns the composition engine: two DMA pixel paths blended over
//! a fill color, an optional write-back path, and either a smart-panel
//! (command mode) or dumb-panel (video mode) output stage feeding the DSI
//! host.
//!
//! Bring-up order matters: [`Lcdc::set_mode_defaults`] and
//! [`Lcdc::set_timing`] establish the active-area geometry that the layer
//! operations in [`layer`] are expressed against, so they must run before
//! any layer is enabled. Frame delivery and the interrupt handler live in
//! [`frame`].
//!
//! ```ignore
//! use bes2003_display_hal::dsi::DsiMode;
//! use bes2003_display_hal::lcdc::{Lcdc, LayerId, PanelTiming, PixelFormat};
//! use bes2003_display_hal::time::U32Ext;
//!
//! let mut lcdc = Lcdc::new(DsiMode::Command, 30.mhz().into(), &mut clocks);
//! lcdc.set_mode_defaults(FRAME_BUFFER);
//! lcdc.set_timing(&PanelTiming::default());
//!
//! lcdc.set_pixel_format(LayerId::Foreground, PixelFormat::Rgb565)?;
//! lcdc.write_address(LayerId::Foreground, 0, FRAME_BUFFER);
//! lcdc.enable(LayerId::Foreground, true);
//! lcdc.irq_enable();
//! lcdc.start()?;
//! ```

pub mod frame;
pub mod layer;

use embedded_display_controller::{DisplayConfiguration, DisplayController};
use log::debug;

use crate::dsi::DsiMode;
use crate::regs::lcdc::{
    blend_sel, disp, dither, dsi_fmt, dumb, extent, hsync, misc, path_ctrl1, porch, porch_vsync,
    smpn, stby_vsync, top, vsync_pix, vsync_pix_cnt, wb_ctrl, BLANK_COLOR, BLEND_SEL, DISP_CTRL,
    DITHER_CTRL, DSI_FMT, DUMB_CTRL, FG_CTRL1, HSYNC_LEN, MISC_CTRL, PANEL_H_PORCH, PANEL_TOTAL,
    PANEL_V_PORCH, PORCH_VSYNC, SMPN_CTRL, SPU_ACTIVE, STBY_VSYNC, TOP_CTRL, VSYNC_PIX,
    VSYNC_PIX_CNT, WB_CTRL,
};
use crate::regs::{RegisterBlock, LCDC_BASE, SRAM_WINDOW};
use crate::time::{DelayClock, Hertz};

pub use frame::{Error, FrameCallback, FrameState};
pub use layer::{BlendMode, LayerId, PixelFormat, UnsupportedFormat};

/// Dumb-panel vsync trigger profile used for video-mode links.
const DUMB_VSYNC_MODE: u32 = 2;

/// Clock and reset gating for the panel power domain.
///
/// The composition engine sits in its own clock domain whose gates and
/// reset lines are owned by the platform's clock manager, not by this
/// block's registers. [`Lcdc::new`], [`Lcdc::reset`] and the sleep path
/// drive the domain through this trait.
pub trait DisplayClockControl {
    /// Ungate the panel-domain clocks.
    fn enable_clock(&mut self);
    /// Gate the panel-domain clocks.
    fn disable_clock(&mut self);
    /// Assert reset over the composition sub-blocks.
    fn assert_reset(&mut self);
    /// Release the sub-block resets.
    fn clear_reset(&mut self);
}

/// Panel scan timing.
///
/// All counts are in pixels or lines of the panel's native raster. The
/// 12-bit register fields are not re-validated here; values are expected
/// to have been checked against the panel datasheet by the caller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelTiming {
    pub active_width: u16,
    pub active_height: u16,
    pub h_front_porch: u16,
    pub h_back_porch: u16,
    pub v_front_porch: u16,
    pub v_back_porch: u16,
    /// Hsync length in pixels.
    pub h_sync: u16,
    /// Vsync length in lines.
    pub v_sync: u16,
}

impl PanelTiming {
    /// Total line length including blanking.
    pub fn total_width(&self) -> u16 {
        self.active_width + self.h_front_porch + self.h_back_porch + self.h_sync
    }

    /// Total frame height including blanking.
    pub fn total_height(&self) -> u16 {
        self.active_height + self.v_front_porch + self.v_back_porch + self.v_sync
    }
}

impl Default for PanelTiming {
    /// Timing for the 454x454 round panel the reference boards carry.
    fn default() -> Self {
        PanelTiming {
            active_width: 454,
            active_height: 454,
            h_front_porch: 32,
            h_back_porch: 32,
            v_front_porch: 10,
            v_back_porch: 10,
            h_sync: 5,
            v_sync: 10,
        }
    }
}

/// DSI output pixel format of the panel interface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    Rgb565,
    Rgb666,
    Rgb888,
    Rgb101010,
}

/// Component order on the panel interface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ByteOrder {
    Bgr,
    Rgb,
}

/// Smart-panel interface cycle mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SmpnMode {
    /// One cycle per pixel over a 32-bit bus.
    OneCycle32Bit,
    /// RGB565, one cycle per pixel.
    Rgb565,
}

/// Dither output width profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DitherMode {
    Rgb444,
    Rgb565,
    Rgb666,
}

/// Owned handle to the LCD composition controller.
pub struct Lcdc {
    rb: RegisterBlock,
    mode: DsiMode,
    pixel_clock: Hertz,
    /// Active panel area established by `set_timing`.
    active: (u16, u16),
    /// Bits per pixel of the two panel paths, tracked for pitch math.
    bits_per_pixel: [u32; 2],
    sync: frame::FrameSync,
}

impl Lcdc {
    /// Takes ownership of the composition controller at its fixed base.
    ///
    /// Ungates the panel clock domain and pulses the sub-block resets, so
    /// every register starts from its hardware default. The caller must
    /// guarantee nothing else accesses the block for the handle's
    /// lifetime.
    pub fn new(
        mode: DsiMode,
        pixel_clock: Hertz,
        clocks: &mut impl DisplayClockControl,
    ) -> Self {
        // Safety: fixed peripheral base, exclusivity per the contract above.
        let rb = unsafe { RegisterBlock::new(LCDC_BASE) };
        Self::bring_up(rb, mode, pixel_clock, clocks)
    }

    /// [`Lcdc::new`] over an alternate base address.
    ///
    /// For a remapped AHB window, or plain memory in host tests. The same
    /// exclusivity contract applies.
    pub fn new_at(
        base: usize,
        mode: DsiMode,
        pixel_clock: Hertz,
        clocks: &mut impl DisplayClockControl,
    ) -> Self {
        // Safety: caller supplies a valid, exclusively owned window.
        let rb = unsafe { RegisterBlock::new(base) };
        Self::bring_up(rb, mode, pixel_clock, clocks)
    }

    fn bring_up(
        rb: RegisterBlock,
        mode: DsiMode,
        pixel_clock: Hertz,
        clocks: &mut impl DisplayClockControl,
    ) -> Self {
        clocks.enable_clock();
        clocks.assert_reset();
        clocks.clear_reset();

        debug!("lcdc: {:?} mode, pixel clock {}", mode, pixel_clock);

        Lcdc {
            rb,
            mode,
            pixel_clock,
            active: (0, 0),
            bits_per_pixel: [0; 2],
            sync: frame::FrameSync::new(),
        }
    }

    /// Panel operating mode the handle was constructed for.
    pub fn mode(&self) -> DsiMode {
        self.mode
    }

    /// Programs the panel scan timing and the mode-specific output stage.
    ///
    /// Must run before any layer is enabled: layer position and zoom are
    /// relative to the active area established here. Command mode sizes
    /// the smart-panel scan (the active-area register is inclusive, hence
    /// the +1); video mode pads the totals for the dumb-panel pipeline
    /// and places vsync inside the horizontal blanking.
    pub fn set_timing(&mut self, timing: &PanelTiming) {
        let aw = u32::from(timing.active_width);
        let ah = u32::from(timing.active_height);
        let total_w = u32::from(timing.total_width());
        let total_h = u32::from(timing.total_height());

        self.rb.write(
            PANEL_H_PORCH,
            porch::front(u32::from(timing.h_front_porch)) | porch::back(u32::from(timing.h_back_porch)),
        );
        self.rb.write(
            PANEL_V_PORCH,
            porch::front(u32::from(timing.v_front_porch)) | porch::back(u32::from(timing.v_back_porch)),
        );
        self.rb.write(
            HSYNC_LEN,
            hsync::length(u32::from(timing.h_sync)) | hsync::delay_lines(0),
        );
        self.rb.replace_bits(
            PORCH_VSYNC,
            porch_vsync::VSYNC_LINES_MASK,
            porch_vsync::vsync_lines(u32::from(timing.v_sync)),
        );

        match self.mode {
            DsiMode::Command => {
                self.rb
                    .write(PANEL_TOTAL, extent::h(total_w) | extent::v(total_h));
                self.rb
                    .write(SPU_ACTIVE, extent::h(aw + 1) | extent::v(ah + 1));

                self.rb.set_bits(DISP_CTRL, disp::MEM_ENABLE);
                self.rb.set_bits(SMPN_CTRL, smpn::RSTB);
            }
            DsiMode::Video => {
                self.rb
                    .write(PANEL_TOTAL, extent::h(total_w + 4) | extent::v(total_h + 8));
                self.rb.write(SPU_ACTIVE, extent::h(aw) | extent::v(ah));

                // Vsync pulse sits just past the active line.
                let vs = aw + u32::from(timing.h_front_porch);
                self.rb
                    .write(VSYNC_PIX, vsync_pix::start(vs) | vsync_pix::end(vs));

                self.rb.set_bits(DUMB_CTRL, dumb::ENA);
                self.rb.replace_bits(
                    FG_CTRL1,
                    path_ctrl1::DUMB_MODE_MASK,
                    path_ctrl1::dumb_mode(DUMB_VSYNC_MODE),
                );
                self.rb.set_bits(DISP_CTRL, disp::DSI_SOURCE_SEL);
            }
        }

        self.active = (timing.active_width, timing.active_height);
        debug!(
            "lcdc: timing {}x{} total {}x{}",
            timing.active_width,
            timing.active_height,
            timing.total_width(),
            timing.total_height()
        );
    }

    /// Applies the known-good scan defaults for this silicon.
    ///
    /// `fb_addr` selects the standby-vsync length: frame buffers in
    /// internal SRAM tolerate a shorter blanking window than PSRAM ones.
    /// Covers the standby/porch/pixel vsync table, panel-path start
    /// points, blend input order, burst lengths and trigger gating.
    pub fn set_mode_defaults(&mut self, fb_addr: u32) {
        let stby_len: u32 = if SRAM_WINDOW.contains(&fb_addr) {
            0x1E0
        } else {
            0x200
        };
        self.rb.write(
            STBY_VSYNC,
            stby_vsync::length(stby_len) | stby_vsync::start_line(1) | stby_vsync::end_line(5),
        );
        self.rb.write(
            PORCH_VSYNC,
            porch_vsync::h_front(32) | porch_vsync::h_back(32) | porch_vsync::vsync_lines(10),
        );
        self.rb
            .write(VSYNC_PIX_CNT, vsync_pix_cnt::start(30) | vsync_pix_cnt::end(31));

        // Panel paths scan from (1, 1).
        self.set_position(LayerId::Foreground, 1, 1);
        self.set_position(LayerId::Background, 1, 1);
        self.select_top(LayerId::Foreground);

        self.rb
            .replace_bits(SMPN_CTRL, smpn::VSYNC_DELAY_MASK, smpn::vsync_delay(1));
        self.rb.clear_bits(DISP_CTRL, disp::EXTRA_DELAY_MASK);
        self.rb
            .set_bits(DISP_CTRL, disp::SVSYNC_TRIG_DISABLE | disp::AVSYNC_TRIG_DISABLE);

        self.rb.replace_bits(TOP_CTRL, top::BURST_MASK, top::burst(0x0F));
        self.rb
            .replace_bits(WB_CTRL, wb_ctrl::BURST_MASK, wb_ctrl::burst(8));

        self.enable_trigger(LayerId::Foreground, true);
        self.enable_axi_fastmode();
    }

    /// Selects the DSI output pixel format and component order.
    pub fn set_output_format(&mut self, format: OutputFormat, order: ByteOrder) {
        let fmt = match format {
            OutputFormat::Rgb565 => dsi_fmt::FMT_RGB565,
            OutputFormat::Rgb666 => dsi_fmt::FMT_RGB666,
            OutputFormat::Rgb888 => dsi_fmt::FMT_RGB888,
            OutputFormat::Rgb101010 => dsi_fmt::FMT_RGB101010,
        };
        let swap = match order {
            ByteOrder::Bgr => dsi_fmt::SWAP_BGR,
            ByteOrder::Rgb => dsi_fmt::SWAP_RGB,
        };
        self.rb.replace_bits(
            DSI_FMT,
            dsi_fmt::FMT_MASK | dsi_fmt::DATA_SWAP_MASK,
            fmt | dsi_fmt::data_swap(swap),
        );
    }

    /// Selects the smart-panel interface cycle mode.
    pub fn set_smpn_mode(&mut self, mode: SmpnMode) {
        let code = match mode {
            SmpnMode::OneCycle32Bit => smpn::MODE_1CYC_32BIT,
            SmpnMode::Rgb565 => smpn::MODE_RGB565,
        };
        self.rb
            .replace_bits(SMPN_CTRL, smpn::MODE_MASK, smpn::mode(code));
    }

    /// Fill color shown behind all layers, RGB888.
    pub fn set_blank_color(&mut self, rgb: u32) {
        self.rb.write(BLANK_COLOR, rgb);
    }

    /// Enables output dithering.
    pub fn set_dither(&mut self, mode: DitherMode, table: u8, use_4x8: bool) {
        let profile = match mode {
            DitherMode::Rgb444 => dither::MODE_RGB444,
            DitherMode::Rgb565 => dither::MODE_RGB565,
            DitherMode::Rgb666 => dither::MODE_RGB666,
        };
        let mut value = dither::ENA | dither::mode(profile) | dither::table(u32::from(table));
        if use_4x8 {
            value |= dither::MODE_4X8;
        }
        self.rb.write(DITHER_CTRL, value);
    }

    /// Disables output dithering.
    pub fn disable_dither(&mut self) {
        self.rb.clear_bits(DITHER_CTRL, dither::ENA);
    }

    /// Switches the AXI bus arbiter into fast mode.
    pub fn enable_axi_fastmode(&mut self) {
        self.rb.set_bits(MISC_CTRL, misc::AXI_FASTMODE);
    }

    /// Drives the backlight enable output.
    pub fn set_backlight(&mut self, on: bool) {
        if on {
            self.rb.set_bits(DISP_CTRL, disp::BACKLIGHT_EN);
        } else {
            self.rb.clear_bits(DISP_CTRL, disp::BACKLIGHT_EN);
        }
    }

    /// Selects which panel path feeds the top of the blend stage.
    ///
    /// # Panics
    ///
    /// Panics unless `layer` is `Foreground` or `Background`; the other
    /// layers do not feed the blender.
    pub fn select_top(&mut self, layer: LayerId) {
        let code: u32 = match layer {
            LayerId::Foreground => 0,
            LayerId::Background => 1,
            _ => panic!("only the panel paths feed the blend stage"),
        };
        self.rb.replace_bits(
            BLEND_SEL,
            blend_sel::FIRST_MASK | blend_sel::SECOND_MASK,
            blend_sel::first(code) | blend_sel::second(code ^ 1),
        );
    }

    /// Masks the display interrupt and gates the panel clock domain.
    ///
    /// Configuration is retained; [`Lcdc::wakeup`] restores delivery.
    pub fn sleep(&mut self, clocks: &mut impl DisplayClockControl) {
        self.irq_disable();
        clocks.disable_clock();
    }

    /// Ungates the panel clock domain and re-enables frame interrupts.
    pub fn wakeup(&mut self, clocks: &mut impl DisplayClockControl) {
        clocks.enable_clock();
        self.irq_enable();
    }

    /// Full panel-domain reset.
    ///
    /// Asserts the sub-block resets, waits for the domain to settle and
    /// releases them. No configuration survives: the caller must re-run
    /// the timing setup and re-enable every layer afterwards.
    pub fn reset(
        &mut self,
        clocks: &mut impl DisplayClockControl,
        delay: &mut impl DelayClock,
    ) {
        self.irq_disable();
        clocks.assert_reset();
        delay.delay_us(10);
        clocks.clear_reset();
        delay.delay_us(10);

        self.active = (0, 0);
        self.bits_per_pixel = [0; 2];
        self.sync = frame::FrameSync::new();
    }
}

impl DisplayController for Lcdc {
    /// Programs the panel timing from a generic display configuration.
    ///
    /// The polarity flags are ignored: sync polarity has no meaning on a
    /// serial DSI link.
    fn init(&mut self, config: DisplayConfiguration) {
        let timing = PanelTiming {
            active_width: config.active_width,
            active_height: config.active_height,
            h_front_porch: config.h_front_porch,
            h_back_porch: config.h_back_porch,
            v_front_porch: config.v_front_porch,
            v_back_porch: config.v_back_porch,
            h_sync: config.h_sync,
            v_sync: config.v_sync,
        };
        self.set_timing(&timing);
    }

    fn clock(&self) -> u32 {
        self.pixel_clock.0
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for the controller test modules.

    use super::{DisplayClockControl, DsiMode, Lcdc};
    use crate::regs::mock::MockRegisters;
    use crate::time::Hertz;

    pub(crate) struct NullClocks;

    impl DisplayClockControl for NullClocks {
        fn enable_clock(&mut self) {}
        fn disable_clock(&mut self) {}
        fn assert_reset(&mut self) {}
        fn clear_reset(&mut self) {}
    }

    /// A controller over plain memory. The mock must outlive the handle.
    pub(crate) fn mock_lcdc(mode: DsiMode) -> (MockRegisters, Lcdc) {
        let mut regs = MockRegisters::new(0x400);
        let lcdc = Lcdc::new_at(regs.base(), mode, Hertz(30_000_000), &mut NullClocks);
        (regs, lcdc)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::mock_lcdc;
    use super::*;
    use crate::regs::lcdc::{
        DISP_CTRL, DSI_FMT, DUMB_CTRL, PANEL_H_PORCH, PANEL_TOTAL, PORCH_VSYNC, SPU_ACTIVE,
        STBY_VSYNC, VSYNC_PIX,
    };

    #[test]
    fn command_timing_sizes_the_smart_panel_scan() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);

        lcdc.set_timing(&PanelTiming::default());

        // 454 active, porches 32+32, sync 5 -> 523 total per line
        assert_eq!(regs.peek(PANEL_TOTAL), extent::h(523) | extent::v(484));
        // smart-panel active area is inclusive
        assert_eq!(regs.peek(SPU_ACTIVE), extent::h(455) | extent::v(455));
        assert_eq!(
            regs.peek(PANEL_H_PORCH),
            porch::front(32) | porch::back(32)
        );
        assert_ne!(regs.peek(DISP_CTRL) & disp::MEM_ENABLE, 0);
        assert_eq!(regs.peek(DUMB_CTRL), 0);
    }

    #[test]
    fn video_timing_pads_totals_and_routes_the_dumb_panel() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Video);

        lcdc.set_timing(&PanelTiming::default());

        assert_eq!(regs.peek(PANEL_TOTAL), extent::h(527) | extent::v(492));
        assert_eq!(regs.peek(SPU_ACTIVE), extent::h(454) | extent::v(454));
        assert_eq!(
            regs.peek(VSYNC_PIX),
            vsync_pix::start(486) | vsync_pix::end(486)
        );
        assert_ne!(regs.peek(DUMB_CTRL) & dumb::ENA, 0);
        assert_ne!(regs.peek(DISP_CTRL) & disp::DSI_SOURCE_SEL, 0);
        assert_eq!(regs.peek(DISP_CTRL) & disp::MEM_ENABLE, 0);
    }

    #[test]
    fn mode_defaults_pick_standby_length_by_window() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);
        lcdc.set_mode_defaults(0x2000_0000);
        assert_eq!(
            regs.peek(STBY_VSYNC),
            stby_vsync::length(0x1E0) | stby_vsync::start_line(1) | stby_vsync::end_line(5)
        );

        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);
        lcdc.set_mode_defaults(0x3400_0000);
        assert_eq!(
            regs.peek(STBY_VSYNC),
            stby_vsync::length(0x200) | stby_vsync::start_line(1) | stby_vsync::end_line(5)
        );
        assert_eq!(
            regs.peek(PORCH_VSYNC),
            porch_vsync::h_front(32) | porch_vsync::h_back(32) | porch_vsync::vsync_lines(10)
        );
    }

    #[test]
    fn output_format_is_one_hot() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);

        lcdc.set_output_format(OutputFormat::Rgb888, ByteOrder::Rgb);
        assert_eq!(
            regs.peek(DSI_FMT),
            dsi_fmt::FMT_RGB888 | dsi_fmt::data_swap(dsi_fmt::SWAP_RGB)
        );

        lcdc.set_output_format(OutputFormat::Rgb565, ByteOrder::Bgr);
        assert_eq!(regs.peek(DSI_FMT), dsi_fmt::FMT_RGB565);
    }

    #[test]
    fn display_controller_trait_programs_timing() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);

        lcdc.init(DisplayConfiguration {
            active_width: 240,
            active_height: 240,
            h_back_porch: 10,
            h_front_porch: 10,
            v_back_porch: 4,
            v_front_porch: 4,
            h_sync: 2,
            v_sync: 2,
            h_sync_pol: false,
            v_sync_pol: false,
            not_data_enable_pol: false,
            pixel_clock_pol: false,
        });

        assert_eq!(regs.peek(PANEL_TOTAL), extent::h(262) | extent::v(250));
        assert_eq!(lcdc.clock(), 30_000_000);
    }
}
