//! Layer compositing engine
//!
//! The compositor has four pixel sources: two DMA panel paths
//! (foreground and background) that feed the blend stage, a write-back
//! path that captures the blended output, and the smart-panel TX stage.
//! A layer moves from configured to scanned-out only through
//! [`Lcdc::enable`]; format, blend and geometry changes on an enabled
//! layer take effect at the next frame boundary.

use embedded_display_controller::{
    DisplayControllerLayer, PixelFormat as ControllerFormat, PixelWord,
};
use log::debug;

use super::Lcdc;
use crate::regs::lcdc::{
    chroma, chroma_ena, cm_dma, cm_wb, extent, io_ctrl, path_ctrl, path_ctrl1, pitch, pos, smpn,
    wb_ctrl, wb_size, DmaPathRegs, BG_PATH, CHROMA_B, CHROMA_ENA, CHROMA_G, CHROMA_R, FG_PATH,
    SMPN_CTRL, SPU_ACTIVE, WB_ADDR, WB_CTRL, WB_SIZE,
};
use crate::regs::{barrier, dma_capable};

/// One of the compositor's pixel sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerId {
    /// Video DMA path, first blend input by default.
    Foreground,
    /// Graphic DMA path, second blend input by default.
    Background,
    /// Blended-output capture path.
    WriteBack,
    /// Smart-panel TX stage.
    SmartPanel,
}

impl LayerId {
    /// Register group of the panel DMA paths; `None` for the others.
    const fn path(self) -> Option<&'static DmaPathRegs> {
        match self {
            LayerId::Foreground => Some(&FG_PATH),
            LayerId::Background => Some(&BG_PATH),
            _ => None,
        }
    }

    /// Index into per-path driver state.
    const fn path_index(self) -> Option<usize> {
        match self {
            LayerId::Foreground => Some(0),
            LayerId::Background => Some(1),
            _ => None,
        }
    }
}

/// Portable pixel-format tags.
///
/// Not every tag is expressible on every layer class; the mapping
/// functions reject the holes instead of writing a sentinel code that
/// the hardware would render as garbage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb565,
    Bgr565,
    Rgb1555,
    Rgb444,
    /// 24-bit packed RGB.
    Rgb888,
    /// RGB in 32-bit words, upper byte unused.
    Rgb888Unpacked,
    Bgr888,
    Bgr888Unpacked,
    Argb8888,
    Rgba8888,
    Abgr8888,
    Bgra8888,
    Yuv422Packed,
    Yuv422Planar,
    Yuv420Planar,
    Pal4,
    Pal8,
}

/// The requested format has no hardware code on the target layer.
#[derive(Debug, PartialEq, Eq)]
pub struct UnsupportedFormat;

impl PixelFormat {
    /// Hardware code on the panel DMA paths, R/B-swap marker included.
    fn dma_code(self) -> Result<u32, UnsupportedFormat> {
        use PixelFormat::*;
        Ok(match self {
            Rgb565 => cm_dma::RGB565,
            Bgr565 => cm_dma::RGB565 | cm_dma::SWAP_RB,
            Rgb1555 => cm_dma::RGB1555,
            Rgb888 => cm_dma::RGB888_PACKED,
            Bgr888 => cm_dma::RGB888_PACKED | cm_dma::SWAP_RB,
            Rgb888Unpacked => cm_dma::RGB888_UNPACKED,
            Bgr888Unpacked => cm_dma::RGB888_UNPACKED | cm_dma::SWAP_RB,
            Argb8888 => cm_dma::ARGB8888,
            Abgr8888 => cm_dma::ARGB8888 | cm_dma::SWAP_RB,
            Rgba8888 => cm_dma::RGBA8888,
            Bgra8888 => cm_dma::RGBA8888 | cm_dma::SWAP_RB,
            Yuv422Packed => cm_dma::YUV422_PACKED,
            Yuv422Planar => cm_dma::YUV422_PLANAR,
            Yuv420Planar => cm_dma::YUV420_PLANAR,
            Pal4 => cm_dma::PAL4,
            Pal8 => cm_dma::PAL8,
            Rgb444 => return Err(UnsupportedFormat),
        })
    }

    /// Hardware code on the write-back path. The output stage has no
    /// R/B swap stage, so the swapped tags are not expressible.
    fn wb_code(self) -> Result<u32, UnsupportedFormat> {
        use PixelFormat::*;
        Ok(match self {
            Rgb565 => cm_wb::RGB565,
            Rgb888 => cm_wb::RGB888_PACKED,
            Argb8888 => cm_wb::ARGB8888,
            Rgba8888 => cm_wb::RGBA8888,
            _ => return Err(UnsupportedFormat),
        })
    }

    fn is_yuv(self) -> bool {
        matches!(
            self,
            PixelFormat::Yuv422Packed | PixelFormat::Yuv422Planar | PixelFormat::Yuv420Planar
        )
    }

    /// Storage density of the format, used for pitch math.
    pub fn bits_per_pixel(self) -> u32 {
        use PixelFormat::*;
        match self {
            Pal4 => 4,
            Pal8 => 8,
            Yuv420Planar => 12,
            Rgb565 | Bgr565 | Rgb1555 | Rgb444 | Yuv422Packed | Yuv422Planar => 16,
            Rgb888 | Bgr888 => 24,
            Rgb888Unpacked | Bgr888Unpacked | Argb8888 | Rgba8888 | Abgr8888 | Bgra8888 => 32,
        }
    }
}

/// Blend-stage alpha source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    /// A single alpha value for the whole layer.
    ConstantAlpha,
    /// Per-pixel alpha from the layer's own format.
    PixelAlpha,
}

impl Lcdc {
    /// Programs a layer's pixel format.
    ///
    /// Fails with [`UnsupportedFormat`] when the format has no code on
    /// the target layer class; the registers are left untouched in that
    /// case. The smart-panel stage carries no DMA format of its own.
    pub fn set_pixel_format(
        &mut self,
        layer: LayerId,
        format: PixelFormat,
    ) -> Result<(), UnsupportedFormat> {
        match layer {
            LayerId::Foreground | LayerId::Background => {
                let code = format.dma_code()?;
                let path = layer.path().unwrap_or(&FG_PATH);

                let mut value = path_ctrl::format(code & !cm_dma::SWAP_RB);
                if code & cm_dma::SWAP_RB != 0 {
                    value |= path_ctrl::SWAP_RB;
                }
                if format.is_yuv() {
                    value |= path_ctrl::YUV2RGB_ENA;
                }
                self.rb.replace_bits(
                    path.ctrl,
                    path_ctrl::FORMAT_MASK | path_ctrl::SWAP_RB | path_ctrl::YUV2RGB_ENA,
                    value,
                );
                if let Some(i) = layer.path_index() {
                    self.bits_per_pixel[i] = format.bits_per_pixel();
                }
                Ok(())
            }
            LayerId::WriteBack => {
                let code = format.wb_code()?;
                self.rb
                    .replace_bits(WB_CTRL, wb_ctrl::FORMAT_MASK, wb_ctrl::format(code));
                Ok(())
            }
            LayerId::SmartPanel => Err(UnsupportedFormat),
        }
    }

    /// Selects the blend alpha source for a panel path.
    ///
    /// `alpha` is only consumed in [`BlendMode::ConstantAlpha`]. The
    /// write-back and smart-panel stages sit after the blender, so the
    /// call is a no-op for them; keeping it callable lets generic layer
    /// code stay uniform.
    pub fn set_blend(&mut self, layer: LayerId, mode: BlendMode, alpha: u8) {
        let path = match layer.path() {
            Some(p) => p,
            None => return,
        };
        let mode_code = match mode {
            BlendMode::ConstantAlpha => path_ctrl1::AM_CONST,
            BlendMode::PixelAlpha => path_ctrl1::AM_SECOND_PIXEL,
        };
        let mut mask = path_ctrl1::ALPHA_MODE_MASK;
        let mut value = path_ctrl1::alpha_mode(mode_code);
        if mode == BlendMode::ConstantAlpha {
            mask |= path_ctrl1::ALPHA_MASK;
            value |= path_ctrl1::alpha(u32::from(alpha));
        }
        self.rb.replace_bits(path.ctrl1, mask, value);
    }

    /// Programs the chroma key for a panel path and enables keying on
    /// all three color channels.
    ///
    /// The per-channel key registers are shared between the two paths;
    /// each path only selects whether it participates. No-op for the
    /// write-back and smart-panel stages.
    pub fn set_chroma_key(
        &mut self,
        layer: LayerId,
        match_rgb: u32,
        replace_rgb: u32,
        replace_alpha: u8,
    ) {
        let path = match layer.path() {
            Some(p) => p,
            None => return,
        };

        for (reg, shift) in [(CHROMA_R, 16), (CHROMA_G, 8), (CHROMA_B, 0)] {
            let key = (match_rgb >> shift) & 0xFF;
            let replace = (replace_rgb >> shift) & 0xFF;
            self.rb.write(
                reg,
                chroma::alpha(u32::from(replace_alpha))
                    | chroma::replace(replace)
                    | chroma::match_lo(key)
                    | chroma::match_hi(key),
            );
        }

        self.rb.replace_bits(
            path.ctrl1,
            path_ctrl1::CHROMA_MODE_MASK,
            path_ctrl1::chroma_mode(path_ctrl1::CKEY_RGB),
        );
        let ena = match layer {
            LayerId::Foreground => chroma_ena::VIDEO_PATH,
            _ => chroma_ena::GRAPHIC_PATH,
        };
        self.rb.set_bits(CHROMA_ENA, ena);
    }

    /// Rewrites only the chroma replacement alpha, leaving the keys and
    /// replacement colors alone. No-op for non-panel layers.
    pub fn set_chroma_key_alpha(&mut self, layer: LayerId, alpha: u8) {
        if layer.path().is_none() {
            return;
        }
        for reg in [CHROMA_R, CHROMA_G, CHROMA_B] {
            self.rb
                .replace_bits(reg, chroma::ALPHA_MASK, chroma::alpha(u32::from(alpha)));
        }
    }

    /// Places a layer's scan start point on the panel raster.
    pub fn set_position(&mut self, layer: LayerId, x: u16, y: u16) {
        if let Some(path) = layer.path() {
            self.rb.write(
                path.pos,
                pos::x(u32::from(x)) | pos::y(u32::from(y)) | pos::FRAME_FIX,
            );
        }
    }

    /// Programs a layer's geometry.
    ///
    /// For the panel paths: on-screen position, source size and scaled
    /// target size (`zoom == size` means no scaling). The write-back
    /// path only has a target size; the smart-panel stage only an
    /// active area. Position and zoom are ignored for those two.
    pub fn set_geometry(
        &mut self,
        layer: LayerId,
        position: (u16, u16),
        size: (u16, u16),
        zoom: (u16, u16),
    ) {
        let (w, h) = (u32::from(size.0), u32::from(size.1));
        match layer {
            LayerId::Foreground | LayerId::Background => {
                let path = layer.path().unwrap_or(&FG_PATH);
                self.set_position(layer, position.0, position.1);
                self.rb.write(path.size, extent::h(w) | extent::v(h));
                self.rb.write(
                    path.zoom,
                    extent::h(u32::from(zoom.0)) | extent::v(u32::from(zoom.1)),
                );
            }
            LayerId::WriteBack => {
                self.rb.replace_bits(
                    WB_SIZE,
                    wb_size::WIDTH_MASK | wb_size::HEIGHT_MASK,
                    wb_size::width(w) | wb_size::height(h),
                );
            }
            LayerId::SmartPanel => {
                self.rb.write(SPU_ACTIVE, extent::h(w) | extent::v(h));
            }
        }
    }

    /// Sets a panel path's line pitch in bytes. The write-back pitch
    /// shares its control register's upper half.
    pub fn set_pitch(&mut self, layer: LayerId, pitch_bytes: u16) {
        let p = u32::from(pitch_bytes);
        match layer {
            LayerId::Foreground | LayerId::Background => {
                let path = layer.path().unwrap_or(&FG_PATH);
                self.rb
                    .replace_bits(path.pitch, pitch::LINE_MASK, pitch::line(p));
            }
            LayerId::WriteBack => {
                self.rb
                    .replace_bits(WB_CTRL, pitch::WB_LINE_MASK, pitch::wb_line(p));
            }
            LayerId::SmartPanel => {}
        }
    }

    /// Mirrors a panel path vertically. No-op for the other layers.
    pub fn set_vertical_mirror(&mut self, layer: LayerId, on: bool) {
        let bit = match layer {
            LayerId::Foreground => io_ctrl::VIDEO_VMIRROR,
            LayerId::Background => io_ctrl::GRAPHIC_VMIRROR,
            _ => return,
        };
        if on {
            self.rb.set_bits(crate::regs::lcdc::PANEL_IO_CTRL, bit);
        } else {
            self.rb.clear_bits(crate::regs::lcdc::PANEL_IO_CTRL, bit);
        }
    }

    /// Writes a frame DMA source address into one double-buffer slot.
    ///
    /// Channel 1 is the alternate slot of the panel paths; the
    /// write-back path has a single slot and accepts only channel 0.
    ///
    /// # Panics
    ///
    /// Panics if `addr` lies outside the display-capable memory windows
    /// (a bad source address would make the DMA master fetch from
    /// undefined space), if `channel` is out of range for the layer, or
    /// if the layer has no frame DMA (`SmartPanel`).
    pub fn write_address(&mut self, layer: LayerId, channel: u8, addr: u32) {
        assert!(
            dma_capable(addr),
            "frame address {:#010x} outside the display DMA windows",
            addr
        );
        match layer {
            LayerId::Foreground | LayerId::Background => {
                assert!(channel < 2, "panel paths have two address slots");
                let path = layer.path().unwrap_or(&FG_PATH);
                self.rb.write(path.addr[usize::from(channel)], addr);
            }
            LayerId::WriteBack => {
                assert!(channel == 0, "write-back has a single address slot");
                self.rb.write(WB_ADDR, addr);
            }
            LayerId::SmartPanel => panic!("smart-panel stage has no frame DMA"),
        }
    }

    /// Reads back a frame DMA address slot.
    ///
    /// # Panics
    ///
    /// Same range rules as [`Lcdc::write_address`].
    pub fn current_address(&self, layer: LayerId, channel: u8) -> u32 {
        match layer {
            LayerId::Foreground | LayerId::Background => {
                assert!(channel < 2, "panel paths have two address slots");
                let path = layer.path().unwrap_or(&FG_PATH);
                self.rb.read(path.addr[usize::from(channel)])
            }
            LayerId::WriteBack => {
                assert!(channel == 0, "write-back has a single address slot");
                self.rb.read(WB_ADDR)
            }
            LayerId::SmartPanel => panic!("smart-panel stage has no frame DMA"),
        }
    }

    /// Adds a layer to, or removes it from, the next frame's scanout.
    pub fn enable(&mut self, layer: LayerId, on: bool) {
        debug!("lcdc: {:?} enable={}", layer, on);
        match layer {
            LayerId::Foreground | LayerId::Background => {
                let path = layer.path().unwrap_or(&FG_PATH);
                if on {
                    self.rb.set_bits(path.ctrl, path_ctrl::ENA);
                } else {
                    self.rb.clear_bits(path.ctrl, path_ctrl::ENA);
                }
            }
            LayerId::WriteBack => {
                if on {
                    self.rb.set_bits(WB_CTRL, wb_ctrl::ENA);
                } else {
                    self.rb.clear_bits(WB_CTRL, wb_ctrl::ENA);
                }
            }
            LayerId::SmartPanel => {
                if on {
                    self.rb.set_bits(SMPN_CTRL, smpn::ENA | smpn::RSTB);
                } else {
                    self.rb.clear_bits(SMPN_CTRL, smpn::ENA);
                }
            }
        }
    }

    /// Arms a panel path's per-frame DMA transfer trigger.
    ///
    /// Enabling is sticky: if the trigger is already armed the register
    /// is left alone, so a trigger raised by a frame in flight is not
    /// re-pulsed. No-op for non-panel layers.
    pub fn enable_trigger(&mut self, layer: LayerId, on: bool) {
        let path = match layer.path() {
            Some(p) => p,
            None => return,
        };
        if on {
            if self.rb.read(path.ctrl1) & path_ctrl1::TRANS_TRIGGER != 0 {
                return;
            }
            self.rb.set_bits(path.ctrl1, path_ctrl1::TRANS_TRIGGER);
        } else {
            self.rb.clear_bits(path.ctrl1, path_ctrl1::TRANS_TRIGGER);
        }
    }

    /// Borrows one layer as an [`embedded_display_controller`] layer.
    ///
    /// # Panics
    ///
    /// Panics for the write-back and smart-panel stages; only the panel
    /// DMA paths are scanout layers in the trait's sense.
    pub fn layer(&mut self, id: LayerId) -> LcdcLayer<'_> {
        assert!(
            id.path().is_some(),
            "only the panel paths are scanout layers"
        );
        LcdcLayer { lcdc: self, id }
    }
}

/// One panel DMA path viewed through the
/// [`embedded_display_controller`] layer trait.
pub struct LcdcLayer<'a> {
    lcdc: &'a mut Lcdc,
    id: LayerId,
}

impl DisplayControllerLayer for LcdcLayer<'_> {
    /// Configures the full-screen framebuffer and enables the layer.
    ///
    /// # Safety
    ///
    /// `start_ptr` must point to a framebuffer readable by the display
    /// DMA engines, large enough for the active area in this format.
    ///
    /// # Panics
    ///
    /// Panics on formats with no hardware code on the panel paths.
    unsafe fn enable<T: PixelWord>(
        &mut self,
        start_ptr: *const T,
        pixel_format: ControllerFormat,
    ) {
        let format = match pixel_format {
            ControllerFormat::ARGB8888 => PixelFormat::Argb8888,
            ControllerFormat::RGB888 => PixelFormat::Rgb888,
            ControllerFormat::RGB565 => PixelFormat::Rgb565,
            ControllerFormat::ARGB1555 => PixelFormat::Rgb1555,
            _ => panic!("no hardware code for {:?}", pixel_format),
        };

        let (width, height) = self.lcdc.active;
        let pitch = (u32::from(width) * format.bits_per_pixel() / 8) as u16;

        // dma_code cannot fail for the formats admitted above
        let _ = self.lcdc.set_pixel_format(self.id, format);
        self.lcdc
            .set_geometry(self.id, (1, 1), (width, height), (width, height));
        self.lcdc.set_pitch(self.id, pitch);
        self.lcdc.write_address(self.id, 0, start_ptr as u32);
        self.lcdc.enable(self.id, true);
        self.lcdc.enable_trigger(self.id, true);
    }

    /// Re-derives the line pitch for a wider backing buffer. The output
    /// window is unchanged.
    ///
    /// # Safety
    ///
    /// The backing buffer must cover the resulting pitch for every
    /// active line.
    unsafe fn resize_buffer_pitch(&mut self, width: u32) {
        let index = self.id.path_index().unwrap_or(0);
        let bpp = self.lcdc.bits_per_pixel[index];
        assert!(bpp > 0, "format must be set before the pitch");
        self.lcdc.set_pitch(self.id, (width * bpp / 8) as u16);
    }

    /// Queues `start_ptr` on the inactive double-buffer channel; the
    /// hardware picks it up at the next frame boundary.
    ///
    /// # Safety
    ///
    /// `start_ptr` must satisfy the same contract as in
    /// [`DisplayControllerLayer::enable`].
    unsafe fn swap_framebuffer<T: PixelWord>(&mut self, start_ptr: *const T) {
        let index = self.id.path_index().unwrap_or(0);
        let inactive = self.lcdc.sync.scan_channel(index) ^ 1;
        self.lcdc.write_address(self.id, inactive, start_ptr as u32);
        self.lcdc.sync.mark_swap_pending(index);
    }

    /// Whether a queued swap has not yet been taken over by a frame
    /// completion. While pending, the previously supplied buffer is
    /// still owned by the display.
    fn is_swap_pending(&self) -> bool {
        // Commit the preceding address write before sampling the state.
        barrier();
        let index = self.id.path_index().unwrap_or(0);
        self.lcdc.sync.swap_pending(index)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::mock_lcdc;
    use super::*;
    use crate::dsi::DsiMode;
    use crate::regs::lcdc::{BG_CTRL, BG_CTRL1, FG_ADDR0, FG_ADDR1, FG_CTRL, FG_CTRL1, FG_PITCH};

    #[test]
    fn format_codes_read_back_exactly() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);

        lcdc.set_pixel_format(LayerId::Foreground, PixelFormat::Rgb565)
            .unwrap();
        assert_eq!(regs.peek(FG_CTRL), path_ctrl::format(cm_dma::RGB565));

        lcdc.set_pixel_format(LayerId::Foreground, PixelFormat::Bgra8888)
            .unwrap();
        assert_eq!(
            regs.peek(FG_CTRL),
            path_ctrl::format(cm_dma::RGBA8888) | path_ctrl::SWAP_RB
        );

        lcdc.set_pixel_format(LayerId::Background, PixelFormat::Yuv420Planar)
            .unwrap();
        assert_eq!(
            regs.peek(BG_CTRL),
            path_ctrl::format(cm_dma::YUV420_PLANAR) | path_ctrl::YUV2RGB_ENA
        );

        lcdc.set_pixel_format(LayerId::WriteBack, PixelFormat::Rgb888)
            .unwrap();
        assert_eq!(
            regs.peek(WB_CTRL) & wb_ctrl::FORMAT_MASK,
            wb_ctrl::format(cm_wb::RGB888_PACKED)
        );
    }

    #[test]
    fn unsupported_formats_leave_registers_unchanged() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);

        lcdc.set_pixel_format(LayerId::Foreground, PixelFormat::Argb8888)
            .unwrap();
        let before = regs.peek(FG_CTRL);

        assert_eq!(
            lcdc.set_pixel_format(LayerId::Foreground, PixelFormat::Rgb444),
            Err(UnsupportedFormat)
        );
        assert_eq!(regs.peek(FG_CTRL), before);

        // palette formats exist only on the panel DMA paths
        assert_eq!(
            lcdc.set_pixel_format(LayerId::WriteBack, PixelFormat::Pal8),
            Err(UnsupportedFormat)
        );
        assert_eq!(regs.peek(WB_CTRL), 0);

        assert_eq!(
            lcdc.set_pixel_format(LayerId::SmartPanel, PixelFormat::Rgb565),
            Err(UnsupportedFormat)
        );
    }

    #[test]
    fn blend_writes_the_paths_own_control() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);

        lcdc.set_blend(LayerId::Foreground, BlendMode::ConstantAlpha, 0x9F);
        assert_eq!(
            regs.peek(FG_CTRL1),
            path_ctrl1::alpha(0x9F) | path_ctrl1::alpha_mode(path_ctrl1::AM_CONST)
        );

        lcdc.set_blend(LayerId::Background, BlendMode::PixelAlpha, 0xFF);
        assert_eq!(
            regs.peek(BG_CTRL1),
            path_ctrl1::alpha_mode(path_ctrl1::AM_SECOND_PIXEL)
        );
        // alpha byte only applies in constant mode
        assert_eq!(regs.peek(BG_CTRL1) & path_ctrl1::ALPHA_MASK, 0);

        // documented no-op
        lcdc.set_blend(LayerId::WriteBack, BlendMode::ConstantAlpha, 0x40);
        assert_eq!(regs.peek(WB_CTRL), 0);
    }

    #[test]
    fn chroma_key_splits_channels() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);

        lcdc.set_chroma_key(LayerId::Foreground, 0x00FF00, 0x102030, 0x80);

        assert_eq!(
            regs.peek(CHROMA_G),
            chroma::alpha(0x80) | chroma::replace(0x20) | chroma::match_lo(0xFF) | chroma::match_hi(0xFF)
        );
        assert_eq!(
            regs.peek(CHROMA_R),
            chroma::alpha(0x80) | chroma::replace(0x10)
        );
        assert_ne!(regs.peek(CHROMA_ENA) & chroma_ena::VIDEO_PATH, 0);
        assert_eq!(
            regs.peek(FG_CTRL1) & path_ctrl1::CHROMA_MODE_MASK,
            path_ctrl1::chroma_mode(path_ctrl1::CKEY_RGB)
        );

        lcdc.set_chroma_key_alpha(LayerId::Foreground, 0x20);
        assert_eq!(regs.peek(CHROMA_B) & chroma::ALPHA_MASK, chroma::alpha(0x20));
        // keys survive the alpha-only update
        assert_eq!(
            regs.peek(CHROMA_G) & chroma::MATCH_LO_MASK,
            chroma::match_lo(0xFF)
        );
    }

    #[test]
    fn double_buffer_slots_are_independent() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);

        lcdc.write_address(LayerId::Foreground, 0, 0x2000_0000);
        lcdc.write_address(LayerId::Foreground, 1, 0x2010_0000);

        assert_eq!(regs.peek(FG_ADDR0), 0x2000_0000);
        assert_eq!(regs.peek(FG_ADDR1), 0x2010_0000);
        assert_eq!(lcdc.current_address(LayerId::Foreground, 0), 0x2000_0000);
        assert_eq!(lcdc.current_address(LayerId::Foreground, 1), 0x2010_0000);
    }

    #[test]
    #[should_panic(expected = "display DMA windows")]
    fn rom_address_is_rejected() {
        let (_regs, mut lcdc) = mock_lcdc(DsiMode::Command);
        lcdc.write_address(LayerId::Foreground, 0, 0x0800_0000);
    }

    #[test]
    fn trigger_enable_is_sticky() {
        let (mut regs, mut lcdc) = mock_lcdc(DsiMode::Command);

        lcdc.enable_trigger(LayerId::Foreground, true);
        assert_ne!(regs.peek(FG_CTRL1) & path_ctrl1::TRANS_TRIGGER, 0);

        // a second arm must not rewrite the register
        regs.poke(FG_CTRL1, path_ctrl1::TRANS_TRIGGER | path_ctrl1::alpha(0x11));
        lcdc.enable_trigger(LayerId::Foreground, true);
        assert_eq!(
            regs.peek(FG_CTRL1),
            path_ctrl1::TRANS_TRIGGER | path_ctrl1::alpha(0x11)
        );

        lcdc.enable_trigger(LayerId::Foreground, false);
        assert_eq!(regs.peek(FG_CTRL1) & path_ctrl1::TRANS_TRIGGER, 0);
    }

    #[test]
    fn controller_layer_enable_covers_the_active_area() {
        let (regs, mut lcdc) = mock_lcdc(DsiMode::Command);
        lcdc.set_timing(&super::super::PanelTiming {
            active_width: 240,
            active_height: 240,
            ..Default::default()
        });

        // An in-window address; the mock never scans it, so the pointer
        // is only ever written to a register.
        let fb = 0x2004_0000 as *const u16;
        unsafe {
            lcdc.layer(LayerId::Foreground)
                .enable(fb, ControllerFormat::RGB565);
        }

        assert_eq!(regs.peek(FG_PITCH) & pitch::LINE_MASK, pitch::line(480));
        assert_eq!(regs.peek(FG_CTRL) & path_ctrl::ENA, path_ctrl::ENA);
        assert_eq!(regs.peek(FG_ADDR0), fb as u32);
    }

    #[test]
    fn swap_lands_on_the_inactive_channel() {
        use crate::regs::lcdc::{irq, IRQ_STATUS};

        let (mut regs, mut lcdc) = mock_lcdc(DsiMode::Command);

        // Channel 0 is scanning, so a swap must target channel 1.
        unsafe {
            lcdc.layer(LayerId::Foreground)
                .swap_framebuffer(0x2008_0000 as *const u32);
        }
        assert_eq!(regs.peek(FG_ADDR1), 0x2008_0000);
        assert_eq!(regs.peek(FG_ADDR0), 0);
        assert!(lcdc.layer(LayerId::Foreground).is_swap_pending());

        regs.poke(IRQ_STATUS, irq::FG_FRAME_DONE0 | irq::SPU_FRAME_DONE);
        lcdc.on_interrupt(None);
        assert!(!lcdc.layer(LayerId::Foreground).is_swap_pending());
    }
}
