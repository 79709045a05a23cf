//! LCD composition controller register map
//!
//! Byte offsets from [`LCDC_BASE`](super::LCDC_BASE) and field encoders
//! for the BES2003-class composition engine. Field widths and positions
//! are the hardware contract; encoders mask their argument to the field
//! width and never reject values.
//!
//! The two panel DMA paths (video and graphic) share one register layout
//! at different offsets; [`FG_PATH`] and [`BG_PATH`] collect each path's
//! group so layer code can index them uniformly.

/// Chroma-key participation enables for the panel paths.
pub const CHROMA_ENA: usize = 0x084;

/// Foreground (video DMA) frame address, channel 0.
pub const FG_ADDR0: usize = 0x0C0;
/// Foreground frame address, channel 1.
pub const FG_ADDR1: usize = 0x0D0;
/// Foreground line pitch in bytes.
pub const FG_PITCH: usize = 0x0E0;
/// Foreground on-screen start position.
pub const FG_POS: usize = 0x0E8;
/// Foreground source size.
pub const FG_SIZE: usize = 0x0EC;
/// Foreground zoom target size.
pub const FG_ZOOM: usize = 0x0F0;

/// Background (graphic DMA) frame address, channel 0.
pub const BG_ADDR0: usize = 0x0F4;
/// Background frame address, channel 1.
pub const BG_ADDR1: usize = 0x0F8;
/// Background line pitch in bytes.
pub const BG_PITCH: usize = 0x0FC;
/// Background on-screen start position.
pub const BG_POS: usize = 0x100;
/// Background source size.
pub const BG_SIZE: usize = 0x104;
/// Background zoom target size.
pub const BG_ZOOM: usize = 0x108;

/// Panel total width/height including blanking.
pub const PANEL_TOTAL: usize = 0x114;
/// Smart-panel active area.
pub const SPU_ACTIVE: usize = 0x118;
/// Horizontal front/back porch.
pub const PANEL_H_PORCH: usize = 0x11C;
/// Vertical front/back porch.
pub const PANEL_V_PORCH: usize = 0x120;
/// Background fill color behind all layers.
pub const BLANK_COLOR: usize = 0x124;

/// Chroma key, red channel (alpha, replace, match pair).
pub const CHROMA_R: usize = 0x130;
/// Chroma key, green channel.
pub const CHROMA_G: usize = 0x134;
/// Chroma key, blue channel.
pub const CHROMA_B: usize = 0x138;

/// Panel vsync start/end pixel counts.
pub const VSYNC_PIX_CNT: usize = 0x13C;

/// Smart-panel interface control.
pub const SMPN_CTRL: usize = 0x188;
/// Foreground path control: enable, format, R/B swap.
pub const FG_CTRL: usize = 0x190;
/// Foreground path control 1: blend, chroma mode, transfer trigger,
/// dumb-panel vsync mode.
pub const FG_CTRL1: usize = 0x194;

/// Dumb (video-mode) panel interface control.
pub const DUMB_CTRL: usize = 0x1B8;
/// Panel I/O control: vertical mirror per path.
pub const PANEL_IO_CTRL: usize = 0x1BC;

/// Interrupt enable.
pub const IRQ_ENA: usize = 0x1C0;
/// Raw interrupt status.
pub const IRQ_STATUS: usize = 0x1C4;
/// Interrupt clear, write 1 to clear.
pub const IRQ_CLEAR: usize = 0x1C8;

/// Path swap and AXI read burst control.
pub const TOP_CTRL: usize = 0x1DC;
/// Blend-stage input ordering.
pub const BLEND_SEL: usize = 0x1E8;
/// Dither control.
pub const DITHER_CTRL: usize = 0x1EC;

/// Write-back DMA control and output pitch.
pub const WB_CTRL: usize = 0x200;
/// Write-back target size and frame trigger.
pub const WB_SIZE: usize = 0x204;
/// Write-back frame address.
pub const WB_ADDR: usize = 0x208;

/// Display configuration: TE routing, frame generation, source mux.
pub const DISP_CTRL: usize = 0x210;
/// Hsync length and sync delay line count.
pub const HSYNC_LEN: usize = 0x214;
/// Standby vsync length and start/end lines.
pub const STBY_VSYNC: usize = 0x218;
/// Smart-panel horizontal porches and vsync line count.
pub const PORCH_VSYNC: usize = 0x21C;
/// Vsync start/end pixel positions for the dumb panel path.
pub const VSYNC_PIX: usize = 0x220;
/// Frame generation start.
pub const START_CTRL: usize = 0x224;
/// DSI output format and lane byte order.
pub const DSI_FMT: usize = 0x228;

/// Tearing-effect control.
pub const TE_CTRL: usize = 0x254;
/// Tearing-effect software trigger.
pub const TE_TRIGGER: usize = 0x258;

/// Gamma enable and AXI arbiter fast mode.
pub const MISC_CTRL: usize = 0x260;
/// Background path control: enable, format, R/B swap.
pub const BG_CTRL: usize = 0x264;
/// Background path control 1, same layout as [`FG_CTRL1`].
pub const BG_CTRL1: usize = 0x268;

/// One panel DMA path's register group.
pub struct DmaPathRegs {
    /// Frame address slots, one per double-buffer channel.
    pub addr: [usize; 2],
    pub pitch: usize,
    pub pos: usize,
    pub size: usize,
    pub zoom: usize,
    pub ctrl: usize,
    pub ctrl1: usize,
}

/// Video DMA path register group (foreground layer).
pub const FG_PATH: DmaPathRegs = DmaPathRegs {
    addr: [FG_ADDR0, FG_ADDR1],
    pitch: FG_PITCH,
    pos: FG_POS,
    size: FG_SIZE,
    zoom: FG_ZOOM,
    ctrl: FG_CTRL,
    ctrl1: FG_CTRL1,
};

/// Graphic DMA path register group (background layer).
pub const BG_PATH: DmaPathRegs = DmaPathRegs {
    addr: [BG_ADDR0, BG_ADDR1],
    pitch: BG_PITCH,
    pos: BG_POS,
    size: BG_SIZE,
    zoom: BG_ZOOM,
    ctrl: BG_CTRL,
    ctrl1: BG_CTRL1,
};

/// `FG_CTRL` / `BG_CTRL` fields.
pub mod path_ctrl {
    /// DMA path enable.
    pub const ENA: u32 = 1 << 0;
    /// YUV-to-RGB conversion enable, set for YUV source formats.
    pub const YUV2RGB_ENA: u32 = 1 << 1;
    /// Swap R and B channels on fetch.
    pub const SWAP_RB: u32 = 1 << 4;
    /// Per-path transfer start.
    pub const START: u32 = 1 << 5;

    pub const FORMAT_MASK: u32 = 0xF << 8;
    /// Color-mode code, see [`cm_dma`](super::cm_dma).
    pub const fn format(code: u32) -> u32 {
        (code & 0xF) << 8
    }
}

/// `FG_CTRL1` / `BG_CTRL1` fields.
pub mod path_ctrl1 {
    pub const ALPHA_MASK: u32 = 0xFF << 8;
    /// Constant blend alpha.
    pub const fn alpha(a: u32) -> u32 {
        (a & 0xFF) << 8
    }

    pub const ALPHA_MODE_MASK: u32 = 0x3 << 16;
    pub const fn alpha_mode(m: u32) -> u32 {
        (m & 0x3) << 16
    }
    /// Alpha taken from the first (top) layer's pixels.
    pub const AM_FIRST_PIXEL: u32 = 0;
    /// Alpha taken from the second (bottom) layer's pixels.
    pub const AM_SECOND_PIXEL: u32 = 1;
    /// Constant alpha from the `alpha` field.
    pub const AM_CONST: u32 = 2;
    /// Blending off.
    pub const AM_NONE: u32 = 3;

    pub const CHROMA_MODE_MASK: u32 = 0x7 << 24;
    pub const fn chroma_mode(m: u32) -> u32 {
        (m & 0x7) << 24
    }
    pub const CKEY_DISABLE: u32 = 0x0;
    pub const CKEY_R: u32 = 0x1;
    pub const CKEY_G: u32 = 0x2;
    pub const CKEY_RGB: u32 = 0x3;
    pub const CKEY_B: u32 = 0x4;

    /// Dumb-panel vsync trigger mode. The field shares bits 28-31 with
    /// [`TRANS_TRIGGER`]; programming one rewrites the other's bits.
    pub const DUMB_MODE_MASK: u32 = 0xF << 28;
    pub const fn dumb_mode(m: u32) -> u32 {
        (m & 0xF) << 28
    }

    /// Panel-path DMA transfer trigger.
    pub const TRANS_TRIGGER: u32 = 1 << 31;
}

/// `CHROMA_ENA` fields.
pub mod chroma_ena {
    /// Chroma keying participates on the video DMA path.
    pub const VIDEO_PATH: u32 = 1 << 18;
    /// Chroma keying participates on the graphic DMA path.
    pub const GRAPHIC_PATH: u32 = 1 << 19;
}

/// `CHROMA_R` / `CHROMA_G` / `CHROMA_B` fields, one register per color
/// channel: replacement alpha, replacement value and a matched pair of
/// key values.
pub mod chroma {
    pub const ALPHA_MASK: u32 = 0xFF;
    pub const fn alpha(a: u32) -> u32 {
        a & 0xFF
    }

    pub const REPLACE_MASK: u32 = 0xFF << 8;
    /// Channel value substituted on a key match.
    pub const fn replace(v: u32) -> u32 {
        (v & 0xFF) << 8
    }

    pub const MATCH_LO_MASK: u32 = 0xFF << 16;
    pub const fn match_lo(v: u32) -> u32 {
        (v & 0xFF) << 16
    }

    pub const MATCH_HI_MASK: u32 = 0xFF << 24;
    pub const fn match_hi(v: u32) -> u32 {
        (v & 0xFF) << 24
    }
}

/// `FG_PITCH` / `BG_PITCH` and the write-back pitch half of `WB_CTRL`.
pub mod pitch {
    pub const LINE_MASK: u32 = 0xFFFF;
    /// Panel-path line pitch in bytes.
    pub const fn line(p: u32) -> u32 {
        p & 0xFFFF
    }

    pub const WB_LINE_MASK: u32 = 0xFFFF << 16;
    /// Write-back line pitch, upper half of `WB_CTRL`.
    pub const fn wb_line(p: u32) -> u32 {
        (p & 0xFFFF) << 16
    }
}

/// `FG_POS` / `BG_POS` fields.
pub mod pos {
    pub const X_MASK: u32 = 0xFFF;
    pub const fn x(v: u32) -> u32 {
        v & 0xFFF
    }

    pub const Y_MASK: u32 = 0xFFF << 16;
    pub const fn y(v: u32) -> u32 {
        (v & 0xFFF) << 16
    }

    /// Hold the DMA frame at the configured position.
    pub const FRAME_FIX: u32 = 1 << 31;
}

/// Width/height pairs: `FG_SIZE`, `BG_SIZE`, `FG_ZOOM`, `BG_ZOOM`,
/// `SPU_ACTIVE`, `PANEL_TOTAL`.
pub mod extent {
    pub const H_MASK: u32 = 0xFFF;
    pub const fn h(v: u32) -> u32 {
        v & 0xFFF
    }

    pub const V_MASK: u32 = 0xFFF << 16;
    pub const fn v(v: u32) -> u32 {
        (v & 0xFFF) << 16
    }
}

/// `PANEL_H_PORCH` / `PANEL_V_PORCH` fields.
pub mod porch {
    pub const FRONT_MASK: u32 = 0xFFF;
    pub const fn front(v: u32) -> u32 {
        v & 0xFFF
    }

    pub const BACK_MASK: u32 = 0xFFF << 16;
    pub const fn back(v: u32) -> u32 {
        (v & 0xFFF) << 16
    }
}

/// `VSYNC_PIX_CNT` fields.
pub mod vsync_pix_cnt {
    pub const START_MASK: u32 = 0xFFF;
    pub const fn start(v: u32) -> u32 {
        v & 0xFFF
    }

    pub const END_MASK: u32 = 0xFFF << 16;
    pub const fn end(v: u32) -> u32 {
        (v & 0xFFF) << 16
    }
}

/// `SMPN_CTRL` fields.
pub mod smpn {
    /// Smart-panel interface enable.
    pub const ENA: u32 = 1 << 0;
    /// Smart-panel controller out of reset.
    pub const RSTB: u32 = 1 << 3;
    /// Swap the two bytes of each output cycle.
    pub const SWAP_BYTES: u32 = 1 << 6;

    pub const MODE_MASK: u32 = 0xF << 8;
    /// Interface cycle mode, see `MODE_*`.
    pub const fn mode(m: u32) -> u32 {
        (m & 0xF) << 8
    }
    /// One cycle per pixel, 32-bit bus.
    pub const MODE_1CYC_32BIT: u32 = 3;
    /// RGB565, one cycle per pixel.
    pub const MODE_RGB565: u32 = 5;

    pub const VSYNC_DELAY_MASK: u32 = 0x3 << 14;
    pub const fn vsync_delay(m: u32) -> u32 {
        (m & 0x3) << 14
    }
}

/// `DUMB_CTRL` fields.
pub mod dumb {
    /// Dumb-panel interface enable.
    pub const ENA: u32 = 1 << 0;
}

/// `PANEL_IO_CTRL` fields.
pub mod io_ctrl {
    /// Vertical mirror on the video DMA path.
    pub const VIDEO_VMIRROR: u32 = 1 << 13;
    /// Vertical mirror on the graphic DMA path.
    pub const GRAPHIC_VMIRROR: u32 = 1 << 15;
}

/// Interrupt bits, common to `IRQ_ENA`, `IRQ_STATUS` and `IRQ_CLEAR`.
pub mod irq {
    /// Video DMA frame done, channel 0.
    pub const FG_FRAME_DONE0: u32 = 1 << 31;
    /// Video DMA frame done, channel 1.
    pub const FG_FRAME_DONE1: u32 = 1 << 30;
    /// Video DMA FIFO underflow.
    pub const FG_UNDERFLOW: u32 = 1 << 29;
    /// AXI master bus error.
    pub const AXI_ERROR: u32 = 1 << 28;
    /// Graphic DMA frame done, channel 0.
    pub const BG_FRAME_DONE0: u32 = 1 << 27;
    /// Graphic DMA frame done, channel 1.
    pub const BG_FRAME_DONE1: u32 = 1 << 26;
    /// Graphic DMA FIFO underflow.
    pub const BG_UNDERFLOW: u32 = 1 << 25;
    /// Panel vsync.
    pub const PANEL_VSYNC: u32 = 1 << 23;
    /// Dumb-panel frame done.
    pub const DUMB_FRAME_DONE: u32 = 1 << 22;
    /// Smart-panel TX frame done.
    pub const SPU_FRAME_DONE: u32 = 1 << 21;
    /// Power-down request.
    pub const POWER_DOWN: u32 = 1 << 17;
    /// AXI latency error.
    pub const ERR_LATENCY: u32 = 1 << 16;

    /// Conditions that latch the controller into a fatal error state.
    pub const FATAL: u32 = AXI_ERROR | ERR_LATENCY;
    /// Self-healing lost-frame conditions.
    pub const UNDERFLOW: u32 = FG_UNDERFLOW | BG_UNDERFLOW;
}

/// `TOP_CTRL` fields.
pub mod top {
    /// Select the graphic path as the top blend input.
    pub const SWAP_PATH: u32 = 1 << 17;
    /// Path swap select takes effect.
    pub const SWAP_ENA: u32 = 1 << 16;

    pub const BURST_MASK: u32 = 0xF << 8;
    /// AXI read burst length for the swap path.
    pub const fn burst(n: u32) -> u32 {
        (n & 0xF) << 8
    }
}

/// `BLEND_SEL` fields.
pub mod blend_sel {
    pub const FIRST_MASK: u32 = 0x3;
    /// Blend-stage first (top) input.
    pub const fn first(n: u32) -> u32 {
        n & 0x3
    }

    pub const SECOND_MASK: u32 = 0x3 << 2;
    /// Blend-stage second (bottom) input.
    pub const fn second(n: u32) -> u32 {
        (n & 0x3) << 2
    }
}

/// `DITHER_CTRL` fields.
pub mod dither {
    pub const ENA: u32 = 1 << 0;
    /// 4x8 dither matrix instead of 4x4.
    pub const MODE_4X8: u32 = 1 << 1;

    pub const MODE_MASK: u32 = 0x7 << 4;
    /// Output channel width profile, see `MODE_*`.
    pub const fn mode(m: u32) -> u32 {
        (m & 0x7) << 4
    }
    pub const MODE_RGB444: u32 = 0;
    pub const MODE_RGB565: u32 = 1;
    pub const MODE_RGB666: u32 = 2;

    pub const TABLE_MASK: u32 = 0x3 << 16;
    pub const fn table(n: u32) -> u32 {
        (n & 0x3) << 16
    }
}

/// `WB_CTRL` fields. The output pitch shares this register, see
/// [`pitch::wb_line`].
pub mod wb_ctrl {
    /// Write-back DMA enable.
    pub const ENA: u32 = 1 << 0;

    pub const FORMAT_MASK: u32 = 0x3 << 4;
    /// Output color-mode code, see [`cm_wb`](super::cm_wb).
    pub const fn format(code: u32) -> u32 {
        (code & 0x3) << 4
    }

    pub const BURST_MASK: u32 = 0x1F << 8;
    /// AXI write burst length.
    pub const fn burst(n: u32) -> u32 {
        (n & 0x1F) << 8
    }
}

/// `WB_SIZE` fields.
pub mod wb_size {
    pub const WIDTH_MASK: u32 = 0x1FFF;
    pub const fn width(v: u32) -> u32 {
        v & 0x1FFF
    }

    pub const HEIGHT_MASK: u32 = 0xFFF << 16;
    pub const fn height(v: u32) -> u32 {
        (v & 0xFFF) << 16
    }

    /// One write-back frame per trigger.
    pub const FPT: u32 = 1 << 28;
    /// Frame trigger toggle field; flipping any bit starts a frame.
    pub const TOGGLE_MASK: u32 = 0xF << 28;
}

/// `DISP_CTRL` fields.
pub mod disp {
    /// Disable the software vsync trigger.
    pub const SVSYNC_TRIG_DISABLE: u32 = 1 << 0;
    /// Disable the hardware (auto) vsync trigger.
    pub const AVSYNC_TRIG_DISABLE: u32 = 1 << 1;
    /// Route TE around the frame state machine.
    pub const TE_BYPASS: u32 = 1 << 2;
    /// TE source select.
    pub const TE_SEL: u32 = 1 << 3;
    /// TE active edge select, set for rising.
    pub const TE_EDGE_SEL: u32 = 1 << 4;
    /// TE hardware trigger mode.
    pub const TE_MODE: u32 = 1 << 5;

    pub const NFRAME_ACTIVE_MASK: u32 = 0xFF << 6;
    /// Frames pushed per TE trigger.
    pub const fn nframe_active(n: u32) -> u32 {
        (n & 0xFF) << 6
    }

    pub const EXTRA_DELAY_MASK: u32 = 0x3FF << 14;
    /// Extra line delay before frame start.
    pub const fn extra_delay(n: u32) -> u32 {
        (n & 0x3FF) << 14
    }

    /// Clear the latched TE event.
    pub const TE_CLR: u32 = 1 << 24;
    /// Mask the TE input.
    pub const TE_MASK: u32 = 1 << 25;
    /// DSI double-rate clock enable.
    pub const DSI_DR: u32 = 1 << 26;
    /// Backlight output enable.
    pub const BACKLIGHT_EN: u32 = 1 << 27;
    /// Software frame generation (frame valid).
    pub const GEN_FRAME: u32 = 1 << 29;
    /// Composition memory path enable (command-mode panels).
    pub const MEM_ENABLE: u32 = 1 << 30;
    /// Select the dumb panel as the DSI pixel source.
    pub const DSI_SOURCE_SEL: u32 = 1 << 31;
}

/// `HSYNC_LEN` fields.
pub mod hsync {
    pub const LENGTH_MASK: u32 = 0xFFFF;
    /// Hsync length in pixels.
    pub const fn length(v: u32) -> u32 {
        v & 0xFFFF
    }

    pub const DELAY_LINES_MASK: u32 = 0x3FF << 16;
    /// Sync delay in lines.
    pub const fn delay_lines(v: u32) -> u32 {
        (v & 0x3FF) << 16
    }
}

/// `STBY_VSYNC` fields.
pub mod stby_vsync {
    pub const LENGTH_MASK: u32 = 0xFFF;
    /// Standby vsync length in pixels.
    pub const fn length(v: u32) -> u32 {
        v & 0xFFF
    }

    pub const START_LINE_MASK: u32 = 0xFF << 12;
    pub const fn start_line(v: u32) -> u32 {
        (v & 0xFF) << 12
    }

    pub const END_LINE_MASK: u32 = 0xFF << 20;
    pub const fn end_line(v: u32) -> u32 {
        (v & 0xFF) << 20
    }
}

/// `PORCH_VSYNC` fields.
pub mod porch_vsync {
    pub const H_FRONT_MASK: u32 = 0xFFF;
    pub const fn h_front(v: u32) -> u32 {
        v & 0xFFF
    }

    pub const H_BACK_MASK: u32 = 0xFFF << 12;
    pub const fn h_back(v: u32) -> u32 {
        (v & 0xFFF) << 12
    }

    pub const VSYNC_LINES_MASK: u32 = 0xFF << 24;
    pub const fn vsync_lines(v: u32) -> u32 {
        (v & 0xFF) << 24
    }
}

/// `VSYNC_PIX` fields.
pub mod vsync_pix {
    pub const START_MASK: u32 = 0xFFFF;
    pub const fn start(v: u32) -> u32 {
        v & 0xFFFF
    }

    pub const END_MASK: u32 = 0xFFFF << 16;
    pub const fn end(v: u32) -> u32 {
        (v & 0xFFFF) << 16
    }
}

/// `START_CTRL` fields.
pub mod start {
    /// Start frame generation.
    pub const ENA: u32 = 1 << 0;
}

/// `DSI_FMT` fields.
pub mod dsi_fmt {
    pub const DATA_SWAP_MASK: u32 = 0x7 << 25;
    /// Output component order, see `SWAP_*`.
    pub const fn data_swap(n: u32) -> u32 {
        (n & 0x7) << 25
    }
    pub const SWAP_BGR: u32 = 0;
    pub const SWAP_RGB: u32 = 5;

    /// One-hot output format selects, bits 28-31.
    pub const FMT_MASK: u32 = 0xF << 28;
    pub const FMT_RGB888: u32 = 1 << 28;
    pub const FMT_RGB666: u32 = 1 << 29;
    pub const FMT_RGB565: u32 = 1 << 30;
    pub const FMT_RGB101010: u32 = 1 << 31;
}

/// `TE_CTRL` fields.
pub mod te {
    /// Use the software TE trigger instead of the panel TE line.
    pub const USE_SW: u32 = 1 << 9;
}

/// `MISC_CTRL` fields.
pub mod misc {
    /// AXI bus arbiter fast mode.
    pub const AXI_FASTMODE: u32 = 1 << 27;
    /// Gamma correction enable.
    pub const GAMMA_ENA: u32 = 1 << 30;
}

/// Panel DMA path color-mode codes, programmed through
/// [`path_ctrl::format`]. Bit 7 marks the R/B-swapped variant of a code
/// and is programmed separately as [`path_ctrl::SWAP_RB`].
pub mod cm_dma {
    pub const RGB565: u32 = 0x0;
    pub const RGB1555: u32 = 0x1;
    pub const RGB888_PACKED: u32 = 0x2;
    pub const RGB888_UNPACKED: u32 = 0x3;
    pub const ARGB8888: u32 = 0x4;
    pub const YUV422_PACKED: u32 = 0x5;
    pub const YUV422_PLANAR: u32 = 0x6;
    pub const YUV420_PLANAR: u32 = 0x7;
    pub const PAL4: u32 = 0x9;
    pub const PAL8: u32 = 0xA;
    pub const RGBA8888: u32 = 0xB;
    /// R/B swap marker carried in the code tables.
    pub const SWAP_RB: u32 = 0x80;
}

/// Write-back (output) color-mode codes, programmed through
/// [`wb_ctrl::format`]. Bit 7 as in [`cm_dma`].
pub mod cm_wb {
    pub const RGB565: u32 = 0x0;
    pub const RGB888_PACKED: u32 = 0x1;
    pub const ARGB8888: u32 = 0x2;
    pub const RGBA8888: u32 = 0x3;
    /// R/B swap marker carried in the code tables.
    pub const SWAP_RB: u32 = 0x80;
}
