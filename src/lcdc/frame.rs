//! Frame triggering and the display interrupt

use log::{error, warn};

use super::layer::LayerId;
use super::Lcdc;
use crate::dsi::DsiMode;
use crate::regs::barrier;
use crate::regs::lcdc::{
    disp, irq, smpn, start, te, wb_size, DISP_CTRL, IRQ_CLEAR, IRQ_ENA, IRQ_STATUS, SMPN_CTRL,
    START_CTRL, TE_CTRL, TE_TRIGGER, WB_CTRL, WB_SIZE,
};

/// Interrupt line shared between the composition controller and the DSI
/// host.
const DISPLAY_IRQ: u16 = 70;

/// Where the frame engine currently sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    /// No frame armed.
    Idle,
    /// A software-triggered frame is queued for the next vsync.
    ArmedSoftware,
    /// The smart-panel path pushes one frame per TE edge until
    /// disarmed. The engine stays in this state across frames.
    ArmedHardwareTe,
    /// Scan-out in progress.
    Scanning,
}

/// Frame engine faults.
///
/// Only bus-level faults surface here; FIFO underflows are reported
/// through the log and heal on the next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// AXI master error or latency overrun. The engine refuses new
    /// frames until [`Lcdc::clear_error`] runs.
    Fatal,
}

/// Per-frame notifications out of [`Lcdc::on_interrupt`].
pub trait FrameCallback {
    /// A DMA path finished scanning the given address channel.
    fn frame_done(&mut self, layer: LayerId, channel: u8);

    /// The controller latched a fault.
    fn fault(&mut self, _error: Error) {}
}

/// Software model of the frame engine: trigger state, the address
/// channel each path scans from, and swap bookkeeping for the
/// double-buffer channels.
pub(crate) struct FrameSync {
    state: FrameState,
    channel: [u8; 2],
    pending: [bool; 2],
    fatal: bool,
}

impl FrameSync {
    pub fn new() -> Self {
        FrameSync {
            state: FrameState::Idle,
            channel: [0; 2],
            pending: [false; 2],
            fatal: false,
        }
    }

    /// Address channel the path scans from next.
    pub fn scan_channel(&self, path: usize) -> u8 {
        self.channel[path]
    }

    pub fn mark_swap_pending(&mut self, path: usize) {
        self.pending[path] = true;
    }

    pub fn swap_pending(&self, path: usize) -> bool {
        self.pending[path]
    }
}

impl Lcdc {
    /// Current frame engine state.
    pub fn state(&self) -> FrameState {
        self.sync.state
    }

    /// Whether a fatal fault is latched.
    pub fn has_fatal_error(&self) -> bool {
        self.sync.fatal
    }

    /// Queues one software-triggered frame.
    ///
    /// Raises frame-valid and the start bit; the hardware consumes both
    /// at the next internal vsync. Refused while a fatal fault is
    /// latched.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.sync.fatal {
            return Err(Error::Fatal);
        }
        self.rb.set_bits(DISP_CTRL, disp::GEN_FRAME);
        self.rb.set_bits(START_CTRL, start::ENA);
        self.sync.state = FrameState::ArmedSoftware;
        Ok(())
    }

    /// Arms the smart-panel path for one frame per TE edge.
    ///
    /// Frame-valid stays low so the panel's TE line paces scan-out. In
    /// command mode this also enables the smart-panel transmit unit and
    /// shuts the write-back channel, which shares the output stage.
    pub fn start_te(&mut self) -> Result<(), Error> {
        if self.sync.fatal {
            return Err(Error::Fatal);
        }
        self.rb.clear_bits(DISP_CTRL, disp::GEN_FRAME);
        if self.mode == DsiMode::Command {
            self.rb.set_bits(SMPN_CTRL, smpn::ENA);
        }
        self.rb.write(WB_CTRL, 0);
        self.rb.set_bits(TE_CTRL, te::USE_SW);
        // Rewriting the trigger register latches the armed state.
        self.rb.modify(TE_TRIGGER, |v| v);
        self.sync.state = FrameState::ArmedHardwareTe;
        Ok(())
    }

    /// Queues one composition pass into the write-back layer.
    pub fn start_writeback(&mut self) -> Result<(), Error> {
        self.start()
    }

    /// Issues a software TE pulse.
    ///
    /// Stand-in for the panel TE line when the engine is armed through
    /// [`Lcdc::start_te`] but the line is not wired.
    pub fn te_trigger(&mut self) {
        self.rb.modify(TE_TRIGGER, |v| v);
        if self.sync.state == FrameState::ArmedHardwareTe {
            self.sync.state = FrameState::Scanning;
        }
    }

    /// Limits the write-back DMA to one frame per trigger.
    pub fn set_writeback_one_frame_per_trigger(&mut self) {
        self.rb.set_bits(WB_SIZE, wb_size::FPT);
    }

    /// Flips the write-back frame toggle, starting one capture.
    pub fn toggle_writeback_frame(&mut self) {
        self.rb.modify(WB_SIZE, |v| v ^ wb_size::TOGGLE_MASK);
    }

    /// Unmasks the display interrupt sources for the configured mode.
    ///
    /// Video mode completes frames at the dumb-panel output and paces on
    /// panel vsync; command mode completes at the smart-panel transmit
    /// unit. Both watch the per-channel DMA frame-done bits, FIFO
    /// underflow and the bus fault sources.
    pub fn irq_enable(&mut self) {
        let mut ena = irq::FG_FRAME_DONE0
            | irq::FG_FRAME_DONE1
            | irq::BG_FRAME_DONE0
            | irq::BG_FRAME_DONE1
            | irq::UNDERFLOW
            | irq::FATAL;
        ena |= match self.mode {
            DsiMode::Video => irq::DUMB_FRAME_DONE | irq::PANEL_VSYNC,
            DsiMode::Command => irq::SPU_FRAME_DONE,
        };
        self.rb.write(IRQ_ENA, ena);
    }

    /// Masks every display interrupt source.
    pub fn irq_disable(&mut self) {
        self.rb.write(IRQ_ENA, 0);
    }

    /// Clears a latched fatal fault and re-admits frame triggers.
    pub fn clear_error(&mut self) {
        self.rb.write(IRQ_CLEAR, irq::FATAL);
        barrier();
        self.sync.fatal = false;
    }

    /// Display interrupt service body.
    ///
    /// Reads the status register exactly once and classifies every
    /// asserted source. DMA frame-done bits flip the tracked scan
    /// channel of their path and reach `callback`; with no callback
    /// registered the same frame is re-triggered so the panel keeps
    /// refreshing. Underflows log a lost frame and heal on their own; a
    /// bus fault latches [`Error::Fatal`] and stops frame delivery.
    pub fn on_interrupt(&mut self, mut callback: Option<&mut dyn FrameCallback>) {
        let status = self.rb.read(IRQ_STATUS);
        if status == 0 {
            return;
        }

        if status & irq::FATAL != 0 {
            error!("lcdc: bus fault, status {:#010x}", status);
            self.rb.write(IRQ_CLEAR, status & irq::FATAL);
            self.sync.fatal = true;
            self.sync.state = FrameState::Idle;
            if let Some(cb) = callback {
                cb.fault(Error::Fatal);
            }
            return;
        }

        if status & irq::UNDERFLOW != 0 {
            warn!("lcdc: fifo underflow, frame lost, status {:#010x}", status);
            self.rb.write(IRQ_CLEAR, status & irq::UNDERFLOW);
        }

        if status & irq::PANEL_VSYNC != 0 {
            self.rb.write(IRQ_CLEAR, irq::PANEL_VSYNC);
            if self.sync.state == FrameState::ArmedSoftware {
                self.sync.state = FrameState::Scanning;
            }
        }

        let output_done = match self.mode {
            DsiMode::Video => irq::DUMB_FRAME_DONE,
            DsiMode::Command => irq::SPU_FRAME_DONE,
        };
        if status & output_done != 0 {
            self.rb.write(IRQ_CLEAR, output_done);
        }

        const CHANNELS: [(u32, LayerId, u8, usize); 4] = [
            (irq::FG_FRAME_DONE0, LayerId::Foreground, 0, 0),
            (irq::FG_FRAME_DONE1, LayerId::Foreground, 1, 0),
            (irq::BG_FRAME_DONE0, LayerId::Background, 0, 1),
            (irq::BG_FRAME_DONE1, LayerId::Background, 1, 1),
        ];
        let mut fired = false;
        for &(bit, layer, channel, path) in CHANNELS.iter() {
            if status & bit == 0 {
                continue;
            }
            self.rb.write(IRQ_CLEAR, bit);
            // The just-finished channel becomes the back buffer.
            self.sync.channel[path] = channel ^ 1;
            self.sync.pending[path] = false;
            fired = true;
            if let Some(cb) = callback.as_deref_mut() {
                cb.frame_done(layer, channel);
            }
        }

        if fired || status & output_done != 0 {
            if self.sync.state != FrameState::ArmedHardwareTe {
                self.sync.state = FrameState::Idle;
            }
            if callback.is_none() && self.sync.state == FrameState::Idle {
                // Free-running fallback: keep the panel refreshing with
                // the configuration already programmed.
                let _ = self.start();
            }
        }
    }

    /// NVIC line the controller interrupts on.
    pub const fn irq_number() -> u16 {
        DISPLAY_IRQ
    }
}
