//! Hardware abstraction layer for the display pipeline of BES2003-class
//! SoCs: the MIPI-DSI host/PHY controller and the LCD composition
//! controller (LCDC) that feeds it.
//!
//! The two peripherals are modelled as owned handles:
//!
//! - [`dsi::DsiHost`] brings up the D-PHY, carries DCS commands to and from
//!   the panel, and manages the low-power (ULPS) and tearing-effect
//!   signalling on the link.
//! - [`lcdc::Lcdc`] owns the composition engine: panel timing, up to four
//!   blending layers with double-buffered DMA, write-back capture and the
//!   frame synchronization state machine.
//!
//! Register access goes through the hand-written maps in [`regs`]; there is
//! no vendor PAC for this part. Handles are constructed over the fixed
//! peripheral base addresses, or over an alternate base for platforms that
//! remap the AHB window.
//!
//! Logging uses the `log` facade throughout. The crate never installs a
//! logger.

#![cfg_attr(not(test), no_std)]

pub use embedded_hal as hal;

pub mod dsi;
pub mod lcdc;
pub mod prelude;
pub mod regs;
pub mod time;
