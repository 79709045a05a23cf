//! Prelude
pub use embedded_hal::prelude::*;

pub use crate::lcdc::DisplayClockControl as _bes2003_display_hal_lcdc_DisplayClockControl;
pub use crate::lcdc::FrameCallback as _bes2003_display_hal_lcdc_FrameCallback;
pub use crate::time::DelayClock as _bes2003_display_hal_time_DelayClock;
pub use crate::time::U32Ext as _bes2003_display_hal_time_U32Ext;
pub use embedded_display_controller::DisplayController as _edc_DisplayController;
pub use embedded_display_controller::DisplayControllerLayer as _edc_DisplayControllerLayer;
