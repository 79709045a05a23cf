//! Time units

use core::fmt;

use crate::hal::blocking::delay::DelayUs;

/// Hertz
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Hertz(pub u32);

/// KiloHertz
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct KiloHertz(pub u32);

/// MegaHertz
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct MegaHertz(pub u32);

/// MilliSeconds
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub struct MilliSeconds(pub u32);

/// MicroSeconds
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub struct MicroSeconds(pub u32);

impl fmt::Display for Hertz {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}
impl fmt::Display for KiloHertz {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} kHz", self.0)
    }
}
impl fmt::Display for MegaHertz {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} MHz", self.0)
    }
}
impl fmt::Display for MilliSeconds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ms", self.0)
    }
}
impl fmt::Display for MicroSeconds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} us", self.0)
    }
}

/// Extension trait that adds convenience methods to the `u32` type
pub trait U32Ext {
    /// Wrap in `Hertz`
    fn hz(self) -> Hertz;

    /// Wrap in `KiloHertz`
    fn khz(self) -> KiloHertz;

    /// Wrap in `MegaHertz`
    fn mhz(self) -> MegaHertz;

    /// Wrap in "MilliSeconds"
    fn ms(self) -> MilliSeconds;

    /// Wrap in "MicroSeconds"
    fn us(self) -> MicroSeconds;
}

impl U32Ext for u32 {
    fn hz(self) -> Hertz {
        Hertz(self)
    }

    fn khz(self) -> KiloHertz {
        KiloHertz(self)
    }

    fn mhz(self) -> MegaHertz {
        MegaHertz(self)
    }

    fn ms(self) -> MilliSeconds {
        MilliSeconds(self)
    }

    fn us(self) -> MicroSeconds {
        MicroSeconds(self)
    }
}

// Unit conversions
impl Into<Hertz> for KiloHertz {
    fn into(self) -> Hertz {
        Hertz(self.0 * 1_000)
    }
}

impl Into<Hertz> for MegaHertz {
    fn into(self) -> Hertz {
        Hertz(self.0 * 1_000_000)
    }
}

impl Into<KiloHertz> for MegaHertz {
    fn into(self) -> KiloHertz {
        KiloHertz(self.0 * 1_000)
    }
}

impl Into<MicroSeconds> for MilliSeconds {
    fn into(self) -> MicroSeconds {
        MicroSeconds(self.0 * 1_000)
    }
}

/// Monotonic microsecond time source used to bound polling loops.
///
/// The link layer contains a handful of operations (bus-turnaround reads,
/// ULPS entry) that poll hardware flags with a hard upper bound on the
/// wait. Those paths take the time source as a parameter rather than
/// reading a cycle counter directly, so the timeout behaviour itself can
/// be exercised without hardware.
///
/// Implementations also provide busy-wait delays through the
/// `embedded_hal` [`DelayUs`] trait.
pub trait DelayClock: DelayUs<u32> {
    /// Current value of a free-running microsecond counter.
    ///
    /// The counter may wrap; callers compute elapsed time with wrapping
    /// subtraction.
    fn now_us(&mut self) -> u32;
}

/// Virtual microsecond clock for host tests.
///
/// Time advances only when a driver sleeps on it, so a test observes
/// exactly how long a polling path claimed to wait.
#[cfg(test)]
pub(crate) struct TestClock {
    now: u32,
}

#[cfg(test)]
impl TestClock {
    pub fn new() -> Self {
        TestClock { now: 0 }
    }

    /// Total virtual time the driver has slept.
    pub fn elapsed(&self) -> u32 {
        self.now
    }
}

#[cfg(test)]
impl DelayUs<u32> for TestClock {
    fn delay_us(&mut self, us: u32) {
        self.now = self.now.wrapping_add(us);
    }
}

#[cfg(test)]
impl DelayClock for TestClock {
    fn now_us(&mut self) -> u32 {
        self.now
    }
}
