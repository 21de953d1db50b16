//! Echo pulse capture: edge pairing, atomic publication, and TIM3 input-capture setup.
//!
//! The echo line is routed to a timer input-capture channel configured for both edges. Each edge
//! interrupt feeds the latched timestamp into a [`PulseCapture`], which pairs rising and falling
//! edges into a pulse width; the width is then published through an [`EchoCapture`] cell that the
//! foreground measurement code polls.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Bit above the 16-bit width that carries the new-data toggle flag.
const FLAG_BIT: u32 = 1 << 16;

/// Shared cell through which the capture interrupt publishes completed pulse widths.
///
/// The elapsed tick count and the new-data flag live in one word: the low 16 bits hold the width,
/// bit 16 toggles once per publication. Consumers load the word once and get a consistent pair, so
/// a flipped flag can never be observed next to a stale width.
///
/// The cell binds to at most one driver instance for its lifetime.
pub struct EchoCapture {
    word: AtomicU32,
    bound: AtomicBool,
}

impl EchoCapture {
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
            bound: AtomicBool::new(false),
        }
    }

    /// Claim the cell for a driver instance. Returns false if it was already claimed.
    pub(crate) fn try_bind(&self) -> bool {
        !self.bound.swap(true, Ordering::AcqRel)
    }

    /// Publish a completed pulse width and flip the new-data flag, as one store.
    ///
    /// Interrupt side only; there is a single writer, so a plain read-modify-store is enough.
    pub fn publish(&self, width_ticks: u16) {
        let prev = self.word.load(Ordering::Relaxed);
        let flag = (prev ^ FLAG_BIT) & FLAG_BIT;
        self.word.store(flag | u32::from(width_ticks), Ordering::Release);
    }

    /// One consistent view of `(elapsed_ticks, new_data_flag)`.
    #[inline]
    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot(self.word.load(Ordering::Acquire))
    }
}

/// A single loaded view of the capture cell.
#[derive(Copy, Clone, Debug)]
pub struct CaptureSnapshot(u32);

impl CaptureSnapshot {
    /// New-data flag at the time of the load. Toggles once per completed echo.
    #[inline]
    pub fn flag(&self) -> bool {
        self.0 & FLAG_BIT != 0
    }

    /// Pulse width, in ticks, carried by the same load.
    #[inline]
    pub fn elapsed_ticks(&self) -> u16 {
        self.0 as u16
    }
}

/// Pairs raw edge timestamps into pulse widths.
///
/// Owned by the interrupt context; edge parity is tracked here, independent of the new-data flag.
/// The counter is 16-bit, so a pulse that straddles a counter wrap needs the full 2^16 modulus
/// added back; `u16::wrapping_sub` is exactly that correction.
pub struct PulseCapture {
    first: u16,
    awaiting_second: bool,
}

impl PulseCapture {
    pub const fn new() -> Self {
        Self {
            first: 0,
            awaiting_second: false,
        }
    }

    /// Feed one raw edge timestamp; yields the pulse width on every second edge.
    pub fn on_edge(&mut self, timestamp: u16) -> Option<u16> {
        if self.awaiting_second {
            self.awaiting_second = false;
            Some(timestamp.wrapping_sub(self.first))
        } else {
            self.first = timestamp;
            self.awaiting_second = true;
            None
        }
    }
}

#[cfg(feature = "stm32f7")]
use crate::hw::ticks::Tim3Ticks;
#[cfg(feature = "stm32f7")]
use stm32f7xx_hal::pac;

/// TIM3 configured as the ranging timebase: free-running 16-bit count at 1 MHz, input capture on
/// CH1 for both edges of the echo line, capture interrupt enabled.
#[cfg(feature = "stm32f7")]
pub struct CaptureTimer {
    tim: pac::TIM3,
}

#[cfg(feature = "stm32f7")]
impl CaptureTimer {
    /// Configure TIM3. `prescaler` is the APB1 timer-clock divider minus one; pick it so one tick
    /// is one microsecond.
    pub fn tim3(tim3: pac::TIM3, prescaler: u16) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim3en().set_bit());

        let tim = tim3;

        // Disable counter while configuring
        tim.cr1.modify(|_, w| w.cen().clear_bit());

        // 1 MHz tick
        tim.psc.write(|w| unsafe { w.bits(u32::from(prescaler)) });

        // Free-running over the full 16-bit range
        tim.arr.write(|w| unsafe { w.bits(0xFFFF) });

        // CH1 captures from TI1 (the echo pin)
        tim.ccmr1_input().modify(|_, w| w.cc1s().ti1());

        // Both edges: CC1P and CC1NP set, then enable the channel
        tim.ccer.modify(|_, w| {
            w.cc1p()
                .set_bit()
                .cc1np()
                .set_bit()
                .cc1e()
                .set_bit()
        });

        // Interrupt on capture
        tim.dier.modify(|_, w| w.cc1ie().set_bit());

        // Load the prescaler now instead of at the next wrap
        tim.egr.write(|w| w.ug().set_bit());
        tim.cnt.write(|w| unsafe { w.bits(0) });

        // Enable counter
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }

    /// Tick-source handle onto this timer's counter.
    #[inline]
    pub fn ticks(&self) -> Tim3Ticks {
        Tim3Ticks(())
    }

    /// Latched CH1 timestamp. Reading CCR1 also clears the capture flag, so call this exactly
    /// once per capture interrupt.
    #[inline]
    pub fn captured_ticks() -> u16 {
        let tim = unsafe { &*pac::TIM3::ptr() };
        tim.ccr1.read().bits() as u16
    }

    /// Consume the wrapper and return the underlying timer peripheral.
    #[inline]
    pub fn free(self) -> pac::TIM3 {
        self.tim
    }
}
