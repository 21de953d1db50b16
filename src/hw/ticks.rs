//! Monotonic microsecond tick sources.
//!
//! The rangefinder times its trigger pulse, echo wait, and timeout against a free-running 16-bit
//! counter clocked at 1 MHz. `TickSource` is the seam between that counter and the driver logic,
//! so the timing code runs against the real TIM3 count on the target and against a scripted clock
//! in tests.

/// A free-running 16-bit counter, one tick per microsecond, wrapping at 2^16.
pub trait TickSource {
    /// Current counter value.
    fn now(&self) -> u16;

    /// Ticks elapsed since `start`, modulo the counter range.
    ///
    /// Wrapping subtraction keeps the result correct across a counter wrap, as long as the real
    /// elapsed time is under one full period (65.5 ms).
    #[inline]
    fn ticks_since(&self, start: u16) -> u16 {
        self.now().wrapping_sub(start)
    }

    /// Busy-wait until at least `ticks` have elapsed.
    ///
    /// A tight spin, not a sleep: the trigger pulse is tens of microseconds wide and scheduler
    /// granularity is far coarser than that.
    fn spin_for(&self, ticks: u16) {
        let start = self.now();
        while self.ticks_since(start) < ticks {}
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    #[inline]
    fn now(&self) -> u16 {
        T::now(self)
    }
}

#[cfg(feature = "stm32f7")]
use stm32f7xx_hal::pac;

/// Handle onto TIM3's counter, configured by [`CaptureTimer`](crate::hw::CaptureTimer) to tick at
/// 1 MHz. Copy freely; reading the count has no side effects.
#[cfg(feature = "stm32f7")]
#[derive(Copy, Clone)]
pub struct Tim3Ticks(pub(crate) ());

#[cfg(feature = "stm32f7")]
impl TickSource for Tim3Ticks {
    #[inline]
    fn now(&self) -> u16 {
        let tim = unsafe { &*pac::TIM3::ptr() };
        tim.cnt.read().bits() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct StepClock {
        t: Cell<u16>,
        step: u16,
    }

    impl TickSource for StepClock {
        fn now(&self) -> u16 {
            let t = self.t.get();
            self.t.set(t.wrapping_add(self.step));
            t
        }
    }

    #[test]
    fn ticks_since_counts_forward() {
        let clock = StepClock {
            t: Cell::new(500),
            step: 0,
        };
        assert_eq!(clock.ticks_since(100), 400);
    }

    #[test]
    fn ticks_since_spans_counter_wrap() {
        let clock = StepClock {
            t: Cell::new(100),
            step: 0,
        };
        // 65000 -> 100 crosses the wrap; the true modulus is 2^16.
        assert_eq!(clock.ticks_since(65000), 636);
    }

    #[test]
    fn spin_for_waits_at_least_the_requested_ticks() {
        let clock = StepClock {
            t: Cell::new(0),
            step: 1,
        };
        let start = clock.t.get();
        clock.spin_for(11);
        let elapsed = clock.t.get().wrapping_sub(start);
        assert!(elapsed >= 11, "spun for only {} ticks", elapsed);
    }

    #[test]
    fn spin_for_survives_a_wrap_mid_spin() {
        let clock = StepClock {
            t: Cell::new(u16::MAX - 3),
            step: 1,
        };
        // Must terminate even though the counter wraps during the spin.
        clock.spin_for(11);
    }
}
