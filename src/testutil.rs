//! Shared fakes for host-side unit tests.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

pub use embedded_hal::digital::PinState;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::hw::{EchoCapture, TickSource};

/// Output pin that records the last level it was driven to.
pub struct TestPin {
    state: PinState,
}

impl TestPin {
    pub fn new() -> Self {
        Self {
            state: PinState::Low,
        }
    }

    pub fn state(&self) -> PinState {
        self.state
    }
}

impl ErrorType for TestPin {
    type Error = Infallible;
}

impl OutputPin for TestPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state = PinState::Low;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state = PinState::High;
        Ok(())
    }
}

/// Output pin that timestamps every drive against a shared clock.
///
/// [`TestPin`] only remembers the last level; this one keeps the whole drive history for
/// pulse-shape assertions.
pub struct TracePin<'a> {
    clock: &'a SimClock<'a>,
    drives: Vec<(u16, PinState)>,
}

impl<'a> TracePin<'a> {
    pub fn new(clock: &'a SimClock<'a>) -> Self {
        Self {
            clock,
            drives: Vec::new(),
        }
    }

    /// Every drive in order, as `(tick, level)`.
    pub fn drives(&self) -> &[(u16, PinState)] {
        &self.drives
    }
}

impl ErrorType for TracePin<'_> {
    type Error = Infallible;
}

impl OutputPin for TracePin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drives.push((self.clock.peek(), PinState::Low));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drives.push((self.clock.peek(), PinState::High));
        Ok(())
    }
}

/// Scripted tick source.
///
/// In manual mode the count moves only when the test calls [`set`](Self::set). In stepping mode
/// every `now()` advances the count by a fixed step and delivers any scheduled echo captures that
/// have come due, standing in for the capture interrupt.
pub struct SimClock<'a> {
    t: Cell<u16>,
    step: u16,
    capture: Option<&'a EchoCapture>,
    echoes: RefCell<Vec<EchoAt>>,
}

struct EchoAt {
    at: u16,
    width: u16,
}

impl<'a> SimClock<'a> {
    pub fn manual() -> Self {
        Self {
            t: Cell::new(0),
            step: 0,
            capture: None,
            echoes: RefCell::new(Vec::new()),
        }
    }

    /// `echoes` is a list of `(at_tick, width_ticks)` pulse completions to publish into `capture`
    /// once the count passes `at_tick`.
    pub fn stepping(step: u16, capture: &'a EchoCapture, echoes: &[(u16, u16)]) -> Self {
        Self {
            t: Cell::new(0),
            step,
            capture: Some(capture),
            echoes: RefCell::new(
                echoes
                    .iter()
                    .map(|&(at, width)| EchoAt { at, width })
                    .collect(),
            ),
        }
    }

    /// Move the count to an absolute value (manual mode).
    pub fn set(&self, t: u16) {
        self.t.set(t);
    }

    /// Read the count without advancing it.
    pub fn peek(&self) -> u16 {
        self.t.get()
    }

    fn deliver(&self, now: u16) {
        let capture = match self.capture {
            Some(c) => c,
            None => return,
        };
        let mut echoes = self.echoes.borrow_mut();
        let mut i = 0;
        while i < echoes.len() {
            if echoes[i].at <= now {
                capture.publish(echoes[i].width);
                echoes.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

impl TickSource for SimClock<'_> {
    fn now(&self) -> u16 {
        let now = self.t.get();
        self.t.set(now.wrapping_add(self.step));
        self.deliver(now);
        now
    }
}
