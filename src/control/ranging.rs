//! Polling controller for the ultrasonic rangefinder.
//!
//! Wraps an [`HcSr04`] driver, owns the measurement stage between loop iterations, and turns
//! completed measurements into classified [`Reading`]s.
//!
//! Typical usage pattern:
//!
//! ```ignore
//! loop {
//!     if let Some(reading) = ranger.poll() {
//!         report(reading);
//!     }
//!     // service other peripherals here
//! }
//! ```

use embedded_hal::digital::OutputPin;

use crate::drivers::{is_valid_distance, Environment, HcSr04, Stage};
use crate::hw::TickSource;

/// One classified distance measurement.
#[derive(Copy, Clone, Debug)]
pub struct Reading {
    /// Signed distance in meters; negative means no echo arrived.
    pub distance_m: f32,
    /// Whether the distance lies in the sensor's rated window.
    pub valid: bool,
}

impl Reading {
    fn classify(distance_m: f32) -> Self {
        Self {
            distance_m,
            valid: is_valid_distance(distance_m),
        }
    }
}

/// Controller state.
pub struct Ranger<'c, PIN, CLK, ENV> {
    driver: HcSr04<'c, PIN, CLK, ENV>,
    stage: Stage,
    distance_m: f32,
}

impl<'c, PIN, CLK, ENV> Ranger<'c, PIN, CLK, ENV>
where
    PIN: OutputPin,
    CLK: TickSource,
    ENV: Environment,
{
    pub fn new(driver: HcSr04<'c, PIN, CLK, ENV>) -> Self {
        Self {
            driver,
            stage: Stage::PreTrigger,
            distance_m: 0.0,
        }
    }

    /// Advance the in-flight measurement one step.
    ///
    /// Returns a reading when a measurement completes, `None` while one is still in flight. The
    /// call after a completed reading starts the next measurement.
    pub fn poll(&mut self) -> Option<Reading> {
        self.stage = self.driver.advance(self.stage, &mut self.distance_m);
        if self.stage != Stage::Done {
            return None;
        }
        self.stage = Stage::PreTrigger;
        Some(Reading::classify(self.distance_m))
    }

    /// Run one whole measurement, spinning until it completes.
    pub fn measure_blocking(&mut self) -> Reading {
        Reading::classify(self.driver.measure_distance_m())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{
        FixedEnvironment, ECHO_TIMEOUT_TICKS, NO_ECHO_DISTANCE_M, TRIGGER_PULSE_TICKS,
    };
    use crate::hw::EchoCapture;
    use crate::testutil::{SimClock, TestPin};

    const ROOM: FixedEnvironment = FixedEnvironment {
        temperature_c: 20.0,
        humidity_pct: 50.0,
    };

    #[test]
    fn poll_yields_nothing_until_the_echo_lands() {
        let cell = EchoCapture::new();
        let clock = SimClock::manual();
        let driver = HcSr04::new(&cell, TestPin::new(), &clock, ROOM);
        let mut ranger = Ranger::new(driver);

        assert!(ranger.poll().is_none());

        clock.set(TRIGGER_PULSE_TICKS);
        assert!(ranger.poll().is_none());

        cell.publish(700);
        let reading = ranger.poll().expect("echo landed, reading due");
        assert!(reading.valid);
        // 700 µs at 344.04 m/s, halved for the round trip
        assert!((reading.distance_m - 0.120414).abs() < 1e-5);

        // The next poll starts a fresh measurement
        assert!(ranger.poll().is_none());
    }

    #[test]
    fn timed_out_measurement_reads_as_invalid() {
        let cell = EchoCapture::new();
        let clock = SimClock::manual();
        let driver = HcSr04::new(&cell, TestPin::new(), &clock, ROOM);
        let mut ranger = Ranger::new(driver);

        assert!(ranger.poll().is_none());
        clock.set(TRIGGER_PULSE_TICKS);
        assert!(ranger.poll().is_none());

        clock.set(TRIGGER_PULSE_TICKS + ECHO_TIMEOUT_TICKS);
        let reading = ranger.poll().expect("timeout produces a reading");
        assert!(!reading.valid);
        assert_eq!(reading.distance_m, NO_ECHO_DISTANCE_M);
    }

    #[test]
    fn blocking_measurement_classifies_its_reading() {
        let cell = EchoCapture::new();
        let clock = SimClock::stepping(1, &cell, &[(200, 1000)]);
        let driver = HcSr04::new(&cell, TestPin::new(), &clock, ROOM);
        let mut ranger = Ranger::new(driver);

        let reading = ranger.measure_blocking();
        assert!(reading.valid);
        assert!((reading.distance_m - 0.17202).abs() < 1e-5);
    }
}
