// SPDX-License-Identifier: MIT

//! HC-SR04 ultrasonic rangefinder driver.
//!
//! Measurement protocol: hold the trigger line high for at least 10 µs, then wait for the sensor
//! to raise its echo line; the width of the echo pulse is the round-trip time of flight. Edge
//! timestamps arrive from the capture interrupt through an [`EchoCapture`] cell, and pulse width
//! converts to distance through a temperature- and humidity-corrected speed of sound.
//!
//! Two measurement paths share that machinery: [`HcSr04::measure_distance_m`] spins through a
//! whole cycle, and [`HcSr04::advance`] exposes the same cycle as a resumable state machine so a
//! control loop can interleave other work while the echo is in flight.

use embedded_hal::digital::OutputPin;
use micromath::F32Ext;

use crate::hw::{CaptureSnapshot, EchoCapture, TickSource};

/// Minimum trigger pulse width. The datasheet floor is 10 µs; one extra tick of margin.
pub const TRIGGER_PULSE_TICKS: u16 = 11;

/// Give up waiting for an echo after this many ticks from the trigger.
///
/// The sensor bounds its own no-target echo pulse near 38 ms, so 50 ms covers every real cycle
/// while staying inside the 65.5 ms counter period. The staged path relies on being polled at
/// least every few milliseconds; slower polling can alias the 16-bit elapsed count.
pub const ECHO_TIMEOUT_TICKS: u16 = 50_000;

/// Distance reported when no echo arrived. Never valid per [`is_valid_distance`].
pub const NO_ECHO_DISTANCE_M: f32 = -1.0;

/// Speed of sound in dry air at 0 °C, m/s.
const SOUND_BASE_M_PER_S: f32 = 331.3;
/// First-order temperature correction, m/s per °C.
const SOUND_TEMP_SLOPE: f32 = 0.606;
/// First-order humidity correction, m/s per %RH.
const SOUND_HUMIDITY_SLOPE: f32 = 0.0124;

const SECONDS_PER_TICK: f32 = 1e-6;

/// Sensor rated range, centimeters.
const RANGE_MIN_CM: f32 = 2.0;
const RANGE_MAX_CM: f32 = 400.0;

/// Ambient readings used to correct the speed of sound.
pub trait Environment {
    /// Ambient temperature in °C.
    fn temperature_c(&self) -> f32;

    /// Relative humidity in percent.
    fn humidity_pct(&self) -> f32;
}

/// Fixed readings, for boards without an environmental sensor and for tests.
#[derive(Copy, Clone, Debug)]
pub struct FixedEnvironment {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl Environment for FixedEnvironment {
    fn temperature_c(&self) -> f32 {
        self.temperature_c
    }

    fn humidity_pct(&self) -> f32 {
        self.humidity_pct
    }
}

/// Measurement progress, held by the caller and threaded through [`HcSr04::advance`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Start a new measurement.
    PreTrigger,
    /// Trigger line is high; waiting out the minimum pulse width.
    Trigger,
    /// Pulse width reached; snapshot the capture flag and drop the line.
    PostTrigger,
    /// Trigger sent; echo not yet captured.
    WaitForEcho,
    /// Echo captured; convert to meters.
    CalculateDistance,
    /// Measurement complete, output written.
    Done,
}

/// Bookkeeping for a staged measurement between calls.
#[derive(Copy, Clone)]
struct InFlight {
    trigger_start: u16,
    flag_snapshot: bool,
}

/// Ultrasonic distance driver.
///
/// Owns the trigger pin, a tick source, and the environmental readings. Echo pulse widths arrive
/// through the bound [`EchoCapture`] cell, which the capture interrupt feeds; one cell binds to
/// one driver for the life of the program.
///
/// At most one measurement may be in flight at a time, blocking or staged. The driver does not
/// serialize callers; drive it from a single context.
pub struct HcSr04<'c, PIN, CLK, ENV> {
    trig: PIN,
    clock: CLK,
    env: ENV,
    capture: &'c EchoCapture,
    pending: Option<InFlight>,
}

impl<'c, PIN, CLK, ENV> HcSr04<'c, PIN, CLK, ENV>
where
    PIN: OutputPin,
    CLK: TickSource,
    ENV: Environment,
{
    /// Bind the driver to its capture cell and hardware references.
    ///
    /// Panics if `capture` already belongs to another driver; configuring the same sensor twice
    /// is a programming error, not a runtime condition.
    pub fn new(capture: &'c EchoCapture, trig: PIN, clock: CLK, env: ENV) -> Self {
        assert!(capture.try_bind(), "echo capture cell already bound");
        Self {
            trig,
            clock,
            env,
            capture,
            pending: None,
        }
    }

    /// Blocking measurement. Returns a signed distance in meters; check it with
    /// [`is_valid_distance`] before use.
    ///
    /// Spins through the whole trigger/echo cycle. If no echo arrives within
    /// [`ECHO_TIMEOUT_TICKS`] of the trigger going up, returns [`NO_ECHO_DISTANCE_M`] instead of
    /// hanging on a disconnected sensor.
    pub fn measure_distance_m(&mut self) -> f32 {
        let flag_before = self.capture.snapshot().flag();

        // Trigger pulse; the timeout window opens with it
        self.trig.set_high().ok();
        let start = self.clock.now();
        self.clock.spin_for(TRIGGER_PULSE_TICKS);
        self.trig.set_low().ok();

        loop {
            let snap = self.capture.snapshot();
            if snap.flag() != flag_before {
                return self.distance_from(snap);
            }
            if self.clock.ticks_since(start) >= ECHO_TIMEOUT_TICKS {
                return NO_ECHO_DISTANCE_M;
            }
        }
    }

    /// Advance the staged measurement by one step.
    ///
    /// The caller owns the [`Stage`] value and passes the previous return back in. A cycle runs
    /// `PreTrigger` to `Done`; at `Done` the result has been written to `distance_m` with the
    /// same semantics as [`measure_distance_m`]. Passing `Done` back in starts the next
    /// measurement.
    ///
    /// `Trigger` and `PostTrigger` complete within a single call once their condition is met;
    /// only `WaitForEcho` returns to the caller while waiting on the sensor. Panics if asked to
    /// continue a measurement that was never started.
    pub fn advance(&mut self, stage: Stage, distance_m: &mut f32) -> Stage {
        // A finished machine re-arms.
        let mut stage = if stage == Stage::Done {
            Stage::PreTrigger
        } else {
            stage
        };
        let mut captured: Option<CaptureSnapshot> = None;

        if stage == Stage::PreTrigger {
            self.trig.set_high().ok();
            self.pending = Some(InFlight {
                trigger_start: self.clock.now(),
                flag_snapshot: self.capture.snapshot().flag(),
            });
            return Stage::Trigger;
        }

        if stage == Stage::Trigger {
            let started = self.in_flight().trigger_start;
            if self.clock.ticks_since(started) < TRIGGER_PULSE_TICKS {
                return Stage::Trigger;
            }
            stage = Stage::PostTrigger;
        }

        if stage == Stage::PostTrigger {
            // Snapshot after the pulse: a straggling capture from an earlier cycle flips the
            // flag before this point and must not satisfy this measurement.
            let flag = self.capture.snapshot().flag();
            self.in_flight().flag_snapshot = flag;
            self.trig.set_low().ok();
            stage = Stage::WaitForEcho;
        }

        if stage == Stage::WaitForEcho {
            let InFlight {
                trigger_start,
                flag_snapshot,
            } = *self.in_flight();
            let snap = self.capture.snapshot();
            if snap.flag() == flag_snapshot {
                if self.clock.ticks_since(trigger_start) >= ECHO_TIMEOUT_TICKS {
                    self.pending = None;
                    *distance_m = NO_ECHO_DISTANCE_M;
                    return Stage::Done;
                }
                return Stage::WaitForEcho;
            }
            captured = Some(snap);
            stage = Stage::CalculateDistance;
        }

        // Every other stage returned or fell through; only CalculateDistance reaches here.
        debug_assert_eq!(stage, Stage::CalculateDistance);
        let snap = captured.unwrap_or_else(|| self.capture.snapshot());
        assert!(self.pending.take().is_some(), "no measurement in flight");
        *distance_m = self.distance_from(snap);
        Stage::Done
    }

    /// Release the trigger pin. The capture cell stays bound.
    pub fn free(self) -> PIN {
        self.trig
    }

    fn distance_from(&self, snap: CaptureSnapshot) -> f32 {
        let speed = speed_of_sound_m_per_s(self.env.temperature_c(), self.env.humidity_pct());
        let elapsed_s = f32::from(snap.elapsed_ticks()) * SECONDS_PER_TICK;
        // The pulse covers the distance twice, out and back.
        elapsed_s * speed / 2.0
    }

    fn in_flight(&mut self) -> &mut InFlight {
        self.pending.as_mut().expect("no measurement in flight")
    }
}

/// Speed of sound corrected for ambient conditions, m/s.
///
/// Readings are floored to whole °C / %RH before scaling.
pub fn speed_of_sound_m_per_s(temperature_c: f32, humidity_pct: f32) -> f32 {
    let t = F32Ext::floor(temperature_c);
    let h = F32Ext::floor(humidity_pct);
    SOUND_BASE_M_PER_S + SOUND_TEMP_SLOPE * t + SOUND_HUMIDITY_SLOPE * h
}

/// True iff `distance_m` lies within the sensor's rated window of 2 cm to 400 cm, inclusive.
///
/// Readings outside the window mean no target, a near-field artifact, or noise. They are
/// expected outcomes, not errors.
pub fn is_valid_distance(distance_m: f32) -> bool {
    let cm = distance_m * 100.0;
    (RANGE_MIN_CM..=RANGE_MAX_CM).contains(&cm)
}
