#![no_main]
#![no_std]

use core::fmt::Write;

use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use panic_halt as _;

use hal::{
    pac::{self, interrupt},
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use sonarbot::control::Ranger;
use sonarbot::drivers::{FixedEnvironment, HcSr04};
use sonarbot::hw::{BoardPins, CaptureTimer, Console, EchoCapture, Led, PulseCapture, TickSource};

/// Capture cell shared between the TIM3 interrupt and the measurement loop.
static ECHO_CAPTURE: EchoCapture = EchoCapture::new();

/// TIM3 runs from the 16 MHz APB1 timer clock left by `freeze()`; divide it down to 1 MHz ticks.
const TIM3_PSC: u16 = 15;

/// Pause between measurements. The sensor manual asks for 60 ms between cycles to let stray
/// echoes die out.
const MEASUREMENT_GAP_TICKS: u16 = 60_000;

/// Nominal indoor conditions; no environmental sensor is fitted on this board.
const INDOOR: FixedEnvironment = FixedEnvironment {
    temperature_c: 20.0,
    humidity_pct: 50.0,
};

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();

    // GPIO
    let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOD);

    // LED
    let mut led = Led::new(pins.led);

    // USART3 (ST-LINK virtual COM port)
    let usart_cfg = Config {
        baud_rate: 115_200.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART3, (pins.usart3.tx, pins.usart3.rx), &clocks, usart_cfg);
    let mut console = Console::new(serial);

    // TIM3: 1 MHz timebase, both-edge capture on CH1 (the echo pin, PA6 in AF2)
    let timer = CaptureTimer::tim3(dp.TIM3, TIM3_PSC);
    let ticks = timer.ticks();
    unsafe { NVIC::unmask(pac::Interrupt::TIM3) };

    let driver = HcSr04::new(&ECHO_CAPTURE, pins.ranger.trig, ticks, INDOOR);
    let mut ranger = Ranger::new(driver);

    console.println("sonarbot: ranging");

    // One blocking measurement up front to confirm the sensor answers at all.
    let boot = ranger.measure_blocking();
    if boot.valid {
        let _ = writeln!(console, "boot range: {:.3} m\r", boot.distance_m);
    } else {
        console.println("boot range: no target");
    }

    loop {
        if let Some(reading) = ranger.poll() {
            led.toggle();
            if reading.valid {
                let _ = writeln!(console, "distance: {:.3} m\r", reading.distance_m);
            } else {
                console.println("no target");
            }
            ticks.spin_for(MEASUREMENT_GAP_TICKS);
        }
    }
}

#[interrupt]
fn TIM3() {
    static mut PAIRING: PulseCapture = PulseCapture::new();

    let stamp = CaptureTimer::captured_ticks();
    if let Some(width) = PAIRING.on_edge(stamp) {
        ECHO_CAPTURE.publish(width);
    }
}
