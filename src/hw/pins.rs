// SPDX-License-Identifier: MIT

//! Pin definitions for the ranging firmware on the NUCLEO-F767ZI.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use stm32f7xx_hal::{
    gpio::{self, gpioa, gpiod, Alternate, Output, PushPull},
    pac,
    prelude::*,
};

/// Push-pull GPIO output exposed through the `embedded-hal` [`OutputPin`] trait, generic over any
/// GPIO pin.
pub struct OutPin<const P: char, const N: u8> {
    pin: gpio::Pin<P, N, Output<PushPull>>,
}

impl<const P: char, const N: u8> OutPin<P, N> {
    pub fn new<MODE>(pin: gpio::Pin<P, N, MODE>) -> Self {
        Self {
            pin: pin.into_push_pull_output(),
        }
    }

    pub fn free(self) -> gpio::Pin<P, N, Output<PushPull>> {
        self.pin
    }
}

impl<const P: char, const N: u8> ErrorType for OutPin<P, N> {
    type Error = Infallible;
}

impl<const P: char, const N: u8> OutputPin for OutPin<P, N> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high();
        Ok(())
    }
}

/// Trigger output to the rangefinder.
pub type TriggerPin = OutPin<'A', 7>;

/// User LED LD1 (green) on the Nucleo board.
pub type LedPin = OutPin<'B', 0>;

/// All board pins. Construct this once at startup using:
///
/// ```rust,ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOD);
/// ```
pub struct BoardPins {
    pub ranger: RangerPins,
    pub led: LedPin,
    pub usart3: Usart3Pins,
}

/// Ultrasonic rangefinder pins.
pub struct RangerPins {
    pub trig: TriggerPin,
    /// Echo input, routed to TIM3_CH1 for input capture.
    pub echo: gpioa::PA6<Alternate<2>>,
}

/// ST-LINK virtual COM port (USART3).
pub struct Usart3Pins {
    pub tx: gpiod::PD8<Alternate<7>>,
    pub rx: gpiod::PD9<Alternate<7>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpiob: pac::GPIOB, gpiod: pac::GPIOD) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpiod = gpiod.split();

        Self {
            ranger: RangerPins {
                trig: OutPin::new(gpioa.pa7),
                echo: gpioa.pa6.into_alternate::<2>(),
            },

            led: OutPin::new(gpiob.pb0),

            usart3: Usart3Pins {
                tx: gpiod.pd8.into_alternate::<7>(),
                rx: gpiod.pd9.into_alternate::<7>(),
            },
        }
    }
}
