use embedded_hal::digital::OutputPin;

/// Active-high status LED that remembers its last commanded state.
pub struct Led<PIN: OutputPin> {
    pin: PIN,
    is_on: bool,
}

impl<PIN: OutputPin> Led<PIN> {
    /// Create an LED wrapper, initializing it to OFF.
    pub fn new(mut pin: PIN) -> Self {
        pin.set_low().ok();
        Self { pin, is_on: false }
    }

    /// Drive the LED ON (true) or OFF (false).
    pub fn set(&mut self, on: bool) {
        if on {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
        self.is_on = on;
    }

    #[inline]
    pub fn on(&mut self) {
        self.set(true);
    }

    #[inline]
    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn toggle(&mut self) {
        self.set(!self.is_on);
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}
