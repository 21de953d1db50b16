pub mod capture;
pub mod led;
pub mod ticks;

#[cfg(feature = "stm32f7")]
pub mod pins;
#[cfg(feature = "stm32f7")]
pub mod usart;

pub use capture::CaptureSnapshot;
pub use capture::EchoCapture;
pub use capture::PulseCapture;
pub use led::Led;
pub use ticks::TickSource;

#[cfg(feature = "stm32f7")]
pub use capture::CaptureTimer;
#[cfg(feature = "stm32f7")]
pub use pins::BoardPins;
#[cfg(feature = "stm32f7")]
pub use ticks::Tim3Ticks;
#[cfg(feature = "stm32f7")]
pub use usart::Console;
