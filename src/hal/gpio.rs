//! # Simple GPIO interface
//!
//! For this project, output pins are all the indicator LEDs need.

/// Interface to a writable pin.
pub trait OutputPin {
    fn set_low(&mut self);
    fn set_high(&mut self);
}
