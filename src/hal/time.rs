//! Time units.
use core::ops::Add;

#[derive(Clone, Copy, Debug, PartialOrd, PartialEq, Eq, Ord, Default)]
pub struct Milliseconds(pub u32);

impl Add for Milliseconds {
    type Output = Milliseconds;
    fn add(self, rhs: Milliseconds) -> Self::Output { Milliseconds(self.0.wrapping_add(rhs.0)) }
}

/// Time elapsed since the bootloader started.
pub trait Now {
    fn now(&self) -> Milliseconds;
}

/// Blocking wait.
pub trait Wait {
    fn wait(&mut self, period: Milliseconds);
}
