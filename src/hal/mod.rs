//! Hardware Abstraction Layer, containing interfaces
//! for low level drivers and external collaborators.
#![macro_use]

pub mod flash;
pub mod gpio;
pub mod handoff;
pub mod led;
pub mod marker;
pub mod power;
pub mod storage;
pub mod time;

#[cfg(not(target_arch = "arm"))]
#[doc(hidden)]
pub mod doubles;
