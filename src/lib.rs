//! # Secure SD Card Bootloader Library
//!
//! This crate contains all functionality for the cardboot
//! firmware update bootloader in library form. On every boot it
//! looks for an encrypted, authenticated firmware image on removable
//! storage, installs it when it's newer than the resident application,
//! and hands control over to the application once its CRC checks out.
#![cfg_attr(test, allow(unused_imports))]
#![cfg_attr(target_arch = "arm", no_std)]

extern crate static_assertions;

#[macro_use]
pub mod utilities {
    mod macros;
}

#[cfg(target_arch = "arm")]
pub(crate) use defmt as log;

// Debug tracing is only available on target.
#[cfg(not(target_arch = "arm"))]
pub(crate) mod log {
    macro_rules! info {
        ($($x:tt)*) => {{}};
    }
    pub(crate) use info;
    macro_rules! warner {
        ($($x:tt)*) => {{}};
    }
    pub(crate) use warner as warn;
    macro_rules! error {
        ($($x:tt)*) => {{}};
    }
    pub(crate) use error;
}

pub mod config;
pub mod devices;
pub mod error;
pub mod hal;
pub mod ports;
