//! Kinetis KE06 (MKE06Z4) port.
pub mod flash;

#[cfg(target_arch = "arm")]
pub mod bootloader;
#[cfg(target_arch = "arm")]
pub mod clock;
#[cfg(target_arch = "arm")]
pub mod handoff;
#[cfg(target_arch = "arm")]
pub mod marker;
