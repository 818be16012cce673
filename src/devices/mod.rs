//! Complex modules with business logic related to the problem
//! domain, that lay on top of abstract drivers. Devices are
//! generic, while board specifics (flash controller, reset
//! handoff, marker region) are handled in the `ports` module.

pub mod boot_marker;
pub mod bootloader;
pub mod crypto;
pub mod image;
pub mod implementations;
pub mod update_log;

/// General purpose traits that summarize requirements on devices.
pub mod traits {
    use crate::{error, hal::flash};
    use marker_blanket::marker_blanket;

    /// A supported flash must be able to read, erase and program sectors,
    /// and report errors to the bootloader.
    #[marker_blanket]
    pub trait Flash: flash::Program<Error: error::Convertible> {}
}
