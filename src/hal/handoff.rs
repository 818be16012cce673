//! Transfer of control to the installed application.
use super::flash::Address;

/// Platform specific, irreversible jump into a firmware image.
pub trait Handoff {
    /// Releases bootloader-only peripherals, relocates the vector table to
    /// `image` and starts the image through its reset vector.
    ///
    /// Implementors must only be called with the base of an image that has
    /// already been verified. This never returns.
    fn handoff(&mut self, image: Address) -> !;
}
