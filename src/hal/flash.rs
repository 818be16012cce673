//! Non-volatile memory interfaces.
//!
//! Flash is programmed in two steps: a whole sector is erased, then its
//! words are programmed. Cells can only transition away from the erased
//! state, so every program must target a sector erased beforehand.
//! Operations are polled to completion, which maps naturally to
//! [`nb::Result`]: drivers report `WouldBlock` while the controller is busy.
use core::{fmt, ops::Add};

/// Value every byte of a freshly erased sector reads as.
pub const ERASED_BYTE: u8 = 0xFF;

/// Absolute address in MCU flash.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, PartialEq, Eq)]
pub struct Address(pub u32);

impl Address {
    pub fn is_aligned_to(self, alignment: usize) -> bool { self.0 as usize % alignment == 0 }
}

impl Add<usize> for Address {
    type Output = Address;
    fn add(self, rhs: usize) -> Self::Output { Address(self.0 + rhs as u32) }
}

impl From<Address> for usize {
    fn from(address: Address) -> Self { address.0 as usize }
}

/// Reads a range of bytes.
pub trait Read {
    type Error: Clone + Copy + fmt::Debug;
    fn read(&mut self, address: Address, bytes: &mut [u8]) -> nb::Result<(), Self::Error>;
}

/// Low level programming primitives. Unlike a generic `Write`, nothing
/// is abstracted away: callers are responsible for erasing first and for
/// respecting sector boundaries.
pub trait Program: Read {
    /// Erases the sector starting at `address`, which must be sector aligned.
    fn erase_sector(&mut self, address: Address) -> nb::Result<(), Self::Error>;

    /// Programs consecutive words starting at `address`. The address must be
    /// word aligned and the range must lie in a previously erased sector.
    fn write_words(&mut self, address: Address, words: &[u32]) -> nb::Result<(), Self::Error>;
}
