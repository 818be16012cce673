//! Build-time configuration.
//!
//! The constants below are generated by the build script from the RON
//! file named by `CARDBOOT_CONFIG` (or the reference board's sample
//! configuration). Relationships the rest of the crate relies upon are
//! checked at compile time.
use static_assertions::const_assert;

include!(concat!(env!("OUT_DIR"), "/configuration.rs"));

/// Native block size of the cipher used for both authentication and decryption.
pub const CIPHER_BLOCK_SIZE: usize = 16;

/// Sectors decrypted up front so the image descriptor can be inspected.
pub const HEADER_SECTORS: usize = 3;

/// Span of plaintext guaranteed to contain the image descriptor.
pub const HEADER_SPAN: usize = HEADER_SECTORS * SECTOR_SIZE;

/// Size of the cross-reset marker region.
pub const MARKER_SIZE: usize = 64;

const_assert!(SECTOR_SIZE.is_power_of_two());
const_assert!(SECTOR_SIZE % CIPHER_BLOCK_SIZE == 0);
const_assert!(SECTOR_SIZE % (2 * core::mem::size_of::<u32>()) == 0);
const_assert!(APPLICATION_BASE as usize % SECTOR_SIZE == 0);
const_assert!(DESCRIPTOR_OFFSET + crate::devices::image::DESCRIPTOR_SIZE <= HEADER_SPAN);
const_assert!(APPLICATION_BASE as usize + HEADER_SPAN <= FLASH_SIZE as usize);
