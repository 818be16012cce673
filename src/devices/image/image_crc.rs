use super::{Descriptor, Version};
use crate::{
    config::{APPLICATION_BASE, FLASH_SIZE},
    devices::traits::Flash,
    error::Error,
    hal::flash::{self, Address},
};
use core::mem::size_of;
use crc::{crc32, Hasher32};
use nb::block;

/// Computes the standard CRC-32 (IEEE) of `length` bytes of flash starting at `start`.
pub fn checksum<F>(flash: &mut F, start: Address, length: usize) -> Result<u32, Error>
where
    F: flash::Read,
    Error: From<F::Error>,
{
    // Generic buffer to hold temporary slices read from flash memory.
    const BUFFER_SIZE: usize = 256;
    let mut buffer = [0u8; BUFFER_SIZE];

    let mut digest = crc32::Digest::new(crc32::IEEE);
    let mut offset = 0;
    while offset < length {
        let chunk = &mut buffer[..(length - offset).min(BUFFER_SIZE)];
        block!(flash.read(start + offset, chunk))?;
        digest.write(chunk);
        offset += chunk.len();
    }
    Ok(digest.sum32())
}

/// Checks that the application region holds a complete, uncorrupted
/// application image, returning its version.
///
/// The image's CRC-32 is stored right after the `length` bytes its
/// descriptor covers, so the length is bounded to keep that word inside
/// the application region.
pub fn confirm_installed<MCUF: Flash>(flash: &mut MCUF) -> Result<Version, Error> {
    let base = Address(APPLICATION_BASE);
    let descriptor = Descriptor::read(flash, base)?;
    if !descriptor.is_application() {
        return Err(Error::WrongType);
    }

    let length = descriptor.length as usize;
    let maximum_length = (FLASH_SIZE - APPLICATION_BASE) as usize - size_of::<u32>();
    if length > maximum_length || length % size_of::<u32>() != 0 {
        return Err(Error::WrongLength);
    }

    let calculated_crc = checksum(flash, base, length)?;
    let mut crc_bytes = [0u8; size_of::<u32>()];
    block!(flash.read(base + length, &mut crc_bytes))?;
    let retrieved_crc = u32::from_le_bytes(crc_bytes);

    if retrieved_crc != calculated_crc {
        return Err(Error::CrcMismatch);
    }
    Ok(descriptor.version)
}
