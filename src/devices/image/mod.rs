//! Firmware image inspection, authentication and installation.
//!
//! Every firmware binary (bootloader or application) embeds a fixed
//! layout [`Descriptor`] at a known offset. Candidate images travel
//! encrypted and authenticated as
//! `[nonce][ciphertext payload][MAC]`, each part a whole number of
//! cipher blocks, and the plaintext payload ends in the CRC-32 of the
//! image so it can be validated once installed.

pub mod image_crc;
pub mod install;
pub mod verify;

#[cfg(test)]
pub mod test_image;

pub use image_crc::confirm_installed;
pub use install::{install, Staging};
pub use verify::verify;

use crate::{
    error::Error,
    hal::flash::{self, Address},
};
use nb::block;
use ufmt::{uDisplay, uWrite, uwrite, Formatter};

/// Size of the descriptor embedded in every image.
pub const DESCRIPTOR_SIZE: usize = 32;

/// Firmware version. Versions are ordered by major, then minor number.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16) -> Self { Self { major, minor } }
}

impl uDisplay for Version {
    fn fmt<W: uWrite + ?Sized>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error> {
        uwrite!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum ProgramType {
    Bootloader,
    Application,
    Unknown(u8),
}

impl From<u8> for ProgramType {
    fn from(raw: u8) -> Self {
        match raw {
            0 => ProgramType::Bootloader,
            1 => ProgramType::Application,
            other => ProgramType::Unknown(other),
        }
    }
}

impl From<ProgramType> for u8 {
    fn from(program_type: ProgramType) -> Self {
        match program_type {
            ProgramType::Bootloader => 0,
            ProgramType::Application => 1,
            ProgramType::Unknown(other) => other,
        }
    }
}

/// Image metadata, little endian:
///
/// | offset | size | field          |
/// |--------|------|----------------|
/// | 0      | 4    | length         |
/// | 4      | 2    | version major  |
/// | 6      | 2    | version minor  |
/// | 8      | 1    | program type   |
/// | 9      | 23   | reserved       |
///
/// `length` counts the code and descriptor bytes, excluding the CRC-32
/// that immediately follows them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub length: u32,
    pub version: Version,
    pub program_type: ProgramType,
}

impl Descriptor {
    pub fn parse(bytes: &[u8; DESCRIPTOR_SIZE]) -> Self {
        Self {
            length: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            version: Version {
                major: u16::from_le_bytes([bytes[4], bytes[5]]),
                minor: u16::from_le_bytes([bytes[6], bytes[7]]),
            },
            program_type: bytes[8].into(),
        }
    }

    /// Serializes the descriptor, with zeroed reserved bytes.
    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_SIZE] {
        let mut bytes = [0u8; DESCRIPTOR_SIZE];
        bytes[0..4].copy_from_slice(&self.length.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.version.major.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.version.minor.to_le_bytes());
        bytes[8] = self.program_type.into();
        bytes
    }

    /// Reads the descriptor embedded in the image placed at `image`.
    pub fn read<F>(flash: &mut F, image: Address) -> Result<Self, Error>
    where
        F: flash::Read,
        Error: From<F::Error>,
    {
        let mut bytes = [0u8; DESCRIPTOR_SIZE];
        block!(flash.read(image + crate::config::DESCRIPTOR_OFFSET, &mut bytes))?;
        Ok(Self::parse(&bytes))
    }

    /// Extracts the descriptor from the start of a decrypted image.
    pub fn from_plaintext(plaintext: &[u8]) -> Option<Self> {
        let offset = crate::config::DESCRIPTOR_OFFSET;
        let mut bytes = [0u8; DESCRIPTOR_SIZE];
        bytes.copy_from_slice(plaintext.get(offset..offset + DESCRIPTOR_SIZE)?);
        Some(Self::parse(&bytes))
    }

    pub fn is_application(&self) -> bool { self.program_type == ProgramType::Application }
}
