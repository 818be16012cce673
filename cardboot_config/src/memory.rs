use serde::{Deserialize, Serialize};

use crate::ConfigurationProblem;

/// Size of the cipher block every image is streamed in.
pub const CIPHER_BLOCK_SIZE: u32 = 16;

/// Size of the image descriptor embedded in every firmware binary.
pub const DESCRIPTOR_SIZE: u32 = 32;

/// Number of sectors decrypted up front to reach the image descriptor.
pub const HEADER_SECTORS: u32 = 3;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MemoryConfiguration {
    /// Total size of the MCU flash, starting at address zero.
    pub flash_size: u32,
    /// First address of the application region. Everything below
    /// belongs to the bootloader.
    pub application_base: u32,
    /// Size of the smallest erasable region.
    pub sector_size: u32,
    /// Offset of the image descriptor from the start of an image.
    pub descriptor_offset: u32,
    pub ram_origin: u32,
    pub ram_size: u32,
}

impl MemoryConfiguration {
    pub fn header_span(&self) -> u32 { self.sector_size * HEADER_SECTORS }

    pub fn problems(&self) -> impl Iterator<Item = ConfigurationProblem> {
        let sector_size_valid = self.sector_size.is_power_of_two();
        #[rustfmt::skip]
        let problems = [
            (!sector_size_valid).then(|| ConfigurationProblem::SectorSizeNotPowerOfTwo),

            (self.sector_size % CIPHER_BLOCK_SIZE != 0)
                .then(|| ConfigurationProblem::SectorSizeNotBlockMultiple),

            (sector_size_valid && self.application_base % self.sector_size != 0)
                .then(|| ConfigurationProblem::ApplicationBaseMisaligned),

            (self.application_base >= self.flash_size)
                .then(|| ConfigurationProblem::ApplicationBaseOutOfFlash),

            (self.descriptor_offset + DESCRIPTOR_SIZE > self.header_span())
                .then(|| ConfigurationProblem::DescriptorOutsideHeader),

            (self.flash_size.saturating_sub(self.application_base) < self.header_span())
                .then(|| ConfigurationProblem::FlashTooSmallForHeader),
        ];
        problems.into_iter().flatten()
    }
}
