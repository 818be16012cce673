use super::error::FakeError;
use crate::{
    config::{APPLICATION_BASE, FLASH_SIZE, SECTOR_SIZE},
    hal::flash::{self, Address, ERASED_BYTE},
};
use std::{vec, vec::Vec};

/// In-memory flash behaving like the real array: programming can only clear
/// bits of erased words, the bootloader region is protected and every
/// operation keeps the controller busy for a configurable number of polls.
pub struct FakeFlash {
    pub data: Vec<u8>,
    pub busy_polls: u32,
    pending_polls: u32,
    pub erased_sectors: Vec<Address>,
    pub words_written: usize,
}

impl FakeFlash {
    pub fn new() -> Self {
        Self {
            data: vec![ERASED_BYTE; FLASH_SIZE as usize],
            busy_polls: 0,
            pending_polls: 0,
            erased_sectors: Vec::new(),
            words_written: 0,
        }
    }

    /// Flash that reports `WouldBlock` this many times before completing each operation.
    pub fn busy(busy_polls: u32) -> Self {
        Self { busy_polls, pending_polls: busy_polls, ..Self::new() }
    }

    /// Places bytes directly in the array, as a debug probe would.
    pub fn preload(&mut self, address: Address, bytes: &[u8]) {
        let start = usize::from(address);
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn slice(&self, address: Address, length: usize) -> &[u8] {
        let start = usize::from(address);
        &self.data[start..start + length]
    }

    pub fn was_touched(&self) -> bool { !self.erased_sectors.is_empty() || self.words_written > 0 }

    fn poll(&mut self) -> nb::Result<(), FakeError> {
        if self.pending_polls > 0 {
            self.pending_polls -= 1;
            Err(nb::Error::WouldBlock)
        } else {
            self.pending_polls = self.busy_polls;
            Ok(())
        }
    }

    fn writable(address: Address, length: usize) -> bool {
        address.0 >= APPLICATION_BASE && address.0 as usize + length <= FLASH_SIZE as usize
    }
}

impl Default for FakeFlash {
    fn default() -> Self { Self::new() }
}

impl flash::Read for FakeFlash {
    type Error = FakeError;

    fn read(&mut self, address: Address, bytes: &mut [u8]) -> nb::Result<(), Self::Error> {
        if address.0 as usize + bytes.len() > self.data.len() {
            return Err(nb::Error::Other(FakeError));
        }
        self.poll()?;
        bytes.copy_from_slice(self.slice(address, bytes.len()));
        Ok(())
    }
}

impl flash::Program for FakeFlash {
    fn erase_sector(&mut self, address: Address) -> nb::Result<(), Self::Error> {
        if !Self::writable(address, SECTOR_SIZE) || !address.is_aligned_to(SECTOR_SIZE) {
            return Err(nb::Error::Other(FakeError));
        }
        self.poll()?;
        let start = usize::from(address);
        self.data[start..start + SECTOR_SIZE].iter_mut().for_each(|b| *b = ERASED_BYTE);
        self.erased_sectors.push(address);
        Ok(())
    }

    fn write_words(&mut self, address: Address, words: &[u32]) -> nb::Result<(), Self::Error> {
        let length = words.len() * 4;
        if !Self::writable(address, length) || !address.is_aligned_to(4) {
            return Err(nb::Error::Other(FakeError));
        }
        let start = usize::from(address);
        if self.data[start..start + length].iter().any(|b| *b != ERASED_BYTE) {
            return Err(nb::Error::Other(FakeError));
        }
        self.poll()?;
        for (chunk, word) in self.data[start..start + length].chunks_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        self.words_written += words.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::flash::{Program, Read};

    #[test]
    fn fake_flash_spans_the_whole_array_and_starts_erased() {
        let flash = FakeFlash::new();
        assert_eq!(flash.data.len(), kb!(128));
        assert!(flash.data.iter().all(|b| *b == ERASED_BYTE));
    }

    #[test]
    fn programming_requires_a_previous_erase() {
        // Given
        let mut flash = FakeFlash::new();
        let base = Address(APPLICATION_BASE);

        // When
        nb::block!(flash.write_words(base, &[0x1234_5678])).unwrap();

        // Then
        assert_eq!(flash.slice(base, 4), &[0x78, 0x56, 0x34, 0x12]);
        assert!(nb::block!(flash.write_words(base, &[0])).is_err());
        nb::block!(flash.erase_sector(base)).unwrap();
        nb::block!(flash.write_words(base, &[0])).unwrap();
    }

    #[test]
    fn bootloader_region_is_protected() {
        let mut flash = FakeFlash::new();
        assert!(nb::block!(flash.erase_sector(Address(0))).is_err());
        assert!(nb::block!(flash.write_words(Address(APPLICATION_BASE - 4), &[0])).is_err());
        assert!(nb::block!(flash.erase_sector(Address(APPLICATION_BASE + 4))).is_err());
        assert!(!flash.was_touched());
    }

    #[test]
    fn busy_flash_completes_after_polling() {
        let mut flash = FakeFlash::busy(3);
        let mut byte = [0u8; 1];
        assert_eq!(flash.read(Address(0), &mut byte), Err(nb::Error::WouldBlock));
        nb::block!(flash.read(Address(0), &mut byte)).unwrap();
        assert_eq!(byte, [ERASED_BYTE]);
    }
}
