//! FTMRE flash controller of the Kinetis KE06 family.
//!
//! The controller is driven through the FCCOB command registers: an index
//! register selects which half word pair `FCCOBHI:FCCOBLO` is loaded, and
//! writing CCIF to FSTAT launches the command.
use crate::{
    config::{APPLICATION_BASE, FLASH_SIZE, SECTOR_SIZE},
    error::{self, Error as BootloaderError},
    hal::flash::{Address, Program, Read},
};
use core::ptr;

const FTMRE_BASE: usize = 0x4002_0000;

/// Platform control register of the miscellaneous control module.
const MCM_PLACR: usize = 0xF000_300C;

/// Stalls bus accesses to flash while a command runs. The KE06 has a
/// single flash block, so the bootloader keeps fetching instructions from
/// the block it programs, and without this every fetch is a read collision.
const PLACR_ESFC: u32 = 1 << 16;

mod register {
    use super::FTMRE_BASE;
    pub const FCCOBIX: usize = FTMRE_BASE + 0x1;
    pub const FCLKDIV: usize = FTMRE_BASE + 0x3;
    pub const FSTAT: usize = FTMRE_BASE + 0x5;
    pub const FCCOBLO: usize = FTMRE_BASE + 0x8;
    pub const FCCOBHI: usize = FTMRE_BASE + 0x9;
}

mod fstat {
    pub const CCIF: u8 = 0x80;
    pub const ACCERR: u8 = 0x20;
    pub const FPVIOL: u8 = 0x10;
}

mod command {
    pub const PROGRAM: u8 = 0x06;
    pub const ERASE_SECTOR: u8 = 0x0A;
}

/// Divider bringing a 20MHz bus clock down to the 1MHz the controller needs.
const CLOCK_DIVIDER: u8 = 0x13;

/// Words programmed by a single program command.
const WORDS_PER_COMMAND: usize = 2;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Error {
    MemoryNotReachable,
    MisalignedAccess,
    AccessError,
    ProtectionViolation,
}

impl error::Convertible for Error {
    fn into(self) -> BootloaderError {
        BootloaderError::DriverError(match self {
            Error::MemoryNotReachable => "[MCU Flash] Memory not reachable",
            Error::MisalignedAccess => "[MCU Flash] Misaligned access",
            Error::AccessError => "[MCU Flash] Command access error",
            Error::ProtectionViolation => "[MCU Flash] Protection violation",
        })
    }
}

/// Access to the controller registers and to the flash array itself.
pub trait Bus {
    fn read_u8(&self, address: usize) -> u8;
    fn write_u8(&mut self, address: usize, value: u8);
    fn read_u32(&self, address: usize) -> u32;
    fn write_u32(&mut self, address: usize, value: u32);
}

/// The system bus, accessed through volatile pointers.
pub struct Mmio {
    _private: (),
}

impl Bus for Mmio {
    // NOTE(Safety): Applies to every access below. `Mmio` is only built by
    // `McuFlash::new`, whose contract grants exclusive use of the FTMRE and
    // MCM registers, and the driver only reads flash inside its map.
    fn read_u8(&self, address: usize) -> u8 { unsafe { ptr::read_volatile(address as *const u8) } }

    fn write_u8(&mut self, address: usize, value: u8) {
        unsafe { ptr::write_volatile(address as *mut u8, value) }
    }

    fn read_u32(&self, address: usize) -> u32 {
        unsafe { ptr::read_volatile(address as *const u32) }
    }

    fn write_u32(&mut self, address: usize, value: u32) {
        unsafe { ptr::write_volatile(address as *mut u32, value) }
    }
}

pub struct McuFlash<B: Bus = Mmio> {
    bus: B,
}

impl McuFlash<Mmio> {
    /// Takes ownership of the flash controller and configures its clock.
    ///
    /// # Safety
    ///
    /// Must only be called once. Nothing else may drive the FTMRE or MCM
    /// registers while the returned driver is alive.
    pub unsafe fn new() -> Self { Self::with_bus(Mmio { _private: () }) }
}

impl<B: Bus> McuFlash<B> {
    pub fn with_bus(mut bus: B) -> Self {
        if bus.read_u8(register::FCLKDIV) != CLOCK_DIVIDER {
            bus.write_u8(register::FCLKDIV, CLOCK_DIVIDER);
        }
        Self { bus }
    }

    fn is_busy(&self) -> bool { self.bus.read_u8(register::FSTAT) & fstat::CCIF == 0 }

    fn load_pair(&mut self, index: u8, high: u8, low: u8) {
        self.bus.write_u8(register::FCCOBIX, index);
        self.bus.write_u8(register::FCCOBHI, high);
        self.bus.write_u8(register::FCCOBLO, low);
    }

    /// Loads the command code and target address into the first two FCCOB pairs.
    fn load_command(&mut self, code: u8, address: Address) {
        let [low, middle, high, _] = address.0.to_le_bytes();
        self.bus.write_u8(register::FSTAT, fstat::ACCERR | fstat::FPVIOL);
        self.load_pair(0, code, high);
        self.load_pair(1, middle, low);
    }

    /// Launches the loaded command and spins until the controller is idle.
    fn launch(&mut self) -> Result<(), Error> {
        let placr = self.bus.read_u32(MCM_PLACR);
        self.bus.write_u32(MCM_PLACR, placr | PLACR_ESFC);
        self.bus.write_u8(register::FSTAT, fstat::CCIF);
        while self.is_busy() {}
        let status = self.bus.read_u8(register::FSTAT);
        if status & fstat::FPVIOL != 0 {
            Err(Error::ProtectionViolation)
        } else if status & fstat::ACCERR != 0 {
            Err(Error::AccessError)
        } else {
            Ok(())
        }
    }

    fn program_pair(&mut self, address: Address, pair: [u32; WORDS_PER_COMMAND]) -> Result<(), Error> {
        self.load_command(command::PROGRAM, address);
        for (index, word) in pair.iter().enumerate() {
            let [b0, b1, b2, b3] = word.to_le_bytes();
            let first = 2 + 2 * index as u8;
            self.load_pair(first, b1, b0);
            self.load_pair(first + 1, b3, b2);
        }
        self.launch()
    }
}

/// Whether `[address, address + length)` lies in the application area.
fn is_writable(address: Address, length: usize) -> bool {
    let end = address.0 as usize + length;
    address.0 >= APPLICATION_BASE && end <= FLASH_SIZE as usize
}

impl<B: Bus> Read for McuFlash<B> {
    type Error = Error;

    fn read(&mut self, address: Address, bytes: &mut [u8]) -> nb::Result<(), Self::Error> {
        if !is_writable(address, bytes.len()) {
            return Err(nb::Error::Other(Error::MemoryNotReachable));
        }
        if self.is_busy() {
            return Err(nb::Error::WouldBlock);
        }
        let base = usize::from(address);
        for (index, byte) in bytes.iter_mut().enumerate() {
            *byte = self.bus.read_u8(base + index);
        }
        Ok(())
    }
}

impl<B: Bus> Program for McuFlash<B> {
    fn erase_sector(&mut self, address: Address) -> nb::Result<(), Self::Error> {
        if !address.is_aligned_to(SECTOR_SIZE) {
            return Err(nb::Error::Other(Error::MisalignedAccess));
        }
        if !is_writable(address, SECTOR_SIZE) {
            return Err(nb::Error::Other(Error::MemoryNotReachable));
        }
        // Early yield if busy
        if self.is_busy() {
            return Err(nb::Error::WouldBlock);
        }
        self.load_command(command::ERASE_SECTOR, address);
        self.launch().map_err(nb::Error::Other)
    }

    fn write_words(&mut self, address: Address, words: &[u32]) -> nb::Result<(), Self::Error> {
        let step = WORDS_PER_COMMAND * core::mem::size_of::<u32>();
        if !address.is_aligned_to(step) {
            return Err(nb::Error::Other(Error::MisalignedAccess));
        }
        if !is_writable(address, words.len() * core::mem::size_of::<u32>()) {
            return Err(nb::Error::Other(Error::MemoryNotReachable));
        }
        if self.is_busy() {
            return Err(nb::Error::WouldBlock);
        }
        for (index, chunk) in words.chunks(WORDS_PER_COMMAND).enumerate() {
            // A trailing lone word is paired with an erased one.
            let pair = [chunk[0], chunk.get(1).copied().unwrap_or(u32::MAX)];
            self.program_pair(address + index * step, pair).map_err(nb::Error::Other)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{vec, vec::Vec};

    /// Register level model of the controller. Commands complete as soon
    /// as they are launched, reporting `status_after_launch`.
    struct FakeFtmre {
        fstat: u8,
        fclkdiv: u8,
        placr: u32,
        /// FCCOB pairs loaded since the last launch, as `(index, high, low)`.
        fccob: Vec<(u8, u8, u8)>,
        index: u8,
        /// Command pairs and the PLACR value seen at each launch.
        launches: Vec<(Vec<(u8, u8, u8)>, u32)>,
        status_after_launch: u8,
        memory: Vec<u8>,
    }

    impl FakeFtmre {
        fn new() -> Self {
            Self {
                fstat: fstat::CCIF,
                fclkdiv: 0,
                placr: 0,
                fccob: Vec::new(),
                index: 0,
                launches: Vec::new(),
                status_after_launch: 0,
                memory: vec![0xFF; FLASH_SIZE as usize],
            }
        }

        fn pending(&mut self) -> &mut (u8, u8, u8) {
            let index = self.index;
            if self.fccob.last().map_or(true, |(i, _, _)| *i != index) {
                self.fccob.push((index, 0, 0));
            }
            self.fccob.last_mut().unwrap()
        }
    }

    impl Bus for FakeFtmre {
        fn read_u8(&self, address: usize) -> u8 {
            match address {
                register::FSTAT => self.fstat,
                register::FCLKDIV => self.fclkdiv,
                a if a < FLASH_SIZE as usize => self.memory[a],
                a => panic!("Unexpected byte read at {:#x}", a),
            }
        }

        fn write_u8(&mut self, address: usize, value: u8) {
            match address {
                register::FCLKDIV => self.fclkdiv = value,
                register::FCCOBIX => self.index = value,
                register::FCCOBHI => self.pending().1 = value,
                register::FCCOBLO => self.pending().2 = value,
                register::FSTAT if value & fstat::CCIF != 0 => {
                    let command = std::mem::take(&mut self.fccob);
                    self.launches.push((command, self.placr));
                    self.fstat = fstat::CCIF | self.status_after_launch;
                }
                register::FSTAT => self.fstat &= !(value & (fstat::ACCERR | fstat::FPVIOL)),
                a => panic!("Unexpected byte write at {:#x}", a),
            }
        }

        fn read_u32(&self, address: usize) -> u32 {
            assert_eq!(address, MCM_PLACR);
            self.placr
        }

        fn write_u32(&mut self, address: usize, value: u32) {
            assert_eq!(address, MCM_PLACR);
            self.placr = value;
        }
    }

    fn flash() -> McuFlash<FakeFtmre> { McuFlash::with_bus(FakeFtmre::new()) }

    #[test]
    fn controller_clock_is_divided_down_on_creation() {
        assert_eq!(flash().bus.fclkdiv, CLOCK_DIVIDER);
    }

    #[test]
    fn every_command_runs_with_flash_stalling_enabled() {
        // Given
        let mut flash = flash();
        flash.bus.placr = 0x0000_0A00;
        let sector = Address(APPLICATION_BASE);

        // When
        flash.erase_sector(sector).unwrap();
        flash.write_words(sector, &[1, 2, 3, 4]).unwrap();

        // Then
        assert_eq!(flash.bus.launches.len(), 3);
        for (_, placr) in &flash.bus.launches {
            assert_eq!(*placr, 0x0000_0A00 | PLACR_ESFC);
        }
    }

    #[test]
    fn erase_loads_the_command_and_sector_address() {
        let mut flash = flash();
        flash.erase_sector(Address(0x0001_2400)).unwrap();

        let (command, _) = &flash.bus.launches[0];
        assert_eq!(command, &[(0, command::ERASE_SECTOR, 0x01), (1, 0x24, 0x00)]);
    }

    #[test]
    fn words_are_programmed_in_pairs_with_odd_counts_padded() {
        // Given
        let mut flash = flash();
        let address = Address(APPLICATION_BASE + 8);

        // When
        flash.write_words(address, &[0x4433_2211, 0x8877_6655, 0xCCBB_AA99]).unwrap();

        // Then
        let [low, middle, high, _] = address.0.to_le_bytes();
        let header = [(0, command::PROGRAM, high), (1, middle, low)];
        let (first, _) = &flash.bus.launches[0];
        assert_eq!(first[..2], header);
        assert_eq!(first[2..], [(2, 0x22, 0x11), (3, 0x44, 0x33), (4, 0x66, 0x55), (5, 0x88, 0x77)]);
        let (second, _) = &flash.bus.launches[1];
        assert_eq!(second[1], (1, middle, low + 8));
        assert_eq!(second[2..], [(2, 0xAA, 0x99), (3, 0xCC, 0xBB), (4, 0xFF, 0xFF), (5, 0xFF, 0xFF)]);
    }

    #[test]
    fn bootloader_region_and_misaligned_addresses_are_refused() {
        let mut flash = flash();
        let below = Address(APPLICATION_BASE - SECTOR_SIZE as u32);

        assert_eq!(flash.erase_sector(below), Err(nb::Error::Other(Error::MemoryNotReachable)));
        assert_eq!(
            flash.erase_sector(Address(APPLICATION_BASE + 4)),
            Err(nb::Error::Other(Error::MisalignedAccess))
        );
        assert_eq!(
            flash.write_words(Address(APPLICATION_BASE + 4), &[0]),
            Err(nb::Error::Other(Error::MisalignedAccess))
        );
        assert_eq!(
            flash.write_words(Address(FLASH_SIZE - 8), &[0, 0, 0, 0]),
            Err(nb::Error::Other(Error::MemoryNotReachable))
        );
        assert!(flash.bus.launches.is_empty());
    }

    #[test]
    fn controller_errors_are_reported() {
        let mut flash = flash();
        flash.bus.status_after_launch = fstat::FPVIOL;
        assert_eq!(
            flash.erase_sector(Address(APPLICATION_BASE)),
            Err(nb::Error::Other(Error::ProtectionViolation))
        );

        flash.bus.status_after_launch = fstat::ACCERR;
        assert_eq!(
            flash.write_words(Address(APPLICATION_BASE), &[0, 0]),
            Err(nb::Error::Other(Error::AccessError))
        );

        // Stale error flags are cleared before the next command.
        flash.bus.status_after_launch = 0;
        assert_eq!(flash.erase_sector(Address(APPLICATION_BASE)), Ok(()));
    }

    #[test]
    fn busy_controller_yields() {
        let mut flash = flash();
        flash.bus.fstat = 0;
        let mut bytes = [0u8; 4];
        assert_eq!(flash.erase_sector(Address(APPLICATION_BASE)), Err(nb::Error::WouldBlock));
        assert_eq!(flash.read(Address(APPLICATION_BASE), &mut bytes), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn reads_come_straight_from_the_flash_array() {
        let mut flash = flash();
        let base = APPLICATION_BASE as usize;
        flash.bus.memory[base..base + 4].copy_from_slice(&[1, 2, 3, 4]);
        let mut bytes = [0u8; 4];
        flash.read(Address(APPLICATION_BASE), &mut bytes).unwrap();
        assert_eq!(bytes, [1, 2, 3, 4]);
        assert!(flash.read(Address(0), &mut bytes).is_err());
    }
}
