//! Decryption and programming of authenticated images.
use super::{Descriptor, Version};
use crate::{
    config::{APPLICATION_BASE, FLASH_SIZE, HEADER_SPAN, SECTOR_SIZE},
    devices::{
        crypto::{Block, ChainDecryptor, BLOCK_SIZE},
        traits::Flash,
    },
    error::Error,
    hal::{
        flash::{Address, ERASED_BYTE},
        storage::{read_fully, File},
    },
};
use core::mem::size_of;
use nb::block;

/// Words programmed per flash command.
const WORDS_PER_WRITE: usize = 2;

/// Scratch space for installation. The header sectors are decrypted in
/// full before anything is programmed, so the descriptor can be inspected
/// while the flash still holds the previous image. Later sectors reuse the
/// first sector's worth of each buffer.
pub struct Staging {
    pub ciphertext: [u8; HEADER_SPAN],
    pub plaintext: [u8; HEADER_SPAN],
}

impl Staging {
    pub const fn new() -> Self {
        Self { ciphertext: [0u8; HEADER_SPAN], plaintext: [0u8; HEADER_SPAN] }
    }
}

impl Default for Staging {
    fn default() -> Self { Self::new() }
}

/// Decrypts an authenticated candidate into the application region.
///
/// The file is re-read from the start. Unless `force_install` is set, the
/// candidate must be strictly newer than the image currently installed.
/// The candidate must describe an application, and it must fit in flash,
/// or nothing is touched. The trailing MAC is never programmed, and a
/// final partial sector is padded with the erased value.
///
/// A storage failure after programming starts leaves a partial image
/// behind, which the CRC check on the installed image refuses to boot.
///
/// Returns the version of the freshly installed image.
pub fn install<F, D, MCUF, P>(
    file: &mut F,
    mut decryptor: D,
    flash: &mut MCUF,
    staging: &mut Staging,
    force_install: bool,
    mut progress: P,
) -> Result<Version, Error>
where
    F: File,
    D: ChainDecryptor,
    MCUF: Flash,
    P: FnMut(),
{
    let size = file.size() as usize;
    if size % BLOCK_SIZE != 0 || size < 2 * BLOCK_SIZE + HEADER_SPAN {
        return Err(Error::ImageSizeInvalid);
    }
    let payload_size = size - 2 * BLOCK_SIZE;
    let sectors = (payload_size + SECTOR_SIZE - 1) / SECTOR_SIZE;
    if APPLICATION_BASE as usize + sectors * SECTOR_SIZE > FLASH_SIZE as usize {
        return Err(Error::ImageTooBig);
    }

    file.seek(0).map_err(|_| Error::StorageSeek)?;
    let mut nonce: Block = [0u8; BLOCK_SIZE];
    read_exact(file, &mut nonce)?;
    decryptor.prime(&nonce);

    let Staging { ciphertext, plaintext } = staging;
    read_exact(file, &mut ciphertext[..])?;
    decryptor.decrypt(&ciphertext[..], &mut plaintext[..]);

    let candidate = Descriptor::from_plaintext(&plaintext[..]).ok_or(Error::ImageSizeInvalid)?;
    if !candidate.is_application() {
        return Err(Error::WrongType);
    }
    if !force_install {
        let installed = Descriptor::read(flash, Address(APPLICATION_BASE))?;
        if candidate.version <= installed.version {
            return Err(Error::VersionNotNewer);
        }
    }

    let mut address = Address(APPLICATION_BASE);
    for sector in plaintext.chunks_exact(SECTOR_SIZE) {
        program_sector(flash, address, sector)?;
        address = address + SECTOR_SIZE;
        progress();
    }

    let mut remaining = payload_size - HEADER_SPAN;
    while remaining > 0 {
        let chunk = remaining.min(SECTOR_SIZE);
        read_exact(file, &mut ciphertext[..chunk])?;
        decryptor.decrypt(&ciphertext[..chunk], &mut plaintext[..chunk]);
        plaintext[chunk..SECTOR_SIZE].iter_mut().for_each(|b| *b = ERASED_BYTE);
        program_sector(flash, address, &plaintext[..SECTOR_SIZE])?;
        address = address + SECTOR_SIZE;
        remaining -= chunk;
        progress();
    }

    Ok(candidate.version)
}

fn read_exact<F: File>(file: &mut F, bytes: &mut [u8]) -> Result<(), Error> {
    match read_fully(file, bytes) {
        Ok(count) if count == bytes.len() => Ok(()),
        Ok(_) => Err(Error::UnexpectedEndOfFile),
        Err(_) => Err(Error::StorageRead),
    }
}

/// Erases the sector at `address`, then programs it with `bytes`.
fn program_sector<MCUF: Flash>(
    flash: &mut MCUF,
    address: Address,
    bytes: &[u8],
) -> Result<(), Error> {
    block!(flash.erase_sector(address))?;
    let stride = WORDS_PER_WRITE * size_of::<u32>();
    for (index, chunk) in bytes.chunks_exact(stride).enumerate() {
        let mut words = [0u32; WORDS_PER_WRITE];
        for (word, raw) in words.iter_mut().zip(chunk.chunks_exact(size_of::<u32>())) {
            *word = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }
        block!(flash.write_words(address + index * stride, &words))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ENCRYPTION_IV, ENCRYPTION_KEY},
        devices::{
            crypto::AesCbcDecryptor,
            image::{test_image, ProgramType},
        },
        hal::{
            doubles::{flash::FakeFlash, storage::FakeStorage},
            storage::Storage,
        },
    };
    use std::{boxed::Box, string::ToString, vec::Vec};

    fn decryptor() -> AesCbcDecryptor { AesCbcDecryptor::new(&ENCRYPTION_KEY, &ENCRYPTION_IV) }

    fn install_bytes(
        bytes: &[u8],
        flash: &mut FakeFlash,
        force_install: bool,
    ) -> Result<Version, Error> {
        let mut storage = FakeStorage::new();
        storage.add_file("image", bytes);
        let mut file = storage.open("image").unwrap();
        let mut staging = Box::new(Staging::new());
        install(&mut file, decryptor(), flash, &mut staging, force_install, || {})
    }

    fn flash_with_installed(version: Version) -> FakeFlash {
        let mut flash = FakeFlash::new();
        test_image::flash_application(&mut flash, &test_image::application(version, 4096));
        flash
    }

    #[test]
    fn installed_image_reproduces_the_plaintext() {
        // Given
        let plaintext = test_image::application(Version::new(0, 7), 8192);
        let mut flash = FakeFlash::new();

        // When
        let version =
            install_bytes(&test_image::package(&plaintext), &mut flash, true).unwrap();

        // Then
        assert_eq!(version, Version::new(0, 7));
        assert_eq!(flash.slice(Address(APPLICATION_BASE), plaintext.len()), &plaintext[..]);
        assert_eq!(flash.erased_sectors.len(), (plaintext.len() + SECTOR_SIZE - 1) / SECTOR_SIZE);
    }

    #[test]
    fn payloads_of_many_shapes_round_trip() {
        for length in [1072usize, 1532, 1600, 2044, 4100, 10000] {
            let plaintext = test_image::application(Version::new(1, 0), length);
            let mut flash = FakeFlash::busy(2);
            install_bytes(&test_image::package(&plaintext), &mut flash, true).unwrap();
            assert_eq!(
                flash.slice(Address(APPLICATION_BASE), plaintext.len()),
                &plaintext[..],
                "length {}",
                length
            );
        }
    }

    #[test]
    fn final_partial_sector_is_padded_with_the_erased_value() {
        let plaintext = test_image::application(Version::new(1, 0), 1600);
        assert_ne!(plaintext.len() % SECTOR_SIZE, 0);
        let mut flash = FakeFlash::new();
        flash.data.iter_mut().for_each(|b| *b = 0);

        install_bytes(&test_image::package(&plaintext), &mut flash, true).unwrap();

        let end = APPLICATION_BASE as usize + plaintext.len();
        let sector_end = (end + SECTOR_SIZE - 1) / SECTOR_SIZE * SECTOR_SIZE;
        assert!(flash.data[end..sector_end].iter().all(|b| *b == ERASED_BYTE));
        assert!(flash.data[sector_end..].iter().all(|b| *b == 0));
    }

    #[test]
    fn candidates_must_be_strictly_newer_than_the_installed_image() {
        let installed = Version::new(1, 5);
        for rejected in [Version::new(1, 5), Version::new(1, 4), Version::new(0, 9)] {
            let mut flash = flash_with_installed(installed);
            let image = test_image::package(&test_image::application(rejected, 2048));
            assert_eq!(install_bytes(&image, &mut flash, false), Err(Error::VersionNotNewer));
            assert!(!flash.was_touched());
        }
        for accepted in [Version::new(1, 6), Version::new(2, 0)] {
            let mut flash = flash_with_installed(installed);
            let image = test_image::package(&test_image::application(accepted, 2048));
            assert_eq!(install_bytes(&image, &mut flash, false), Ok(accepted));
        }
    }

    #[test]
    fn forced_installation_ignores_the_installed_version() {
        let mut flash = flash_with_installed(Version::new(3, 0));
        let plaintext = test_image::application(Version::new(0, 1), 2048);
        assert_eq!(
            install_bytes(&test_image::package(&plaintext), &mut flash, true),
            Ok(Version::new(0, 1))
        );
        assert_eq!(flash.slice(Address(APPLICATION_BASE), plaintext.len()), &plaintext[..]);
    }

    #[test]
    fn non_application_candidates_never_touch_flash() {
        let mut plaintext = test_image::application(Version::new(9, 9), 2048);
        test_image::set_program_type(&mut plaintext, ProgramType::Bootloader);
        let mut flash = FakeFlash::new();

        let result = install_bytes(&test_image::package(&plaintext), &mut flash, true);

        assert_eq!(result, Err(Error::WrongType));
        assert!(!flash.was_touched());
    }

    #[test]
    fn candidates_larger_than_the_application_region_are_refused() {
        let region = (FLASH_SIZE - APPLICATION_BASE) as usize;
        let plaintext = test_image::application(Version::new(1, 0), region + 4);
        let mut flash = FakeFlash::new();

        let result = install_bytes(&test_image::package(&plaintext), &mut flash, true);

        assert_eq!(result, Err(Error::ImageTooBig));
        assert!(!flash.was_touched());
    }

    #[test]
    fn candidates_too_short_to_hold_the_header_are_refused() {
        let mut flash = FakeFlash::new();
        let image: Vec<u8> = [0u8; 2 * BLOCK_SIZE + HEADER_SPAN - BLOCK_SIZE].to_vec();
        assert_eq!(install_bytes(&image, &mut flash, true), Err(Error::ImageSizeInvalid));
    }

    #[test]
    fn storage_failure_mid_stream_aborts_with_a_partial_image() {
        // Given
        let plaintext = test_image::application(Version::new(1, 0), 8192);
        let mut storage = FakeStorage::new();
        storage.add_file("image", &test_image::package(&plaintext));
        storage.failing_read = Some(("image".to_string(), 4096));
        let mut file = storage.open("image").unwrap();
        let mut flash = FakeFlash::new();
        let mut staging = Box::new(Staging::new());

        // When
        let result = install(&mut file, decryptor(), &mut flash, &mut staging, true, || {});

        // Then
        assert_eq!(result, Err(Error::StorageRead));
        assert!(flash.was_touched());
    }

    #[test]
    fn progress_is_reported_per_sector() {
        let plaintext = test_image::application(Version::new(1, 0), 4096);
        let mut storage = FakeStorage::new();
        storage.add_file("image", &test_image::package(&plaintext));
        let mut file = storage.open("image").unwrap();
        let mut flash = FakeFlash::new();
        let mut staging = Box::new(Staging::new());
        let mut sectors = 0;

        install(&mut file, decryptor(), &mut flash, &mut staging, true, || sectors += 1).unwrap();

        assert_eq!(sectors, flash.erased_sectors.len());
    }
}
