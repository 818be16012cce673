//! Builds candidate images the way the release tooling packages them.
use super::{Descriptor, ProgramType, Version, DESCRIPTOR_SIZE};
use crate::{
    config::{
        APPLICATION_BASE, AUTHENTICATION_KEY, DESCRIPTOR_OFFSET, ENCRYPTION_IV, ENCRYPTION_KEY,
        HEADER_SPAN,
    },
    devices::crypto::BLOCK_SIZE,
    hal::{doubles::flash::FakeFlash, flash::Address, flash::ERASED_BYTE},
};
use aes::{
    cipher::{BlockEncryptMut, KeyIvInit},
    Aes128,
};
use cmac::{Cmac, Mac};
use crc::crc32;
use std::vec::Vec;

pub const NONCE: [u8; BLOCK_SIZE] = [0x4E; BLOCK_SIZE];

/// Plaintext application of `length` code bytes (descriptor included),
/// followed by its CRC-32 and padded to whole cipher blocks and to at
/// least the header span.
pub fn application(version: Version, length: usize) -> Vec<u8> {
    assert!(length % 4 == 0 && length >= DESCRIPTOR_OFFSET + DESCRIPTOR_SIZE);
    let mut image: Vec<u8> = (0..length).map(|i| (i * 7 + 3) as u8).collect();
    let descriptor =
        Descriptor { length: length as u32, version, program_type: ProgramType::Application };
    image[DESCRIPTOR_OFFSET..DESCRIPTOR_OFFSET + DESCRIPTOR_SIZE]
        .copy_from_slice(&descriptor.to_bytes());
    let crc = crc32::checksum_ieee(&image);
    image.extend_from_slice(&crc.to_le_bytes());
    let padded = ((image.len() + BLOCK_SIZE - 1) / BLOCK_SIZE * BLOCK_SIZE).max(HEADER_SPAN);
    image.resize(padded, ERASED_BYTE);
    image
}

/// Rewrites the program type in the descriptor. The stored CRC goes stale.
pub fn set_program_type(plaintext: &mut [u8], program_type: ProgramType) {
    plaintext[DESCRIPTOR_OFFSET + 8] = program_type.into();
}

/// Encrypts `plaintext` behind a nonce and appends the MAC.
pub fn package(plaintext: &[u8]) -> Vec<u8> {
    assert_eq!(plaintext.len() % BLOCK_SIZE, 0);
    let mut encryptor =
        cbc::Encryptor::<Aes128>::new(&ENCRYPTION_KEY.into(), &ENCRYPTION_IV.into());
    let mut file = Vec::with_capacity(plaintext.len() + 2 * BLOCK_SIZE);
    for block in NONCE.chunks_exact(BLOCK_SIZE).chain(plaintext.chunks_exact(BLOCK_SIZE)) {
        let mut block = aes::Block::clone_from_slice(block);
        encryptor.encrypt_block_mut(&mut block);
        file.extend_from_slice(&block);
    }
    let mut mac = <Cmac<Aes128> as Mac>::new(&AUTHENTICATION_KEY.into());
    mac.update(&file);
    let tag = mac.finalize().into_bytes();
    file.extend_from_slice(&tag);
    file
}

/// Places a plaintext image in the application region, as if installed.
pub fn flash_application(flash: &mut FakeFlash, plaintext: &[u8]) {
    flash.preload(Address(APPLICATION_BASE), plaintext);
}
