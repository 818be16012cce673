//! Cryptographic contexts used to authenticate and decrypt firmware images.
//!
//! Both contexts are stateful and consumed by exactly one operation: a MAC
//! accumulates a whole candidate, and a decryptor carries its CBC chain
//! across the whole installation.
use aes::{
    cipher::{BlockDecryptMut, KeyIvInit},
    Aes128,
};
use cmac::{Cmac, Mac};
use subtle::ConstantTimeEq;

/// Native block size of the underlying cipher.
pub const BLOCK_SIZE: usize = 16;

pub type Block = [u8; BLOCK_SIZE];

/// Incremental message authentication over a block stream.
pub trait StreamingMac {
    /// Absorbs a block that is known not to be the final one.
    fn update(&mut self, block: &Block);

    /// Absorbs the final block and produces the tag.
    fn finalize(self, last: &Block) -> Block;
}

/// Block decryption whose chaining state persists across calls.
pub trait ChainDecryptor {
    /// Decrypts and discards the nonce that opens the chain.
    fn prime(&mut self, nonce: &Block);

    /// Decrypts whole blocks from `ciphertext` into `plaintext`, continuing
    /// the chain. Both slices must hold the same whole number of blocks.
    fn decrypt(&mut self, ciphertext: &[u8], plaintext: &mut [u8]);
}

/// Compares two tags without leaking the position of the first difference.
pub fn tags_match(computed: &Block, stored: &Block) -> bool {
    computed[..].ct_eq(&stored[..]).into()
}

/// AES-128 CMAC (RFC 4493).
pub struct AesCmac(Cmac<Aes128>);

impl AesCmac {
    pub fn new(key: &[u8; BLOCK_SIZE]) -> Self {
        Self(<Cmac<Aes128> as Mac>::new(&(*key).into()))
    }
}

impl StreamingMac for AesCmac {
    fn update(&mut self, block: &Block) { Mac::update(&mut self.0, block); }

    fn finalize(mut self, last: &Block) -> Block {
        Mac::update(&mut self.0, last);
        self.0.finalize().into_bytes().into()
    }
}

/// AES-128 in cipher block chaining mode.
pub struct AesCbcDecryptor(cbc::Decryptor<Aes128>);

impl AesCbcDecryptor {
    pub fn new(key: &[u8; BLOCK_SIZE], iv: &[u8; BLOCK_SIZE]) -> Self {
        Self(cbc::Decryptor::<Aes128>::new(&(*key).into(), &(*iv).into()))
    }
}

impl ChainDecryptor for AesCbcDecryptor {
    fn prime(&mut self, nonce: &Block) {
        let mut discarded = aes::Block::from(*nonce);
        self.0.decrypt_block_mut(&mut discarded);
    }

    fn decrypt(&mut self, ciphertext: &[u8], plaintext: &mut [u8]) {
        for (input, output) in
            ciphertext.chunks_exact(BLOCK_SIZE).zip(plaintext.chunks_exact_mut(BLOCK_SIZE))
        {
            self.0.decrypt_block_b2b_mut(input.into(), output.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const RFC_4493_KEY: [u8; 16] = hex!("2b7e151628aed2a6abf7158809cf4f3c");
    const NIST_IV: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");

    #[test]
    fn cmac_of_a_single_block_matches_rfc_4493() {
        let mac = AesCmac::new(&RFC_4493_KEY);
        let tag = mac.finalize(&hex!("6bc1bee22e409f96e93d7e117393172a"));
        assert_eq!(tag, hex!("070a16b46b4d4144f79bdd9dd04a287c"));
    }

    #[test]
    fn cmac_of_a_streamed_message_matches_rfc_4493() {
        let mut mac = AesCmac::new(&RFC_4493_KEY);
        mac.update(&hex!("6bc1bee22e409f96e93d7e117393172a"));
        mac.update(&hex!("ae2d8a571e03ac9c9eb76fac45af8e51"));
        mac.update(&hex!("30c81c46a35ce411e5fbc1191a0a52ef"));
        let tag = mac.finalize(&hex!("f69f2445df4f9b17ad2b417be66c3710"));
        assert_eq!(tag, hex!("51f0bebf7e3b9d92fc49741779363cfe"));
    }

    #[test]
    fn cbc_chain_continues_after_priming_with_the_first_block() {
        // Given
        let mut decryptor = AesCbcDecryptor::new(&RFC_4493_KEY, &NIST_IV);
        let mut plaintext = [0u8; 16];

        // When
        decryptor.prime(&hex!("7649abac8119b246cee98e9b12e9197d"));
        decryptor.decrypt(&hex!("5086cb9b507219ee95db113a917678b2"), &mut plaintext);

        // Then
        assert_eq!(plaintext, hex!("ae2d8a571e03ac9c9eb76fac45af8e51"));
    }

    #[test]
    fn tags_are_compared_in_full() {
        let tag = hex!("070a16b46b4d4144f79bdd9dd04a287c");
        let mut tampered = tag;
        tampered[15] ^= 1;
        assert!(tags_match(&tag, &tag));
        assert!(!tags_match(&tag, &tampered));
    }
}
