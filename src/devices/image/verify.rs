//! Authentication of candidate images.
use crate::{
    devices::crypto::{tags_match, Block, StreamingMac, BLOCK_SIZE},
    error::Error,
    hal::storage::{read_fully, File},
};

/// Smallest authenticable candidate: a nonce, one payload block and the MAC.
pub const MINIMUM_IMAGE_SIZE: usize = 3 * BLOCK_SIZE;

/// Streams a candidate from its current position through `mac`, and
/// compares the result against the trailing tag.
///
/// Every block but the last one is authenticated. The final block is the
/// stored tag. No plaintext is produced, so nothing derived from an
/// unauthenticated image is ever interpreted. `progress` is called once
/// per block read.
pub fn verify<F, M, P>(file: &mut F, mut mac: M, mut progress: P) -> Result<(), Error>
where
    F: File,
    M: StreamingMac,
    P: FnMut(),
{
    let size = file.size() as usize;
    if size < MINIMUM_IMAGE_SIZE || size % BLOCK_SIZE != 0 {
        return Err(Error::ImageSizeInvalid);
    }
    let blocks = size / BLOCK_SIZE;

    let mut pending = read_block(file)?;
    progress();
    for _ in 1..blocks - 1 {
        let next = read_block(file)?;
        progress();
        mac.update(&pending);
        pending = next;
    }
    let computed = mac.finalize(&pending);

    let stored = read_block(file)?;
    progress();
    if tags_match(&computed, &stored) {
        Ok(())
    } else {
        Err(Error::SignatureMismatch)
    }
}

fn read_block<F: File>(file: &mut F) -> Result<Block, Error> {
    let mut block = [0u8; BLOCK_SIZE];
    match read_fully(file, &mut block) {
        Ok(BLOCK_SIZE) => Ok(block),
        Ok(_) => Err(Error::UnexpectedEndOfFile),
        Err(_) => Err(Error::StorageRead),
    }
}
