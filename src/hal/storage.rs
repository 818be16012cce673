//! Removable storage interfaces.
//!
//! A thin view of a FAT style filesystem: just enough to list a
//! directory, read candidate images, mark them as processed and
//! write a diagnostic log.
use core::fmt;

/// Longest file name (with extension) a directory entry can yield.
pub const MAX_FILE_NAME: usize = 32;

/// Longest path (directory, separator and file name).
pub const MAX_PATH: usize = 64;

pub type FileName = heapless::String<MAX_FILE_NAME>;
pub type Path = heapless::String<MAX_PATH>;

/// An open file. Reads and writes advance a single cursor.
pub trait File {
    type Error: Clone + Copy + fmt::Debug;

    /// Total size in bytes.
    fn size(&self) -> u32;

    /// Moves the cursor to an absolute byte offset.
    fn seek(&mut self, offset: u32) -> Result<(), Self::Error>;

    /// Reads up to `bytes.len()` bytes, returning how many were read.
    /// Zero means end of file.
    fn read(&mut self, bytes: &mut [u8]) -> Result<usize, Self::Error>;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error>;
}

pub trait Storage {
    type Error: Clone + Copy + fmt::Debug;
    type File: File<Error = Self::Error>;
    /// Cursor over the entries of an open directory.
    type Directory;

    fn mount(&mut self) -> Result<(), Self::Error>;

    fn open_directory(&mut self, path: &str) -> Result<Self::Directory, Self::Error>;

    /// Yields the name of the next entry, or `None` once the listing is exhausted.
    fn next_entry(
        &mut self,
        directory: &mut Self::Directory,
    ) -> Result<Option<FileName>, Self::Error>;

    /// Opens an existing file for reading.
    fn open(&mut self, path: &str) -> Result<Self::File, Self::Error>;

    /// Creates a file for writing, truncating it if it exists.
    fn create(&mut self, path: &str) -> Result<Self::File, Self::Error>;

    /// Fails if `to` already exists.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), Self::Error>;

    fn remove(&mut self, path: &str) -> Result<(), Self::Error>;

    /// Flushes and releases a file.
    fn close(&mut self, file: Self::File) -> Result<(), Self::Error>;
}

/// Reads until `bytes` is full or the file ends, returning how many bytes were read.
pub fn read_fully<F: File>(file: &mut F, bytes: &mut [u8]) -> Result<usize, F::Error> {
    let mut total = 0;
    while total < bytes.len() {
        match file.read(&mut bytes[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}
