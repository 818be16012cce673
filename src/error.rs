//! cardboot Error types and methods

use ufmt::{uWrite, uwrite};

/// Top level error type for the bootloader. Unlike the specific
/// driver errors, this error is meant to be directly reported through
/// the update log on storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Error {
    /// Error caused by a low level peripheral driver
    DriverError(&'static str),
    /// The storage medium couldn't be mounted after every attempt.
    MountFailure,
    /// The update directory is missing or can't be listed.
    DirectoryUnavailable,
    /// A candidate's path doesn't fit the path buffer.
    PathTooLong,
    StorageOpen,
    StorageRead,
    StorageSeek,
    /// A candidate couldn't be renamed out of the update scan.
    StorageRename,
    /// Candidate file size can't describe a nonce, a payload and a MAC.
    ImageSizeInvalid,
    /// The candidate ended before the expected data could be read.
    UnexpectedEndOfFile,
    /// Computed and stored MACs differ.
    SignatureMismatch,
    /// Candidate version doesn't strictly supersede the installed one.
    VersionNotNewer,
    /// Image descriptor doesn't describe an application.
    WrongType,
    /// Image descriptor length is out of the application region.
    WrongLength,
    CrcMismatch,
    /// Image doesn't fit in the application region.
    ImageTooBig,
    NoBootableImage,
}

/// Implemented by driver errors so they can be bubbled up with `?`.
pub trait Convertible {
    fn into(self) -> Error;
}

impl<T: Convertible> From<T> for Error {
    fn from(t: T) -> Self { Convertible::into(t) }
}

impl Error {
    /// Reports error via an abstract text sink.
    pub fn report<W: uWrite + ?Sized>(&self, writer: &mut W) -> Result<(), W::Error> {
        match self {
            Error::DriverError(text) => uwrite!(writer, "[Driver Error] -> {}", *text),
            Error::MountFailure => uwrite!(writer, "[Storage Error] -> Can't mount storage"),
            Error::DirectoryUnavailable => {
                uwrite!(writer, "[Storage Error] -> Update directory unavailable")
            }
            Error::PathTooLong => uwrite!(writer, "[Storage Error] -> Path too long"),
            Error::StorageOpen => uwrite!(writer, "[Storage Error] -> Can't open file"),
            Error::StorageRead => uwrite!(writer, "[Storage Error] -> Read failed"),
            Error::StorageSeek => uwrite!(writer, "[Storage Error] -> Can't seek"),
            Error::StorageRename => uwrite!(writer, "[Storage Error] -> Can't rename file"),
            Error::ImageSizeInvalid => uwrite!(writer, "[Image Error] -> Invalid file size"),
            Error::UnexpectedEndOfFile => {
                uwrite!(writer, "[Image Error] -> File ended unexpectedly")
            }
            Error::SignatureMismatch => uwrite!(writer, "[Image Error] -> Signatures differ"),
            Error::VersionNotNewer => uwrite!(writer, "[Image Error] -> Version is not newer"),
            Error::WrongType => uwrite!(writer, "[Image Error] -> Program type mismatch"),
            Error::WrongLength => uwrite!(writer, "[Image Error] -> Wrong length"),
            Error::CrcMismatch => uwrite!(writer, "[Image Error] -> Wrong CRC"),
            Error::ImageTooBig => uwrite!(writer, "[Image Error] -> Image too big"),
            Error::NoBootableImage => uwrite!(writer, "[Boot Error] -> No bootable image"),
        }
    }
}
