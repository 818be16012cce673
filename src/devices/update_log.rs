//! Human readable account of an update attempt, kept on the storage medium
//! next to the candidate images.
//!
//! The log is only created once a candidate shows up, so a plain boot leaves
//! the card untouched. Entries read `<timestamp> <text>\r\n`, with the
//! timestamp in milliseconds since boot. Write failures are ignored: the log
//! is a diagnostic aid and must never stand in the way of an update.
use crate::{
    config::UPDATE_LOG_PATH,
    hal::{
        storage::{File, Storage},
        time::Milliseconds,
    },
};
use core::convert::Infallible;
use ufmt::{uWrite, uwrite};

/// Minimum digits in an entry timestamp.
const TIMESTAMP_DIGITS: usize = 5;

pub struct UpdateLog<F: File> {
    file: Option<F>,
    started: bool,
}

/// A single log line being written. The line is terminated when dropped.
pub struct Entry<'a, F: File> {
    file: &'a mut F,
}

impl<F: File> UpdateLog<F> {
    pub fn new() -> Self { Self { file: None, started: false } }

    /// Creates the log file, truncating any previous one. Only the first
    /// call has any effect.
    pub fn start<S: Storage<File = F>>(&mut self, storage: &mut S, now: Milliseconds) {
        if self.started {
            return;
        }
        self.started = true;
        self.file = storage.create(UPDATE_LOG_PATH).ok();
        if let Some(mut entry) = self.entry(now) {
            let _ = uwrite!(entry, "Log started {}", env!("CARGO_PKG_VERSION"));
        }
    }

    pub fn is_started(&self) -> bool { self.started }

    /// Opens a new line, or nothing if the log isn't running.
    pub fn entry(&mut self, now: Milliseconds) -> Option<Entry<'_, F>> {
        let file = self.file.as_mut()?;
        write_timestamp(file, now);
        Some(Entry { file })
    }

    /// Writes a line of plain text.
    pub fn note(&mut self, now: Milliseconds, text: &str) {
        if let Some(mut entry) = self.entry(now) {
            let _ = entry.write_str(text);
        }
    }

    /// Writes the closing line and releases the file.
    pub fn close<S: Storage<File = F>>(&mut self, storage: &mut S, now: Milliseconds) {
        self.note(now, "End of log");
        if let Some(file) = self.file.take() {
            let _ = storage.close(file);
        }
    }
}

impl<F: File> Default for UpdateLog<F> {
    fn default() -> Self { Self::new() }
}

impl<'a, F: File> uWrite for Entry<'a, F> {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        let _ = self.file.write(s.as_bytes());
        Ok(())
    }
}

impl<'a, F: File> Drop for Entry<'a, F> {
    fn drop(&mut self) { let _ = self.file.write(b"\r\n"); }
}

fn write_timestamp<F: File>(file: &mut F, now: Milliseconds) {
    let mut digits = [b'0'; 10];
    let mut value = now.0;
    let mut start = digits.len();
    loop {
        start -= 1;
        digits[start] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    let start = start.min(digits.len() - TIMESTAMP_DIGITS);
    let _ = file.write(&digits[start..]);
    let _ = file.write(b" ");
}
