use super::*;
use crate::{
    config::{
        CANDIDATE_EXTENSION, MOUNT_ATTEMPTS, MOUNT_RETRY_DELAY_MS, PROCESSED_MARKER,
        UPDATE_DIRECTORY,
    },
    hal::storage::{FileName, Path},
};

impl<S, MCUF, L, P, T, M, H> Bootloader<S, MCUF, L, P, T, M, H>
where
    S: Storage,
    MCUF: Flash,
    L: Toggle,
    P: PowerMonitor,
    T: Now + Wait,
    M: MarkerRegion,
    H: Handoff,
{
    /// Mounts the storage medium, giving it a few chances to power up.
    pub(super) fn mount(&mut self) -> Result<(), Error> {
        for attempt in 1..=MOUNT_ATTEMPTS {
            if self.storage.mount().is_ok() {
                return Ok(());
            }
            warn!("Mount attempt {} failed", attempt);
            if attempt < MOUNT_ATTEMPTS {
                self.clock.wait(Milliseconds(MOUNT_RETRY_DELAY_MS));
            }
        }
        Err(Error::MountFailure)
    }

    /// Walks the update directory, trying every candidate in listing order
    /// until one is installed and confirmed. Returns its version.
    pub(super) fn search(&mut self) -> Option<Version> {
        self.state = State::Searching;
        let mut directory = match self.storage.open_directory(UPDATE_DIRECTORY) {
            Ok(directory) => directory,
            Err(_) => {
                info!("No update directory");
                return None;
            }
        };

        loop {
            let name = match self.storage.next_entry(&mut directory) {
                Ok(Some(name)) => name,
                Ok(None) => return None,
                Err(_) => {
                    warn!("Failed to list the update directory");
                    return None;
                }
            };
            if !is_candidate(&name) {
                continue;
            }

            self.state = State::CandidateFound;
            let now = self.clock.now();
            self.log.start(&mut self.storage, now);
            match self.try_candidate(&name) {
                Ok(version) => return Some(version),
                Err(e) => warn!("Candidate discarded: {:?}", e),
            }
        }
    }
}

/// Whether a directory entry names an update image. The extension is
/// everything past the rightmost dot, and must match exactly.
pub(super) fn is_candidate(name: &str) -> bool {
    name.rsplit_once('.').map_or(false, |(_, extension)| extension == CANDIDATE_EXTENSION)
}

pub(super) fn candidate_path(name: &FileName) -> Result<Path, Error> {
    let mut path = Path::new();
    path.push_str(UPDATE_DIRECTORY).map_err(|_| Error::PathTooLong)?;
    path.push('/').map_err(|_| Error::PathTooLong)?;
    path.push_str(name).map_err(|_| Error::PathTooLong)?;
    Ok(path)
}

/// Path a candidate is renamed to once opened, so no later scan picks it up.
pub(super) fn processed_path(path: &Path) -> Path {
    let mut processed = path.clone();
    if processed.pop().is_some() {
        // Popping guarantees room for one more character.
        let _ = processed.push(PROCESSED_MARKER);
    }
    processed
}
