use super::{
    scan::{candidate_path, processed_path},
    *,
};
use crate::{
    config::{AUTHENTICATION_KEY, ENCRYPTION_IV, ENCRYPTION_KEY},
    hal::storage::FileName,
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
    /// Opens a candidate and marks it as processed before anything else
    /// happens to it, so a candidate that makes the board misbehave is
    /// only ever tried once.
    pub(super) fn try_candidate(&mut self, name: &FileName) -> Result<Version, Error> {
        let now = self.clock.now();
        if let Some(mut entry) = self.log.entry(now) {
            let _ = uwrite!(entry, "Checking file {}", name.as_str());
        }

        let path = candidate_path(name)?;
        let mut file = self.storage.open(&path).map_err(|_| Error::StorageOpen)?;

        let processed = processed_path(&path);
        if let Err(e) = self.mark_processed(&path, &processed) {
            self.note_error("Failed to rename file", e);
            let _ = self.storage.close(file);
            return Err(e);
        }
        let now = self.clock.now();
        if let Some(mut entry) = self.log.entry(now) {
            let _ = uwrite!(entry, "File renamed to {}", processed.as_str());
        }

        let result = self.update_from(&mut file);
        let _ = self.storage.close(file);
        result
    }

    /// Renames a candidate out of the update scan, replacing whatever an
    /// earlier candidate of the same name left behind. A candidate that
    /// can't be renamed is never processed, as it would be found again on
    /// every boot.
    fn mark_processed(&mut self, path: &str, processed: &str) -> Result<(), Error> {
        if self.storage.rename(path, processed).is_ok() {
            return Ok(());
        }
        self.storage.remove(processed).map_err(|_| Error::StorageRename)?;
        self.storage.rename(path, processed).map_err(|_| Error::StorageRename)
    }

    /// Authenticates, installs and confirms a single candidate.
    fn update_from(&mut self, file: &mut S::File) -> Result<Version, Error> {
        self.state = State::Verifying;
        let indicator = &mut self.indicator;
        let verification =
            image::verify(file, AesCmac::new(&AUTHENTICATION_KEY), || indicator.advance());
        if let Err(e) = verification {
            self.note_error("File verification failure", e);
            return Err(e);
        }
        self.note("File verified OK");

        self.state = State::Installing;
        let force_install = match image::confirm_installed(&mut self.mcu_flash) {
            Ok(current) => {
                self.note_version("Current version", current);
                false
            }
            Err(e) => {
                self.note_error("No valid internal firmware", e);
                true
            }
        };

        let decryptor = AesCbcDecryptor::new(&ENCRYPTION_KEY, &ENCRYPTION_IV);
        let indicator = &mut self.indicator;
        let installation = image::install(
            file,
            decryptor,
            &mut self.mcu_flash,
            self.staging,
            force_install,
            || indicator.advance(),
        );
        match installation {
            Ok(version) => {
                let now = self.clock.now();
                if let Some(mut entry) = self.log.entry(now) {
                    let _ = uwrite!(entry, "New firmware {} installed", version);
                }
            }
            Err(e) => {
                self.note_error("New firmware installation failure", e);
                return Err(e);
            }
        }

        self.state = State::ConfirmingInstall;
        match image::confirm_installed(&mut self.mcu_flash) {
            Ok(version) => {
                self.note("New firmware okay, starting...");
                self.marker.set(UPDATE_SUCCEEDED);
                Ok(version)
            }
            Err(e) => {
                self.note_error("New firmware verification failure", e);
                Err(e)
            }
        }
    }
}
