//! Generic Bootloader.
//!
//! This module contains all bootloader functionality, with
//! the exception of how to construct its drivers. Drivers are
//! provided by the `ports` module (MCU specifics) and by the
//! integrator (storage medium, power supervision).
//!
//! On every boot the bootloader walks the update directory on the
//! storage medium. Each candidate is marked as processed, then
//! authenticated, installed and confirmed. The first candidate that makes
//! it through is booted. Without one, the resident application is
//! confirmed and booted, and if that fails too the board flashes its
//! LEDs until the supply fails.
use super::{
    boot_marker::{BootMarker, UPDATE_SUCCEEDED},
    crypto::{AesCbcDecryptor, AesCmac},
    image::{self, Staging, Version},
    implementations::led::{Indicator, INDICATOR_LEDS},
    traits::Flash,
    update_log::UpdateLog,
};
use crate::{
    config::APPLICATION_BASE,
    error::Error,
    hal::{
        flash::Address,
        handoff::Handoff,
        led::Toggle,
        marker::MarkerRegion,
        power::PowerMonitor,
        storage::Storage,
        time::{Milliseconds, Now, Wait},
    },
    log::{error, info, warn},
};
use ufmt::uwrite;

mod failure;
mod scan;
mod update;

/// Failure indicator period when the storage medium can't be mounted.
pub const MOUNT_FAILURE_PERIOD: Milliseconds = Milliseconds(500);

/// Failure indicator period when no bootable image is left.
pub const NO_IMAGE_PERIOD: Milliseconds = Milliseconds(100);

/// Time given to the storage medium to commit the log before the
/// application takes over (and possibly power cycles it).
const LOG_SETTLE_TIME: Milliseconds = Milliseconds(300);

/// Progress of a boot attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum State {
    Mounting,
    Searching,
    CandidateFound,
    Verifying,
    Installing,
    ConfirmingInstall,
    ConfirmingExisting,
    Booting,
    FailureIndicator,
}

pub struct Bootloader<S, MCUF, L, P, T, M, H>
where
    S: Storage,
    MCUF: Flash,
    L: Toggle,
    P: PowerMonitor,
    T: Now + Wait,
    M: MarkerRegion,
    H: Handoff,
{
    pub(crate) storage: S,
    pub(crate) mcu_flash: MCUF,
    pub(crate) indicator: Indicator<L>,
    pub(crate) power: P,
    pub(crate) clock: T,
    pub(crate) marker: BootMarker<M>,
    pub(crate) handoff: H,
    pub(crate) log: UpdateLog<S::File>,
    pub(crate) staging: &'static mut Staging,
    pub(crate) state: State,
}

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
    /// The staging buffers are too large to move around on a small stack,
    /// so they are taken from static memory (e.g. through
    /// `cortex_m::singleton!(: Staging = Staging::new())`).
    pub fn new(
        storage: S,
        mcu_flash: MCUF,
        leds: [L; INDICATOR_LEDS],
        power: P,
        clock: T,
        marker: M,
        handoff: H,
        staging: &'static mut Staging,
    ) -> Self {
        Self {
            storage,
            mcu_flash,
            indicator: Indicator::new(leds),
            power,
            clock,
            marker: BootMarker::new(marker),
            handoff,
            log: UpdateLog::new(),
            staging,
            state: State::Mounting,
        }
    }

    /// Main bootloader routine. Never returns: it either boots an
    /// application or stays in the failure indicator.
    pub fn run(mut self) -> ! {
        info!("-- cardboot initialised --");
        match self.prepare() {
            Ok(version) => self.boot(version),
            Err(Error::MountFailure) => self.fail(MOUNT_FAILURE_PERIOD),
            Err(_) => self.fail(NO_IMAGE_PERIOD),
        }
    }

    /// Runs every step short of transferring control, returning the
    /// version of the application that is safe to boot.
    pub fn prepare(&mut self) -> Result<Version, Error> {
        self.state = State::Mounting;
        self.mount()?;

        let updated = self.search();
        if self.log.is_started() {
            let now = self.clock.now();
            self.log.close(&mut self.storage, now);
            self.clock.wait(LOG_SETTLE_TIME);
        }
        if let Some(version) = updated {
            return Ok(version);
        }

        self.state = State::ConfirmingExisting;
        match image::confirm_installed(&mut self.mcu_flash) {
            Ok(version) => {
                info!("Current version {}.{}", version.major, version.minor);
                Ok(version)
            }
            Err(e) => {
                error!("No bootable image: {:?}", e);
                Err(Error::NoBootableImage)
            }
        }
    }

    /// Hands control over to the confirmed application.
    fn boot(&mut self, version: Version) -> ! {
        self.state = State::Booting;
        warn!("Jumping to application {}.{}", version.major, version.minor);
        self.handoff.handoff(Address(APPLICATION_BASE))
    }

    fn note(&mut self, text: &str) {
        let now = self.clock.now();
        self.log.note(now, text);
    }

    fn note_error(&mut self, context: &str, error: Error) {
        let now = self.clock.now();
        if let Some(mut entry) = self.log.entry(now) {
            let _ = uwrite!(entry, "{}: ", context);
            let _ = error.report(&mut entry);
        }
    }

    fn note_version(&mut self, context: &str, version: Version) {
        let now = self.clock.now();
        if let Some(mut entry) = self.log.entry(now) {
            let _ = uwrite!(entry, "{} {}", context, version);
        }
    }
}
