//! Bootloader assembly for KE06 boards.
use super::{clock::SysTickClock, flash::McuFlash, handoff::Jump, marker::UninitMarker};
use crate::{
    devices::{bootloader::Bootloader, image::Staging, implementations::led::INDICATOR_LEDS},
    hal::{led::Toggle, power::PowerMonitor, storage::Storage},
};

pub type Mke06z4Bootloader<S, L, P> =
    Bootloader<S, McuFlash, L, P, SysTickClock, UninitMarker, Jump>;

impl<S, L, P> Bootloader<S, McuFlash, L, P, SysTickClock, UninitMarker, Jump>
where
    S: Storage,
    L: Toggle,
    P: PowerMonitor,
{
    /// Wires the board supplied drivers to the MCU ones. Returns `None`
    /// if the core peripherals were already taken.
    pub fn for_mke06z4(storage: S, leds: [L; INDICATOR_LEDS], power: P) -> Option<Self> {
        let peripherals = cortex_m::Peripherals::take()?;
        let staging = cortex_m::singleton!(: Staging = Staging::new())?;
        // NOTE(Safety): Taking the core peripherals succeeded, so this is
        // the only time the flash and marker drivers are created.
        let (mcu_flash, marker) = unsafe { (McuFlash::new(), UninitMarker::new()) };
        let clock = SysTickClock::start(peripherals.SYST);
        Some(Bootloader::new(storage, mcu_flash, leds, power, clock, marker, Jump::new(), staging))
    }
}
