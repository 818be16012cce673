//! Target specific drivers. A port supplies everything the generic
//! bootloader needs that depends on the MCU itself: the flash
//! controller, the memory surviving a warm reset, the jump into the
//! application and a time base. The storage medium, the LED pins and
//! the supply monitor depend on the board and are supplied by the
//! integrator through the `hal` traits.

// The flash driver only depends on its bus, so it's also built for host tests.
#[cfg(any(feature = "mke06z4", test))]
pub mod mke06z4;

#[cfg(target_arch = "arm")]
use defmt_rtt as _;
