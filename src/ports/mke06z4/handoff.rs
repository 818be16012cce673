//! Jump into the installed application.
use crate::hal::{flash::Address, handoff::Handoff};
use cortex_m::peripheral::{SCB, SYST};

/// Leaves the core the way the application expects to find it after a
/// reset: interrupts masked, SysTick stopped, vector table relocated.
pub struct Jump {
    _private: (),
}

impl Jump {
    pub fn new() -> Self { Self { _private: () } }
}

impl Default for Jump {
    fn default() -> Self { Self::new() }
}

impl Handoff for Jump {
    fn handoff(&mut self, image: Address) -> ! {
        cortex_m::interrupt::disable();
        // NOTE(Safety): The SysTick clock is owned by the bootloader being
        // torn down, and interrupts are already masked. The image was
        // verified before getting here, and interrupts stay disabled until
        // the application enables them again.
        unsafe {
            (*SYST::PTR).csr.write(0);
            (*SYST::PTR).cvr.write(0);
            (*SCB::PTR).vtor.write(image.0);
            cortex_m::asm::bootload(image.0 as *const u32)
        }
    }
}
