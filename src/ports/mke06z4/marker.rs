//! RAM region surviving a warm reset.
use crate::{config::MARKER_SIZE, hal::marker::MarkerRegion};
use core::mem::MaybeUninit;

// Placed in a section the startup code neither zeroes nor initialises.
#[link_section = ".uninit.cardboot_marker"]
static mut MARKER: MaybeUninit<[u8; MARKER_SIZE]> = MaybeUninit::uninit();

pub struct UninitMarker {
    _private: (),
}

impl UninitMarker {
    /// # Safety
    ///
    /// Must only be called once, and the application must not touch the
    /// region until the bootloader has handed over control.
    pub unsafe fn new() -> Self { Self { _private: () } }
}

impl MarkerRegion for UninitMarker {
    fn region(&mut self) -> &mut [u8; MARKER_SIZE] {
        // NOTE(Safety): Exclusive access is guaranteed by `&mut self` and by
        // the single construction contract. Any bit pattern is a valid `[u8; N]`,
        // so reading memory left over from before the reset is sound.
        unsafe { (*core::ptr::addr_of_mut!(MARKER)).assume_init_mut() }
    }
}
