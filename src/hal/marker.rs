//! Memory preserved across a warm reset.
use crate::config::MARKER_SIZE;

/// Raw access to a region that isn't initialised at startup, so its contents
/// survive a warm reset (but not a power loss).
///
/// Meant to be wrapped by [`BootMarker`](crate::devices::boot_marker::BootMarker),
/// which is the only place that interprets its contents.
pub trait MarkerRegion {
    fn region(&mut self) -> &mut [u8; MARKER_SIZE];
}
