use crate::{config::MARKER_SIZE, hal::marker::MarkerRegion};

/// Region holding whatever was left in RAM, like the real uninitialised section.
pub struct FakeMarker(pub [u8; MARKER_SIZE]);

impl FakeMarker {
    pub fn garbage() -> Self { Self([0xA5; MARKER_SIZE]) }
}

impl MarkerRegion for FakeMarker {
    fn region(&mut self) -> &mut [u8; MARKER_SIZE] { &mut self.0 }
}
