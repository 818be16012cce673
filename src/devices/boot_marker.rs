//! Short status tags handed over to the next boot stage through memory
//! that survives a warm reset.
//!
//! A tag is valid when the region starts with `'!'`. It is terminated by
//! the first NUL, and the region's last byte is always a NUL so a tag can
//! never run past the region.
use crate::{config::MARKER_SIZE, hal::marker::MarkerRegion};
use heapless::String;

/// Written once an update has been installed and confirmed.
pub const UPDATE_SUCCEEDED: &str = "!upgd_ok";

const TAG_PREFIX: u8 = b'!';

pub type Tag = String<MARKER_SIZE>;

pub struct BootMarker<M: MarkerRegion> {
    region: M,
}

impl<M: MarkerRegion> BootMarker<M> {
    pub fn new(region: M) -> Self { Self { region } }

    /// Leaves a tag for the next boot stage, truncated to fit the region.
    pub fn set(&mut self, tag: &str) {
        let region = self.region.region();
        region.fill(0);
        let length = tag.len().min(MARKER_SIZE - 1);
        region[..length].copy_from_slice(&tag.as_bytes()[..length]);
    }

    /// Returns the pending tag, if any, and clears the region so it's
    /// only ever observed once.
    pub fn take(&mut self) -> Option<Tag> {
        let region = self.region.region();
        region[MARKER_SIZE - 1] = 0;
        let tag = if region[0] == TAG_PREFIX {
            let end = region.iter().position(|b| *b == 0).unwrap_or(MARKER_SIZE - 1);
            core::str::from_utf8(&region[..end]).ok().and_then(|text| Tag::try_from(text).ok())
        } else {
            None
        };
        region.fill(0);
        tag
    }
}
