use crate::hal::{flash::Address, handoff::Handoff};

/// Panics in place of jumping, carrying the target address in the message.
#[derive(Debug, Default)]
pub struct FakeHandoff;

impl Handoff for FakeHandoff {
    fn handoff(&mut self, image: Address) -> ! { panic!("Handoff to {:#x}", image.0) }
}
