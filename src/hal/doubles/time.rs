use crate::hal::time::{Milliseconds, Now, Wait};
use std::vec::Vec;

/// Clock that only moves when waited upon.
#[derive(Debug, Default)]
pub struct FakeClock {
    pub elapsed: Milliseconds,
    pub waits: Vec<Milliseconds>,
}

impl Now for FakeClock {
    fn now(&self) -> Milliseconds { self.elapsed }
}

impl Wait for FakeClock {
    fn wait(&mut self, period: Milliseconds) {
        self.elapsed = self.elapsed + period;
        self.waits.push(period);
    }
}
