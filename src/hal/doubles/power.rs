use crate::hal::power::PowerMonitor;

/// Supply that stays good for a fixed number of samples, then fails.
/// Shutting down panics, so tests can observe the otherwise endless failure loop ending.
#[derive(Debug, Default)]
pub struct FakePower {
    pub good_samples: u32,
    pub samples: u32,
}

impl FakePower {
    pub fn failing_after(good_samples: u32) -> Self { Self { good_samples, samples: 0 } }
}

impl PowerMonitor for FakePower {
    fn is_good(&mut self) -> bool {
        self.samples += 1;
        self.samples <= self.good_samples
    }

    fn shutdown(&mut self) -> ! { panic!("Shutdown after {} samples", self.samples) }
}
