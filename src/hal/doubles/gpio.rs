use crate::hal::gpio::OutputPin;

#[derive(Clone, Copy, Debug, Default)]
pub struct MockPin {
    pub state: bool,
}

impl MockPin {
    pub fn is_high(&self) -> bool { self.state }
    pub fn is_low(&self) -> bool { !self.state }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) { self.state = false; }

    fn set_high(&mut self) { self.state = true; }
}
