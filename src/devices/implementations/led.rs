use crate::hal::{gpio::OutputPin, led::Toggle};

/// Solid (non-blinking) monochrome LED
///
/// # Example
/// ```
/// # use cardboot_lib::devices::implementations::led::*;
/// # use cardboot_lib::hal::{doubles::gpio::MockPin, led::Toggle};
/// let mut led = MonochromeLed::new(MockPin::default(), Logic::Direct);
///
/// led.toggle();
/// assert!(led.is_on());
/// ```
pub struct MonochromeLed<Pin: OutputPin> {
    pin: Pin,
    is_on: bool,
    logic: Logic,
}

#[derive(Copy, Clone)]
pub enum Logic {
    /// Logical high equals "on"
    Direct,
    /// Logical high equals "off"
    Inverted,
}

// Extension trait to ensure LED pins are correctly
// operated based on the led's direct or inverted logic
trait LedPin: OutputPin {
    fn off(&mut self, logic: Logic) {
        if let Logic::Direct = logic {
            self.set_low();
        } else {
            self.set_high();
        }
    }
    fn on(&mut self, logic: Logic) {
        if let Logic::Direct = logic {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

// Blanket implementation of LedPin for all output pins
impl<Pin: OutputPin> LedPin for Pin {}

impl<Pin: OutputPin> MonochromeLed<Pin> {
    pub fn new(mut pin: Pin, logic: Logic) -> Self {
        pin.off(logic);
        Self { pin, is_on: false, logic }
    }

    pub fn is_on(&self) -> bool { self.is_on }
}

impl<Pin: OutputPin> Toggle for MonochromeLed<Pin> {
    fn on(&mut self) {
        if !self.is_on {
            self.pin.on(self.logic);
        }
        self.is_on = true;
    }

    fn off(&mut self) {
        if self.is_on {
            self.pin.off(self.logic);
        }
        self.is_on = false;
    }

    fn toggle(&mut self) {
        if self.is_on {
            self.off();
        } else {
            self.on();
        }
    }
}

/// Number of LEDs on the board's front panel.
pub const INDICATOR_LEDS: usize = 3;

/// The board's row of status LEDs. Work in progress is shown as a single
/// lit LED walking along the row, failures as the whole row flashing.
pub struct Indicator<L: Toggle> {
    leds: [L; INDICATOR_LEDS],
    step: usize,
}

impl<L: Toggle> Indicator<L> {
    /// Takes over the LEDs, lighting all of them.
    pub fn new(leds: [L; INDICATOR_LEDS]) -> Self {
        let mut indicator = Self { leds, step: 0 };
        indicator.all_on();
        indicator
    }

    /// Moves the walking light one position along.
    pub fn advance(&mut self) {
        for (index, led) in self.leds.iter_mut().enumerate() {
            if index == self.step {
                led.on();
            } else {
                led.off();
            }
        }
        self.step = (self.step + 1) % INDICATOR_LEDS;
    }

    pub fn all_on(&mut self) { self.leds.iter_mut().for_each(Toggle::on); }

    pub fn all_off(&mut self) { self.leds.iter_mut().for_each(Toggle::off); }

    pub fn leds(&self) -> &[L; INDICATOR_LEDS] { &self.leds }
}
