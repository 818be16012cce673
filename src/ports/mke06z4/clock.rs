//! SysTick time base.
//!
//! SysTick interrupts once per millisecond and the handler keeps the
//! uptime. Waiting busy-loops on the core instead, so it doesn't depend
//! on the interrupt being serviced.
use crate::hal::time::{Milliseconds, Now, Wait};
use core::cell::Cell;
use cortex_m::{
    interrupt::{self, Mutex},
    peripheral::{syst::SystClkSource, SYST},
};
use cortex_m_rt::exception;

/// Core clock after reset, running from the internal reference.
const CORE_CLOCK_HZ: u32 = 20_000_000;
const CYCLES_PER_MS: u32 = CORE_CLOCK_HZ / 1000;

static UPTIME: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

pub struct SysTickClock {
    _systick: SYST,
}

impl SysTickClock {
    /// Starts counting milliseconds from zero.
    pub fn start(mut systick: SYST) -> Self {
        interrupt::free(|cs| UPTIME.borrow(cs).set(0));
        systick.set_clock_source(SystClkSource::Core);
        systick.set_reload(CYCLES_PER_MS - 1);
        systick.clear_current();
        systick.enable_interrupt();
        systick.enable_counter();
        Self { _systick: systick }
    }
}

impl Now for SysTickClock {
    fn now(&self) -> Milliseconds { Milliseconds(interrupt::free(|cs| UPTIME.borrow(cs).get())) }
}

impl Wait for SysTickClock {
    fn wait(&mut self, period: Milliseconds) {
        for _ in 0..period.0 {
            cortex_m::asm::delay(CYCLES_PER_MS);
        }
    }
}

#[exception]
fn SysTick() {
    interrupt::free(|cs| {
        let uptime = UPTIME.borrow(cs);
        uptime.set(uptime.get().wrapping_add(1));
    });
}
