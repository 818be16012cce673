use super::*;

impl<S, MCUF, L, P, T, M, H> Bootloader<S, MCUF, L, P, T, M, H>
where
    S: Storage,
    MCUF: Flash,
    L: Toggle,
    P: PowerMonitor,
    T: Now + Wait,
    M: MarkerRegion,
    H: Handoff,
{
    /// Flashes every LED with the given half period for as long as the board
    /// is powered. Nothing is ever booted from here. Once the supply starts
    /// failing the board is shut down in an orderly fashion, so storage isn't
    /// left mid-write when the voltage collapses.
    pub(super) fn fail(&mut self, period: Milliseconds) -> ! {
        self.state = State::FailureIndicator;
        error!("Entering failure indicator ({} ms)", period.0);
        loop {
            self.indicator.all_on();
            self.clock.wait(period);
            self.indicator.all_off();
            self.clock.wait(period);
            if !self.power.is_good() {
                self.power.shutdown();
            }
        }
    }
}
