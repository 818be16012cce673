//! Supply voltage monitoring.

/// Board supply supervision. A data logger powered from a vehicle
/// must stop touching storage as soon as the supply starts failing.
pub trait PowerMonitor {
    /// Samples the supply, returning whether it's above the failure threshold.
    fn is_good(&mut self) -> bool;

    /// Shuts down every peripheral and puts the MCU in its lowest power mode.
    fn shutdown(&mut self) -> !;
}
