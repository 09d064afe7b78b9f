//! Actuator and sensor drivers, hardware initialisation, and peripheral helpers.

pub mod battery;
pub mod hw_init;
pub mod led;
pub mod petals;
pub mod touch;
pub mod watchdog;
