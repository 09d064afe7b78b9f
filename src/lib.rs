//! Floower firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod color;
pub mod config;
pub mod events;
pub mod fsm;
pub mod picker;
pub mod remote;

pub mod pins;

// Hardware-facing modules; the ESP-IDF implementations are guarded by
// cfg attributes inside, the rest are host simulations.
pub mod adapters;
pub mod drivers;
