//! Application core: pure domain logic, zero I/O.
//!
//! This module wires the gesture automaton and the remote link together
//! behind a single dispatcher.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
