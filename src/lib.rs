//! Discrete-event simulator for entanglement-distribution networks.
//!
//! The event loop (`simulation`) is domain-agnostic; everything quantum
//! lives in `quantum` (EPR pairs, fidelity/swap math) and `memory` (slot
//! FSM). `network` holds the static topology (nodes, channels, FIB) and
//! `protocols` the link-layer / forwarder / controller logic that reacts
//! to events. `simulator` wires all of it together behind one
//! `Simulator` driven by a single `EventScheduler` and `SimRng`.

pub mod error;
pub mod memory;
pub mod network;
pub mod protocols;
pub mod quantum;
pub mod rng;
pub mod simulation;
pub mod simulator;

pub use error::{SimError, SimResult};
pub use simulator::Simulator;
