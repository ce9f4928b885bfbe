use thiserror::Error;

/// Fatal errors for the simulation core.
///
/// Per the error-handling design: protocol anomalies, resource exhaustion
/// and timing violations are *not* represented here — they are logged and
/// handled locally (see `protocols::link_layer` / `protocols::forwarder`).
/// Only configuration mistakes and scheduler/FIB invariant violations stop
/// the simulator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Topology/controller install referenced an unknown node, channel or
    /// path. Surfaced at install time; the simulator does not start.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A scheduler or FIB invariant was violated (e.g. an event fired
    /// before it was scheduled, or a FIB entry has a malformed vector).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type SimResult<T> = Result<T, SimError>;
