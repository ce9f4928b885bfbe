use std::collections::HashMap;

use crate::quantum::EprPair;

/// Bookkeeping for a swap this node already performed locally, kept around
/// in case a same-rank neighbor's SWAP_UPDATE races it (§4.2 step 5,
/// "parallel-swap bookkeeping"). Keyed by the name of the elementary/merged
/// EPR this node swapped away.
#[derive(Debug, Clone)]
pub struct ParallelSwapRecord {
    /// The EPR this node shared with the neighbor that raced it.
    pub shared_epr: EprPair,
    /// The other elementary/merged EPR this node combined it with.
    pub other_epr: EprPair,
    /// The result of this node's local swap (`None` if the swap failed).
    pub new_epr: Option<EprPair>,
}

/// Per-node proactive-forwarder state (§4.2).
///
/// Like `LinkLayerState`, this holds data only; `Simulator::pf_*` methods
/// implement the swap algorithm and SWAP_UPDATE reconciliation, since both
/// need the node's FIB, memories and the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ForwarderState {
    pub ps: f64,
    pub e2e_count: u64,
    pub parallel_swappings: HashMap<String, ParallelSwapRecord>,
    /// Entangled-qubit notifications queued during a SYNC INTERNAL phase
    /// wait, flushed at the next EXTERNAL_START.
    pub waiting_qubits: Vec<(String, usize)>,
}

impl ForwarderState {
    pub fn new(ps: f64) -> Self {
        ForwarderState {
            ps,
            ..Default::default()
        }
    }
}
