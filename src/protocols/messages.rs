use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::network::NodeId;

/// Multiplexing scheme carried in a path-install message (§6 `mux:"B"|"S"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MuxScheme {
    /// Buffer-space / blocking: `m_v[i]` qubits pre-allocated per hop.
    Blocking,
    /// Statistical multiplexing: slots shared across paths, no per-path
    /// reservation. Not implemented in this core (§9); accepted and
    /// logged, not acted on.
    Statistical,
}

/// The routing + purification + mux instructions a controller installs at
/// one node for one path (§6 "Controller -> node message").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathInstructions {
    pub route: Vec<NodeId>,
    pub swap: Vec<i64>,
    pub purif: HashMap<String, u32>,
    pub mux: MuxScheme,
    pub m_v: Option<Vec<usize>>,
}

/// A classical packet exchanged between nodes (§6): LL heralding acks,
/// PF's SWAP_UPDATE, and the controller's path install.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassicMessage {
    /// LL herald ack: heralding completed for `epr_id` on `path_id`.
    EprSucceeded { path_id: Option<i64>, epr_id: String },
    /// LL herald nack: heralding failed; the initiator retries.
    EprFailed { path_id: Option<i64>, epr_id: String },
    /// PF's swap notification (§4.2 step 4).
    SwapUpdate {
        path_id: i64,
        swapping_node: NodeId,
        partner: NodeId,
        epr: String,
        new_epr: Option<crate::quantum::EprPair>,
        destination: NodeId,
        fwd: bool,
    },
    /// Controller installing a path at a node.
    PathInstall {
        path_id: i64,
        request_id: i64,
        instructions: PathInstructions,
    },
}
