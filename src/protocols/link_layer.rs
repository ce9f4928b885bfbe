use std::collections::{HashMap, HashSet};

use crate::network::NodeId;

/// Per-node link-layer state (§4.1).
///
/// Holds only data; the event-driven behavior (`handle_active_channel`,
/// `generate_entanglement`, `handle_distribution`, `handle_signaling`, ...)
/// is implemented as `Simulator::ll_*` methods, since every handler needs
/// the scheduler and the node's memories/channels alongside this state.
#[derive(Debug, Clone)]
pub struct LinkLayerState {
    pub attempt_rate: f64,
    pub init_fidelity: f64,
    /// qchannel name -> neighbor, for links this node currently attempts
    /// generation on.
    pub active_channels: HashMap<String, NodeId>,
    /// qchannels queued to activate at the next EXTERNAL_START (LSYNC).
    pub waiting_channels: Vec<(String, NodeId)>,
    /// (qchannel, address) pairs queued to retry at the next
    /// EXTERNAL_START (LSYNC `on_qubit_released`).
    pub waiting_qubits: Vec<(String, usize)>,
    /// qchannels on which this node is the initiator (spawns attempts)
    /// rather than the herald/receiver.
    pub initiator_channels: HashSet<String>,
    /// Count of `QubitDecohered` events that actually expired a slot
    /// (monitored event, §6 "monitored events" -- observer-only, no
    /// protocol decision reads this).
    pub decohered_count: u64,
}

impl Default for LinkLayerState {
    fn default() -> Self {
        LinkLayerState {
            attempt_rate: 1.0,
            init_fidelity: 1.0,
            active_channels: HashMap::new(),
            waiting_channels: Vec::new(),
            waiting_qubits: Vec::new(),
            initiator_channels: HashSet::new(),
            decohered_count: 0,
        }
    }
}

impl LinkLayerState {
    pub fn is_active(&self, qchannel: &str) -> bool {
        self.active_channels.contains_key(qchannel)
    }

    pub fn is_initiator(&self, qchannel: &str) -> bool {
        self.initiator_channels.contains(qchannel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_has_no_active_channels() {
        let state = LinkLayerState::default();
        assert!(!state.is_active("q01"));
        assert!(!state.is_initiator("q01"));
    }

    #[test]
    fn activating_a_channel_marks_it_active() {
        let mut state = LinkLayerState::default();
        state.active_channels.insert("q01".into(), "B".into());
        assert!(state.is_active("q01"));
    }
}
