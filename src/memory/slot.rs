use crate::quantum::EprPair;
use crate::simulation::SimTime;

/// Slot lifecycle states (§3 "Memory slot").
///
/// `Purif` is reachable but today passes straight through to `Eligible`
/// (Non-goal iii) -- the state exists so a future purification cycle has
/// somewhere to suspend without changing the FSM shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Free,
    Reserved,
    Occupied,
    Entangled,
    Purif,
    Eligible,
    Swapping,
    Consumed,
    Decohered,
    Released,
}

/// A single memory slot: `(state, path_id?, key?, qchannel?, epr?,
/// decoh_deadline?)` as a record, per §3.
#[derive(Debug, Clone)]
pub struct MemorySlot {
    pub addr: usize,
    pub state: SlotState,
    pub path_id: Option<i64>,
    pub key: Option<String>,
    pub qchannel: Option<String>,
    pub epr: Option<EprPair>,
    pub decoh_deadline: Option<SimTime>,
}

impl MemorySlot {
    pub fn free(addr: usize) -> Self {
        MemorySlot {
            addr,
            state: SlotState::Free,
            path_id: None,
            key: None,
            qchannel: None,
            epr: None,
            decoh_deadline: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == SlotState::Free
    }

    /// Reset to FREE, dropping all slot-local data (invariant: at most one
    /// EPR per slot, enforced by always clearing on release).
    pub fn reset(&mut self) {
        self.state = SlotState::Free;
        self.path_id = None;
        self.key = None;
        self.qchannel = None;
        self.epr = None;
        self.decoh_deadline = None;
    }
}
