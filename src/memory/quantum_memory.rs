use crate::memory::slot::{MemorySlot, SlotState};
use crate::quantum::EprPair;
use crate::simulation::SimTime;

/// Slotted quantum memory (§4.3, §3 "Memory slot").
///
/// An arena of fixed-capacity slots keyed by stable address -- per the
/// design notes, this avoids any cyclic/shared ownership between the two
/// nodes that logically hold opposite ends of the same EPR pair: each side
/// keeps its own slot, and `update()` rewrites a local copy when a
/// SWAP_UPDATE supersedes it.
#[derive(Debug, Clone)]
pub struct QuantumMemory {
    pub name: String,
    pub decoherence_rate: f64,
    slots: Vec<MemorySlot>,
}

impl QuantumMemory {
    pub fn new(name: impl Into<String>, capacity: usize, decoherence_rate: f64) -> Self {
        QuantumMemory {
            name: name.into(),
            decoherence_rate,
            slots: (0..capacity).map(MemorySlot::free).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free(&self) -> usize {
        self.slots.iter().filter(|s| s.is_free()).count()
    }

    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    pub fn slot(&self, addr: usize) -> Option<&MemorySlot> {
        self.slots.get(addr)
    }

    /// Reserve a FREE slot for `path_id` (and, optionally, a reservation
    /// `key` used later to match a specific `write`). Returns the slot
    /// address, or `None` if the memory is full.
    pub fn allocate(&mut self, path_id: Option<i64>, key: Option<String>) -> Option<usize> {
        let slot = self.slots.iter_mut().find(|s| s.is_free())?;
        slot.state = SlotState::Reserved;
        slot.path_id = path_id;
        slot.key = key;
        Some(slot.addr)
    }

    /// Free a RESERVED slot. Illegal (returns `false`) on any other state,
    /// including OCCUPIED, per §4.3.
    pub fn deallocate(&mut self, addr: usize) -> bool {
        match self.slots.get_mut(addr) {
            Some(slot) if slot.state == SlotState::Reserved => {
                slot.reset();
                true
            }
            _ => false,
        }
    }

    /// Bind a FREE slot to `qchannel` (statistical mux / receiver side).
    pub fn assign(&mut self, qchannel: impl Into<String>) -> Option<usize> {
        let slot = self.slots.iter_mut().find(|s| s.is_free())?;
        slot.qchannel = Some(qchannel.into());
        Some(slot.addr)
    }

    /// All slots bound to `qchannel` (assigned or holding an EPR over it).
    pub fn channel_slots(&self, qchannel: &str) -> Vec<(usize, Option<&EprPair>)> {
        self.slots
            .iter()
            .filter(|s| s.qchannel.as_deref() == Some(qchannel))
            .map(|s| (s.addr, s.epr.as_ref()))
            .collect()
    }

    /// Store `epr` into a slot. Selection rule (§4.3): an explicit
    /// `address` wins; otherwise a RESERVED slot matching `path_id`/`key`;
    /// otherwise any FREE slot. Returns the chosen address, or `None` if no
    /// candidate exists. On success the slot moves to OCCUPIED and its
    /// decoherence deadline is computed as `creation_time + 1/decoherence_rate`
    /// (§3 invariant iii) -- the caller is responsible for scheduling the
    /// matching `QubitDecohered` event with the scheduler.
    pub fn write(
        &mut self,
        mut epr: EprPair,
        path_id: Option<i64>,
        key: Option<&str>,
        address: Option<usize>,
    ) -> Option<usize> {
        let addr = if let Some(addr) = address {
            let slot = self.slots.get(addr)?;
            if slot.epr.is_some() {
                return None;
            }
            addr
        } else if path_id.is_some() || key.is_some() {
            self.slots
                .iter()
                .find(|s| {
                    s.state == SlotState::Reserved
                        && s.path_id == path_id
                        && s.key.as_deref() == key
                })?
                .addr
        } else {
            self.slots.iter().find(|s| s.is_free())?.addr
        };

        let deadline = epr.creation_time + 1.0 / self.decoherence_rate;
        epr.decoherence_time = deadline;
        let slot = &mut self.slots[addr];
        slot.path_id = path_id.or(slot.path_id);
        slot.epr = Some(epr);
        slot.state = SlotState::Occupied;
        slot.decoh_deadline = Some(deadline);
        Some(addr)
    }

    /// Transition an OCCUPIED slot to ENTANGLED (LL, once the herald
    /// completes on either side).
    pub fn mark_entangled(&mut self, addr: usize) {
        if let Some(slot) = self.slots.get_mut(addr) {
            slot.state = SlotState::Entangled;
        }
    }

    pub fn set_state(&mut self, addr: usize, state: SlotState) {
        if let Some(slot) = self.slots.get_mut(addr) {
            slot.state = state;
        }
    }

    fn find_by_key(&self, key: &str) -> Option<usize> {
        self.slots
            .iter()
            .find(|s| s.epr.as_ref().map(|e| e.epr_id.as_str()) == Some(key))
            .map(|s| s.addr)
    }

    /// Destructive read by EPR id or address: frees the slot.
    pub fn read(&mut self, key: Option<&str>, address: Option<usize>) -> Option<(MemorySlot, EprPair)> {
        let addr = address.or_else(|| key.and_then(|k| self.find_by_key(k)))?;
        let slot = self.slots.get_mut(addr)?;
        let epr = slot.epr.take()?;
        let snapshot = slot.clone();
        slot.reset();
        Some((snapshot, epr))
    }

    /// Non-destructive inspection by EPR id or address.
    pub fn get(&self, key: Option<&str>, address: Option<usize>) -> Option<(&MemorySlot, &EprPair)> {
        let addr = address.or_else(|| key.and_then(|k| self.find_by_key(k)))?;
        let slot = self.slots.get(addr)?;
        let epr = slot.epr.as_ref()?;
        Some((slot, epr))
    }

    /// Rewrite the EPR currently held in the slot for `old_epr_id` with
    /// `new_epr`, keeping the slot's address and `path_id` fixed (§8
    /// property 7) and rescheduling the decoherence deadline from
    /// `new_epr.decoherence_time`. Returns `false` if no such slot exists.
    pub fn update(&mut self, old_epr_id: &str, new_epr: EprPair) -> bool {
        let Some(addr) = self.find_by_key(old_epr_id) else {
            return false;
        };
        let deadline = new_epr.decoherence_time;
        let slot = &mut self.slots[addr];
        slot.epr = Some(new_epr);
        slot.decoh_deadline = Some(deadline);
        true
    }

    /// Slots in ELIGIBLE state bound to `path_id`.
    pub fn search_eligible_qubits(&self, path_id: Option<i64>) -> Vec<(usize, &EprPair)> {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Eligible && s.path_id == path_id)
            .filter_map(|s| s.epr.as_ref().map(|epr| (s.addr, epr)))
            .collect()
    }

    /// Return every slot to FREE (LSYNC/SYNC phase boundary, §4.4).
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
    }

    /// Decoherence deadline for `addr`, if the slot still holds the EPR
    /// that was present when the timer was scheduled.
    pub fn still_holds(&self, addr: usize, epr_id: &str, at: SimTime) -> bool {
        match self.slots.get(addr) {
            Some(slot) => slot.epr.as_ref().map(|e| e.epr_id.as_str()) == Some(epr_id) && slot.decoh_deadline.map(|d| at >= d).unwrap_or(false),
            None => false,
        }
    }

    /// Mark the slot DECOHERED then RELEASED and clear it (QM timer).
    pub fn expire(&mut self, addr: usize) -> Option<EprPair> {
        let slot = self.slots.get_mut(addr)?;
        let epr = slot.epr.take();
        slot.state = SlotState::Decohered;
        slot.reset();
        epr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(id: &str) -> EprPair {
        EprPair::new_elementary(id, "A".into(), "B".into(), 0.99, 0.0, 1.0)
    }

    #[test]
    fn allocate_then_write_matches_reservation() {
        let mut mem = QuantumMemory::new("mem", 2, 1.0);
        let addr = mem.allocate(Some(0), Some("key1".into())).unwrap();
        assert!(mem.write(pair("epr2"), Some(0), Some("other"), None).is_none());
        let written = mem.write(pair("epr1"), Some(0), Some("key1"), None).unwrap();
        assert_eq!(written, addr);
    }

    #[test]
    fn write_fails_on_occupied_address() {
        let mut mem = QuantumMemory::new("mem", 1, 1.0);
        mem.write(pair("epr1"), None, None, None).unwrap();
        assert!(mem.write(pair("epr2"), None, None, Some(0)).is_none());
    }

    #[test]
    fn read_is_destructive_and_frees_slot() {
        let mut mem = QuantumMemory::new("mem", 1, 1.0);
        mem.write(pair("epr1"), None, None, None).unwrap();
        let (_, epr) = mem.read(Some("epr1"), None).unwrap();
        assert_eq!(epr.epr_id, "epr1");
        assert_eq!(mem.free(), 1);
        assert!(mem.read(Some("epr1"), None).is_none());
    }

    #[test]
    fn update_preserves_address_and_path_id() {
        let mut mem = QuantumMemory::new("mem", 1, 1.0);
        let addr = mem.allocate(Some(5), None).unwrap();
        mem.write(pair("old"), Some(5), None, None).unwrap();
        let mut new_epr = pair("new");
        new_epr.fidelity = 0.5;
        assert!(mem.update("old", new_epr));
        let (slot, epr) = mem.get(Some("new"), None).unwrap();
        assert_eq!(slot.addr, addr);
        assert_eq!(slot.path_id, Some(5));
        assert_eq!(epr.fidelity, 0.5);
    }

    #[test]
    fn capacity_invariant_holds() {
        let mut mem = QuantumMemory::new("mem", 3, 1.0);
        mem.allocate(Some(1), None);
        mem.write(pair("a"), None, None, None);
        assert_eq!(mem.free() + 2, mem.capacity());
    }

    #[test]
    fn clear_resets_all_slots() {
        let mut mem = QuantumMemory::new("mem", 2, 1.0);
        mem.write(pair("a"), None, None, None);
        mem.allocate(Some(1), None);
        assert!(mem.is_full());
        mem.clear();
        assert!(!mem.is_full());
        assert_eq!(mem.free(), 2);
    }

    #[test]
    fn deallocate_illegal_on_occupied() {
        let mut mem = QuantumMemory::new("mem", 1, 1.0);
        let addr = mem.allocate(Some(1), None).unwrap();
        mem.write(pair("a"), Some(1), None, None).unwrap();
        assert!(!mem.deallocate(addr));
    }

    #[test]
    fn search_eligible_qubits_filters_by_state_and_path() {
        let mut mem = QuantumMemory::new("mem", 2, 1.0);
        let a1 = mem.write(pair("a"), Some(1), None, None).unwrap();
        mem.write(pair("b"), Some(2), None, None).unwrap();
        mem.set_state(a1, SlotState::Eligible);
        let eligible = mem.search_eligible_qubits(Some(1));
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].1.epr_id, "a");
    }
}
