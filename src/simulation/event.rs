use std::cmp::Ordering;

use crate::network::NodeId;
use crate::protocols::messages::ClassicMessage;
use crate::quantum::EprPair;

/// Simulated time, in seconds.
pub type SimTime = f64;

/// ADD/REMOVE variant for `LinkLayerManageActiveChannels`, per §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveChannelOp {
    Add,
    Remove,
}

/// The timing-mode phase signal (§4.4). `ExternalStart` marks the
/// beginning of an EXTERNAL phase under LSYNC/SYNC and is what flushes
/// the waiting queues; plain `External`/`Internal` mark phase membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalType {
    External,
    ExternalStart,
    Internal,
}

/// A discrete event in the quantum-network simulation.
///
/// A data-carrying variant per kind, since each event needs a distinct,
/// richer payload (a qubit packet, a classical message, a slot address,
/// ...). The scheduler dispatches on the variant directly rather than
/// through a capability object -- see `simulator::Simulator::dispatch`.
#[derive(Debug, Clone)]
pub enum SimEvent {
    /// A half-EPR photon arrives at `to` over `qchannel`, sent by `from`.
    RecvQubit {
        qchannel: String,
        from: NodeId,
        to: NodeId,
        epr: Box<EprPair>,
    },
    /// A classical packet arrives at `to` over `cchannel`.
    RecvClassic {
        cchannel: String,
        from: NodeId,
        to: NodeId,
        msg: Box<ClassicMessage>,
    },
    /// A slot at `node` became ENTANGLED with `neighbor` over `qchannel`.
    QubitEntangled {
        node: NodeId,
        qchannel: String,
        neighbor: NodeId,
        addr: usize,
    },
    /// A slot at `node` was released (freed by the owning application).
    QubitReleased {
        node: NodeId,
        qchannel: String,
        addr: usize,
        e2e: bool,
    },
    /// The decoherence timer for a slot fired.
    QubitDecohered {
        node: NodeId,
        qchannel: String,
        addr: usize,
    },
    /// Observer-only: an end-to-end pair was formed. No consumer in PF
    /// today (§9 open question 4) -- kept for external observers.
    EndToEndEntanglement { node: NodeId, epr_id: String },
    /// Controller instructs the link layer to add/remove an active
    /// channel for EPR generation toward `neighbor`.
    LinkLayerManageActiveChannels {
        node: NodeId,
        qchannel: String,
        neighbor: NodeId,
        op: ActiveChannelOp,
    },
    /// Timing-mode driver phase-change signal, delivered to both LL and PF
    /// at `node`.
    SyncSignal { node: NodeId, phase: SignalType },
    /// Internal: trigger one EPR-generation attempt on `qchannel` toward
    /// `neighbor`, optionally retrying a specific slot `address`. A plain
    /// enum variant keeps dispatch a closed match instead of boxed
    /// closures.
    GenerateAttempt {
        node: NodeId,
        qchannel: String,
        neighbor: NodeId,
        address: Option<usize>,
    },
}

/// A scheduled event: a payload plus the time it fires and an insertion
/// sequence number used to break ties deterministically (§5: "the
/// sequence counter breaks ties deterministically (FIFO within a tick)").
#[derive(Debug, Clone)]
pub struct Event {
    pub time: SimTime,
    pub sequence: u64,
    pub payload: SimEvent,
}

impl Event {
    pub fn new(time: SimTime, sequence: u64, payload: SimEvent) -> Self {
        Event {
            time,
            sequence,
            payload,
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.sequence == other.sequence
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse time ordering so a `BinaryHeap` (a max-heap) behaves as a
        // min-heap; reverse sequence too so that, at equal time, the event
        // inserted *first* is popped first (FIFO within a tick).
        other
            .time
            .partial_cmp(&self.time)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(node: &str) -> SimEvent {
        SimEvent::SyncSignal {
            node: node.to_string(),
            phase: SignalType::External,
        }
    }

    #[test]
    fn orders_by_time_first() {
        let e1 = Event::new(2.0, 0, dummy("a"));
        let e2 = Event::new(1.0, 1, dummy("b"));
        assert!(e2 < e1);
    }

    #[test]
    fn breaks_ties_by_sequence_fifo() {
        let e1 = Event::new(1.0, 5, dummy("a"));
        let e2 = Event::new(1.0, 6, dummy("b"));
        // Lower sequence (inserted earlier) must pop first -> compares "less" in heap order.
        assert!(e1 < e2);
    }
}
