use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::error::{SimError, SimResult};
use crate::memory::SlotState;
use crate::network::{Node, NodeId};
use crate::protocols::messages::{ClassicMessage, PathInstructions};
use crate::protocols::timing::TimingMode;
use crate::protocols::{controller, ParallelSwapRecord};
use crate::quantum::EprPair;
use crate::rng::SimRng;
use crate::simulation::{ActiveChannelOp, EventScheduler, SignalType, SimEvent, SimTime};

/// Orchestrates every node's link layer and forwarder over one shared
/// scheduler and PRNG (§5). This is the single place handler logic lives:
/// `Node`/`LinkLayerState`/`ForwarderState` are plain data, dispatched on
/// by the `ll_*`/`pf_*`/`controller_*` methods below, keeping a flat
/// `EventScheduler` driven from one loop rather than per-node trait
/// objects.
pub struct Simulator {
    pub scheduler: EventScheduler,
    pub rng: SimRng,
    pub nodes: HashMap<NodeId, Node>,
    epr_seq: u64,
}

impl Simulator {
    pub fn new(seed: u64) -> Self {
        Simulator {
            scheduler: EventScheduler::new(),
            rng: SimRng::from_seed(seed),
            nodes: HashMap::new(),
            epr_seq: 0,
        }
    }

    pub fn add_node(&mut self, node: Node) {
        let name = node.name.clone();
        let cycle = node.timing.cycle();
        self.nodes.insert(name.clone(), node);
        if let Some((start, _period)) = cycle {
            self.scheduler.schedule_after(
                start,
                SimEvent::SyncSignal {
                    node: name,
                    phase: SignalType::ExternalStart,
                },
            );
        }
    }

    fn next_epr_id(&mut self, node: &str, qchannel: &str) -> String {
        self.epr_seq += 1;
        format!("{node}:{qchannel}:{}", self.epr_seq)
    }

    /// Run until the event queue drains or `deadline` is reached.
    pub fn run_until(&mut self, deadline: SimTime) {
        while let Some(next_time) = self.scheduler.peek_time() {
            if next_time > deadline {
                break;
            }
            let event = self.scheduler.next_event().expect("peek_time found an event");
            self.dispatch(event.time, event.payload);
        }
    }

    pub fn run(&mut self) {
        while self.scheduler.has_events() {
            let event = self.scheduler.next_event().unwrap();
            self.dispatch(event.time, event.payload);
        }
    }

    fn dispatch(&mut self, now: SimTime, event: SimEvent) {
        match event {
            SimEvent::GenerateAttempt {
                node,
                qchannel,
                neighbor,
                address,
            } => self.ll_generate_attempt(now, &node, &qchannel, &neighbor, address),
            SimEvent::RecvQubit { qchannel, from, to, epr } => self.ll_on_recv_qubit(now, &qchannel, &from, &to, *epr),
            SimEvent::RecvClassic { cchannel, from, to, msg } => self.on_recv_classic(now, &cchannel, &from, &to, *msg),
            SimEvent::QubitEntangled { node, qchannel, neighbor, addr } => {
                self.pf_on_qubit_entangled(now, &node, &qchannel, &neighbor, addr)
            }
            SimEvent::QubitReleased { node, qchannel, addr, .. } => self.ll_on_qubit_released(&node, &qchannel, addr),
            SimEvent::QubitDecohered { node, qchannel, addr } => self.on_qubit_decohered(&node, &qchannel, addr),
            SimEvent::EndToEndEntanglement { node, epr_id } => {
                trace!(node, epr_id, "end-to-end entanglement (observer-only)");
            }
            SimEvent::LinkLayerManageActiveChannels { node, qchannel, neighbor, op } => {
                self.ll_activate_link(now, &node, &qchannel, &neighbor, op)
            }
            SimEvent::SyncSignal { node, phase } => self.handle_sync_signal(now, &node, phase),
        }
    }

    fn send_classical(&mut self, from: &str, to: &str, msg: ClassicMessage) {
        let (delay, cchannel) = self
            .nodes
            .get(from)
            .and_then(|n| n.cchannel_to(to))
            .map(|c| (c.delay, c.name.clone()))
            .unwrap_or((0.0, String::new()));
        self.scheduler.schedule_after(
            delay,
            SimEvent::RecvClassic {
                cchannel,
                from: from.to_string(),
                to: to.to_string(),
                msg: Box::new(msg),
            },
        );
    }

    fn on_recv_classic(&mut self, now: SimTime, _cchannel: &str, from: &str, to: &str, msg: ClassicMessage) {
        match msg {
            ClassicMessage::EprSucceeded { epr_id, .. } => self.ll_on_epr_succeeded(to, from, &epr_id),
            ClassicMessage::EprFailed { epr_id, .. } => self.ll_on_epr_failed(to, from, &epr_id),
            ClassicMessage::SwapUpdate {
                path_id,
                swapping_node,
                partner,
                epr,
                new_epr,
                destination,
                fwd,
            } => self.pf_on_swap_update(now, to, path_id, &swapping_node, &partner, &epr, new_epr, &destination, fwd),
            ClassicMessage::PathInstall {
                path_id,
                request_id,
                instructions,
            } => {
                if let Err(e) = self.controller_install_path(now, to, path_id, request_id, &instructions) {
                    warn!(node = to, %e, "path install failed");
                }
            }
        }
    }

    // ---- Controller ----------------------------------------------------

    pub fn controller_install_path(
        &mut self,
        now: SimTime,
        node_name: &str,
        path_id: i64,
        request_id: i64,
        instructions: &PathInstructions,
    ) -> SimResult<()> {
        let activations = {
            let node = self
                .nodes
                .get_mut(node_name)
                .ok_or_else(|| SimError::Configuration(format!("unknown node {node_name}")))?;
            controller::install_path(node, path_id, request_id, instructions)?
        };
        for (qchannel, neighbor) in activations {
            self.ll_activate_link(now, node_name, &qchannel, &neighbor, ActiveChannelOp::Add);
        }
        Ok(())
    }

    // ---- Link layer ------------------------------------------------------

    pub fn ll_activate_link(&mut self, now: SimTime, node_name: &str, qchannel: &str, neighbor: &str, op: ActiveChannelOp) {
        match op {
            ActiveChannelOp::Add => {
                let mode = {
                    let Some(node) = self.nodes.get_mut(node_name) else { return };
                    node.apps.ll.active_channels.insert(qchannel.to_string(), neighbor.to_string());
                    node.apps.ll.initiator_channels.insert(qchannel.to_string());
                    node.timing.mode
                };
                match mode {
                    TimingMode::Async => self.ll_spawn_attempt_wave(node_name, qchannel, neighbor),
                    TimingMode::Lsync => {
                        if let Some(node) = self.nodes.get_mut(node_name) {
                            node.apps.ll.waiting_channels.push((qchannel.to_string(), neighbor.to_string()));
                        }
                    }
                    TimingMode::Sync => {
                        // Only runs during EXTERNAL; handled by handle_sync_signal when it next starts.
                    }
                }
            }
            ActiveChannelOp::Remove => {
                if let Some(node) = self.nodes.get_mut(node_name) {
                    node.apps.ll.active_channels.remove(qchannel);
                    node.apps.ll.initiator_channels.remove(qchannel);
                }
            }
        }
        let _ = now;
    }

    /// Schedule one generation attempt per currently free slot, spaced by
    /// `1/attempt_rate` (§4.1 `activate_link`).
    fn ll_spawn_attempt_wave(&mut self, node_name: &str, qchannel: &str, neighbor: &str) {
        let (rate, addrs) = {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            let rate = node.apps.ll.attempt_rate.max(1e-9);
            let Some(mem) = node.memory_mut(qchannel) else { return };
            let free = mem.free();
            let mut addrs = Vec::with_capacity(free);
            for _ in 0..free {
                if let Some(addr) = mem.allocate(None, None) {
                    addrs.push(addr);
                }
            }
            (rate, addrs)
        };
        for (k, addr) in addrs.into_iter().enumerate() {
            self.scheduler.schedule_after(
                (k as f64) / rate,
                SimEvent::GenerateAttempt {
                    node: node_name.to_string(),
                    qchannel: qchannel.to_string(),
                    neighbor: neighbor.to_string(),
                    address: Some(addr),
                },
            );
        }
    }

    fn ll_generate_attempt(&mut self, now: SimTime, node_name: &str, qchannel: &str, neighbor: &str, address: Option<usize>) {
        let active = self.nodes.get(node_name).map(|n| n.apps.ll.is_active(qchannel)).unwrap_or(false);
        if !active {
            if let Some(addr) = address {
                if let Some(node) = self.nodes.get_mut(node_name) {
                    if let Some(mem) = node.memory_mut(qchannel) {
                        mem.deallocate(addr);
                    }
                }
            }
            return;
        }
        let Some(addr) = address else { return };

        // Creation happens on the fixed attempt schedule regardless of link
        // efficiency (§4.1); heralding loss is applied at distribution via
        // the channel's `drop_rate`, not gated here. The transit delay
        // until the secondary (receiver) is notified comes from the link
        // architecture's own delay model rather than bare propagation.
        let found = self.nodes.get(node_name).and_then(|node| {
            let ch = node.qchannel(qchannel)?;
            let tau_l = ch.propagation_delay();
            let (_, _, notify_secondary) = ch.architecture.delays(1, 0.0, tau_l, 0.0);
            Some((notify_secondary.max(0.0), node.apps.ll.init_fidelity))
        });
        let Some((transit_delay, init_fidelity)) = found else { return };

        let epr_id = self.next_epr_id(node_name, qchannel);
        let decoherence_rate = self
            .nodes
            .get(node_name)
            .and_then(|n| n.memory(qchannel))
            .map(|m| m.decoherence_rate)
            .unwrap_or(1.0);
        let epr = EprPair::new_elementary(epr_id, node_name.to_string(), neighbor.to_string(), init_fidelity, now, decoherence_rate);

        let deadline = {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            let Some(mem) = node.memory_mut(qchannel) else { return };
            if mem.write(epr.clone(), None, None, Some(addr)).is_none() {
                return;
            }
            mem.slot(addr).and_then(|s| s.decoh_deadline).unwrap_or(now)
        };
        self.scheduler.schedule_at(
            deadline,
            SimEvent::QubitDecohered {
                node: node_name.to_string(),
                qchannel: qchannel.to_string(),
                addr,
            },
        );

        self.scheduler.schedule_after(
            transit_delay,
            SimEvent::RecvQubit {
                qchannel: qchannel.to_string(),
                from: node_name.to_string(),
                to: neighbor.to_string(),
                epr: Box::new(epr),
            },
        );
    }

    fn ll_on_recv_qubit(&mut self, now: SimTime, qchannel: &str, from: &str, to: &str, epr: EprPair) {
        let epr_id = epr.epr_id.clone();
        let path_id = epr.path_id;

        let drop_rate = self.nodes.get(to).and_then(|n| n.qchannel(qchannel)).map(|c| c.drop_rate).unwrap_or(0.0);
        if self.rng.bernoulli(drop_rate) {
            self.send_classical(to, from, ClassicMessage::EprFailed { path_id, epr_id });
            return;
        }

        let written = {
            let Some(node) = self.nodes.get_mut(to) else { return };
            let Some(mem) = node.memory_mut(qchannel) else { return };
            match mem.write(epr, path_id, None, None) {
                Some(addr) => {
                    mem.mark_entangled(addr);
                    let deadline = mem.slot(addr).and_then(|s| s.decoh_deadline).unwrap_or(now);
                    Some((addr, deadline))
                }
                None => None,
            }
        };

        let Some((addr, deadline)) = written else {
            self.send_classical(to, from, ClassicMessage::EprFailed { path_id, epr_id });
            return;
        };

        self.scheduler.schedule_at(
            deadline,
            SimEvent::QubitDecohered {
                node: to.to_string(),
                qchannel: qchannel.to_string(),
                addr,
            },
        );
        // The secondary's notification delay is already folded into the
        // `RecvQubit` transit time (see `ll_generate_attempt`); the qubit
        // is entangled as soon as it's delivered and written.
        self.scheduler.schedule_after(
            0.0,
            SimEvent::QubitEntangled {
                node: to.to_string(),
                qchannel: qchannel.to_string(),
                neighbor: from.to_string(),
                addr,
            },
        );
        self.send_classical(to, from, ClassicMessage::EprSucceeded { path_id, epr_id });
    }

    fn ll_on_epr_succeeded(&mut self, node_name: &str, neighbor: &str, epr_id: &str) {
        let result = {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            let Some(qchannel) = node.qchannel_to(neighbor).map(|c| c.name.clone()) else { return };
            let Some(mem) = node.memory_mut(&qchannel) else { return };
            let Some((slot, _)) = mem.get(Some(epr_id), None) else { return };
            let addr = slot.addr;
            mem.mark_entangled(addr);
            (qchannel, addr)
        };
        let (qchannel, addr) = result;
        let notify_primary = self
            .nodes
            .get(node_name)
            .and_then(|n| n.qchannel(&qchannel))
            .map(|c| {
                let tau_l = c.propagation_delay();
                let (_, notify_primary, _) = c.architecture.delays(1, 0.0, tau_l, 0.0);
                notify_primary.max(0.0)
            })
            .unwrap_or(0.0);
        self.scheduler.schedule_after(
            notify_primary,
            SimEvent::QubitEntangled {
                node: node_name.to_string(),
                qchannel,
                neighbor: neighbor.to_string(),
                addr,
            },
        );
    }

    fn ll_on_epr_failed(&mut self, node_name: &str, neighbor: &str, epr_id: &str) {
        let state = {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            let Some(qchannel) = node.qchannel_to(neighbor).map(|c| c.name.clone()) else { return };
            if let Some(mem) = node.memory_mut(&qchannel) {
                mem.read(Some(epr_id), None);
            }
            let active = node.apps.ll.is_active(&qchannel);
            (qchannel, active)
        };
        let (qchannel, active) = state;
        if !active {
            return;
        }
        let addr = {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            let Some(mem) = node.memory_mut(&qchannel) else { return };
            let Some(addr) = mem.allocate(None, None) else { return };
            addr
        };
        self.scheduler.schedule_after(
            0.0,
            SimEvent::GenerateAttempt {
                node: node_name.to_string(),
                qchannel,
                neighbor: neighbor.to_string(),
                address: Some(addr),
            },
        );
    }

    fn on_qubit_decohered(&mut self, node_name: &str, qchannel: &str, addr: usize) {
        let at = self.scheduler.current_time();
        let (is_initiator, neighbor, expired) = {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            let still_due = node
                .memory(qchannel)
                .and_then(|m| m.slot(addr))
                .map(|s| s.decoh_deadline.map(|d| at >= d).unwrap_or(false) && s.epr.is_some())
                .unwrap_or(false);
            if !still_due {
                return;
            }
            let neighbor = node.qchannel(qchannel).and_then(|c| c.partner_of(&node.name).cloned());
            let is_initiator = node.apps.ll.is_initiator(qchannel);
            let expired = node.memory_mut(qchannel).map(|m| m.expire(addr)).is_some();
            (is_initiator, neighbor, expired)
        };
        if !expired {
            return;
        }
        if let Some(node) = self.nodes.get_mut(node_name) {
            node.apps.ll.decohered_count += 1;
        }
        if is_initiator {
            if let Some(neighbor) = neighbor {
                let new_addr = self.nodes.get_mut(node_name).and_then(|n| n.memory_mut(qchannel)).and_then(|m| m.allocate(None, None));
                if let Some(new_addr) = new_addr {
                    self.scheduler.schedule_after(
                        0.0,
                        SimEvent::GenerateAttempt {
                            node: node_name.to_string(),
                            qchannel: qchannel.to_string(),
                            neighbor,
                            address: Some(new_addr),
                        },
                    );
                }
            }
        }
    }

    fn ll_on_qubit_released(&mut self, node_name: &str, qchannel: &str, addr: usize) {
        let retry = {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            let Some(neighbor) = node.apps.ll.active_channels.get(qchannel).cloned() else { return };
            match node.timing.mode {
                TimingMode::Async => Some(neighbor),
                TimingMode::Lsync | TimingMode::Sync => {
                    node.apps.ll.waiting_qubits.push((qchannel.to_string(), addr));
                    None
                }
            }
        };
        if let Some(neighbor) = retry {
            self.scheduler.schedule_after(
                0.0,
                SimEvent::GenerateAttempt {
                    node: node_name.to_string(),
                    qchannel: qchannel.to_string(),
                    neighbor,
                    address: Some(addr),
                },
            );
        }
    }

    fn handle_sync_signal(&mut self, now: SimTime, node_name: &str, phase: SignalType) {
        self.ll_handle_sync_signal(node_name, phase);
        self.pf_handle_sync_signal(now, node_name, phase);
        self.schedule_next_sync_signal(node_name, phase);
    }

    /// Advances the phase driver for the next cycle: LSYNC repeats
    /// `ExternalStart` every `t_slot`; SYNC alternates `ExternalStart`
    /// (EXTERNAL phase, duration `t_ext`) with `Internal` (INTERNAL phase,
    /// duration `t_int`).
    fn schedule_next_sync_signal(&mut self, node_name: &str, phase: SignalType) {
        let Some(node) = self.nodes.get(node_name) else { return };
        let (next_phase, delay) = match node.timing.mode {
            TimingMode::Async => return,
            TimingMode::Lsync => (SignalType::ExternalStart, node.timing.t_slot),
            TimingMode::Sync => match phase {
                SignalType::ExternalStart => (SignalType::Internal, node.timing.t_ext),
                _ => (SignalType::ExternalStart, node.timing.t_int),
            },
        };
        self.scheduler.schedule_after(
            delay,
            SimEvent::SyncSignal {
                node: node_name.to_string(),
                phase: next_phase,
            },
        );
    }

    fn ll_handle_sync_signal(&mut self, node_name: &str, phase: SignalType) {
        if phase != SignalType::ExternalStart {
            return;
        }
        let (waiting_channels, waiting_qubits, active) = {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            for mem in node.memories.values_mut() {
                mem.clear();
            }
            let waiting_channels = std::mem::take(&mut node.apps.ll.waiting_channels);
            let waiting_qubits = std::mem::take(&mut node.apps.ll.waiting_qubits);
            let active: Vec<(String, String)> = node.apps.ll.active_channels.iter().map(|(c, n)| (c.clone(), n.clone())).collect();
            (waiting_channels, waiting_qubits, active)
        };

        for (qchannel, neighbor) in waiting_channels.into_iter().chain(active) {
            self.ll_spawn_attempt_wave(node_name, &qchannel, &neighbor);
        }
        for (qchannel, _addr) in waiting_qubits {
            let neighbor = self.nodes.get(node_name).and_then(|n| n.apps.ll.active_channels.get(&qchannel).cloned());
            if let Some(neighbor) = neighbor {
                self.ll_spawn_attempt_wave(node_name, &qchannel, &neighbor);
            }
        }
    }

    // ---- Proactive forwarder --------------------------------------------

    fn pf_on_qubit_entangled(&mut self, now: SimTime, node_name: &str, qchannel: &str, neighbor: &str, addr: usize) {
        let sync = self.nodes.get(node_name).map(|n| n.timing.mode == TimingMode::Sync).unwrap_or(false);
        if sync {
            if let Some(node) = self.nodes.get_mut(node_name) {
                node.apps.pf.waiting_qubits.push((qchannel.to_string(), addr));
            }
            return;
        }
        self.pf_process_entangled(now, node_name, qchannel, neighbor, addr);
    }

    fn pf_process_entangled(&mut self, now: SimTime, node_name: &str, qchannel: &str, neighbor: &str, addr: usize) {
        let decision = {
            let Some(node) = self.nodes.get(node_name) else { return };
            let Some(mem) = node.memory(qchannel) else { return };
            let Some((_, epr)) = mem.get(None, Some(addr)) else { return };
            let Some(path_id) = epr.path_id else {
                debug!(node = node_name, qchannel, "entangled qubit has no path_id (statistical mux); ignoring");
                return;
            };
            let Ok(fib) = node.fib.get(path_id) else {
                debug!(node = node_name, path_id, "no FIB entry for entangled qubit's path");
                return;
            };
            let Some((_, own_rank)) = fib.find_index_and_rank(node_name) else { return };
            let Some((_, partner_rank)) = fib.find_index_and_rank(neighbor) else { return };
            (path_id, own_rank, partner_rank)
        };
        let (path_id, own_rank, partner_rank) = decision;
        if partner_rank < own_rank {
            trace!(node = node_name, "partner rank below own; waiting to swap");
            return;
        }
        self.pf_purif(node_name, qchannel, addr, path_id);
    }

    fn pf_purif(&mut self, node_name: &str, qchannel: &str, addr: usize, path_id: i64) {
        // Purification is scaffolded but not implemented (Non-goal iii):
        // PURIF passes straight through to ELIGIBLE.
        {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            let Some(mem) = node.memory_mut(qchannel) else { return };
            mem.set_state(addr, SlotState::Purif);
            mem.set_state(addr, SlotState::Eligible);
        }
        self.pf_eligible(node_name, path_id, qchannel, addr);
    }

    /// The swap algorithm (§4.2 steps 2-5).
    fn pf_eligible(&mut self, node_name: &str, path_id: i64, qchannel: &str, addr: usize) {
        let fib = self.nodes.get(node_name).and_then(|n| n.fib.get(path_id).ok().cloned());
        let Some(fib) = fib else { return };
        let Some((own_idx, _)) = fib.find_index_and_rank(node_name) else { return };
        let is_end_node = own_idx == 0 || own_idx == fib.path_vector.len() - 1;
        // A disabled path (all-zero swap_sequence) never swaps: every node on
        // it, not just the endpoints, consumes on ELIGIBLE.
        let consumes_locally = is_end_node || fib.is_swap_disabled();

        if consumes_locally {
            let released = {
                let Some(mem) = self.nodes.get_mut(node_name).and_then(|n| n.memory_mut(qchannel)) else { return };
                mem.read(None, Some(addr))
            };
            let Some((_, epr)) = released else { return };
            if let Some(node) = self.nodes.get_mut(node_name) {
                node.apps.pf.e2e_count += 1;
            }
            let is_source = own_idx == 0;
            self.scheduler.schedule_after(
                0.0,
                SimEvent::QubitReleased {
                    node: node_name.to_string(),
                    qchannel: qchannel.to_string(),
                    addr,
                    e2e: is_source,
                },
            );
            self.scheduler.schedule_after(
                0.0,
                SimEvent::EndToEndEntanglement {
                    node: node_name.to_string(),
                    epr_id: epr.epr_id,
                },
            );
            return;
        }

        // Find another ELIGIBLE slot on this path, on a different qchannel.
        let other = self.nodes.get(node_name).and_then(|node| {
            node.memories.iter().filter(|(name, _)| name.as_str() != qchannel).find_map(|(name, mem)| {
                mem.search_eligible_qubits(Some(path_id)).first().map(|(a, epr)| (name.clone(), *a, (*epr).clone()))
            })
        });
        let Some((other_qchannel, other_addr, other_epr)) = other else {
            return;
        };

        let Some(triggering_epr) = self
            .nodes
            .get(node_name)
            .and_then(|n| n.memory(qchannel))
            .and_then(|m| m.get(None, Some(addr)))
            .map(|(_, epr)| epr.clone())
        else {
            return;
        };
        let Some(trig_partner) = triggering_epr.partner_of(node_name).cloned() else { return };
        let Some(other_partner) = other_epr.partner_of(node_name).cloned() else { return };
        let trig_idx = fib.path_vector.iter().position(|n| n == &trig_partner).unwrap_or(usize::MAX);
        let other_idx = fib.path_vector.iter().position(|n| n == &other_partner).unwrap_or(usize::MAX);

        let ((mut prev_epr, prev_partner), (mut next_epr, next_partner)) = if trig_idx < other_idx {
            ((triggering_epr.clone(), trig_partner.clone()), (other_epr.clone(), other_partner.clone()))
        } else {
            ((other_epr.clone(), other_partner.clone()), (triggering_epr.clone(), trig_partner.clone()))
        };

        // Elementary pairs carry the hop index they sit on, so the merge
        // step in a parallel swap can tell which segment each half came
        // from; a pair that is itself the product of an earlier swap keeps
        // no single hop index.
        if prev_epr.orig_eprs.is_empty() {
            prev_epr.ch_index = own_idx.checked_sub(1);
        }
        if next_epr.orig_eprs.is_empty() {
            next_epr.ch_index = Some(own_idx);
        }

        let ps = self.nodes.get(node_name).map(|n| n.apps.pf.ps).unwrap_or(1.0);
        let mut new_epr = prev_epr.swapping(&next_epr, ps, &mut self.rng);
        if let Some(epr) = new_epr.as_mut() {
            epr.src = prev_partner.clone();
            epr.dst = next_partner.clone();
            epr.path_id = Some(path_id);
        }

        // Release both local slots.
        if let Some(mem) = self.nodes.get_mut(node_name).and_then(|n| n.memory_mut(qchannel)) {
            mem.read(None, Some(addr));
        }
        if let Some(mem) = self.nodes.get_mut(node_name).and_then(|n| n.memory_mut(&other_qchannel)) {
            mem.read(None, Some(other_addr));
        }
        self.scheduler.schedule_after(
            0.0,
            SimEvent::QubitReleased {
                node: node_name.to_string(),
                qchannel: qchannel.to_string(),
                addr,
                e2e: false,
            },
        );
        self.scheduler.schedule_after(
            0.0,
            SimEvent::QubitReleased {
                node: node_name.to_string(),
                qchannel: other_qchannel.clone(),
                addr: other_addr,
                e2e: false,
            },
        );

        // §4.2 step 5: parallel-swap bookkeeping if an adjacent partner
        // shares our rank.
        let own_rank = fib.find_index_and_rank(node_name).map(|(_, r)| r);
        for (partner, shared, other_side) in [(&prev_partner, &prev_epr, &next_epr), (&next_partner, &next_epr, &prev_epr)] {
            let partner_rank = fib.find_index_and_rank(partner).map(|(_, r)| r);
            if partner_rank.is_some() && partner_rank == own_rank {
                if let Some(node) = self.nodes.get_mut(node_name) {
                    node.apps.pf.parallel_swappings.insert(
                        shared.epr_id.clone(),
                        ParallelSwapRecord {
                            shared_epr: shared.clone(),
                            other_epr: other_side.clone(),
                            new_epr: new_epr.clone(),
                        },
                    );
                }
            }
        }

        self.send_classical(
            node_name,
            &prev_partner,
            ClassicMessage::SwapUpdate {
                path_id,
                swapping_node: node_name.to_string(),
                partner: next_partner.clone(),
                epr: prev_epr.epr_id.clone(),
                new_epr: new_epr.clone(),
                destination: next_partner.clone(),
                fwd: false,
            },
        );
        self.send_classical(
            node_name,
            &next_partner,
            ClassicMessage::SwapUpdate {
                path_id,
                swapping_node: node_name.to_string(),
                partner: prev_partner.clone(),
                epr: next_epr.epr_id.clone(),
                new_epr,
                destination: prev_partner,
                fwd: false,
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn pf_on_swap_update(
        &mut self,
        now: SimTime,
        node_name: &str,
        path_id: i64,
        swapping_node: &str,
        partner: &str,
        epr_name: &str,
        new_epr: Option<EprPair>,
        destination: &str,
        _fwd: bool,
    ) {
        let fib = self.nodes.get(node_name).and_then(|n| n.fib.get(path_id).ok().cloned());
        let Some(fib) = fib else { return };
        let Some((own_idx, own_rank)) = fib.find_index_and_rank(node_name) else { return };
        let Some((_, sender_rank)) = fib.find_index_and_rank(swapping_node) else { return };
        let is_destination = node_name == destination;

        if !is_destination {
            if own_rank <= sender_rank {
                let dest_idx = fib.path_vector.iter().position(|n| n == destination).unwrap_or(own_idx);
                let next_hop = if dest_idx > own_idx {
                    fib.path_vector.get(own_idx + 1)
                } else {
                    own_idx.checked_sub(1).and_then(|i| fib.path_vector.get(i))
                };
                if let Some(next_hop) = next_hop.cloned() {
                    self.send_classical(
                        node_name,
                        &next_hop,
                        ClassicMessage::SwapUpdate {
                            path_id,
                            swapping_node: swapping_node.to_string(),
                            partner: partner.to_string(),
                            epr: epr_name.to_string(),
                            new_epr,
                            destination: destination.to_string(),
                            fwd: true,
                        },
                    );
                }
            } else {
                warn!(node = node_name, "SWAP_UPDATE received with own_rank > sender_rank while not the destination");
            }
            return;
        }

        let slot_here = self
            .nodes
            .get(node_name)
            .and_then(|n| n.memories.iter().find_map(|(ch, m)| m.get(Some(epr_name), None).map(|_| ch.clone())));

        if own_rank == sender_rank {
            if let Some(ch) = slot_here {
                self.pf_apply_update_or_release(node_name, &ch, epr_name, new_epr, now, path_id, partner);
                if let Some(node) = self.nodes.get_mut(node_name) {
                    node.apps.pf.parallel_swappings.remove(epr_name);
                }
                return;
            }

            let record = self.nodes.get(node_name).and_then(|n| n.apps.pf.parallel_swappings.get(epr_name).cloned());
            let Some(record) = record else {
                debug!(node = node_name, epr_name, "parallel SWAP_UPDATE for untracked slot; dropping");
                return;
            };
            if let Some(node) = self.nodes.get_mut(node_name) {
                node.apps.pf.parallel_swappings.remove(epr_name);
            }
            let Some(far_other) = record.other_epr.partner_of(node_name).cloned() else { return };
            match new_epr {
                None => {
                    self.send_classical(
                        node_name,
                        &far_other,
                        ClassicMessage::SwapUpdate {
                            path_id,
                            swapping_node: node_name.to_string(),
                            partner: swapping_node.to_string(),
                            epr: record.other_epr.epr_id.clone(),
                            new_epr: None,
                            destination: far_other.clone(),
                            fwd: true,
                        },
                    );
                }
                Some(their_new) => {
                    let Some(far_sender) = their_new.partner_of(node_name).cloned() else { return };
                    // Deterministic bookkeeping merge: both physical swaps
                    // already succeeded with their own probabilities baked
                    // into their fidelities, so reconciling the two locally
                    // independent results is pure recombination, not a
                    // fresh trial.
                    let mut merged = their_new.swapping(&record.other_epr, 1.0, &mut self.rng);
                    if let Some(merged) = merged.as_mut() {
                        merged.src = far_sender.clone();
                        merged.dst = far_other.clone();
                        merged.path_id = Some(path_id);
                    }
                    if let Some((_, next_rank)) = fib.find_index_and_rank(&far_other) {
                        if next_rank == own_rank {
                            if let Some(merged_clone) = merged.clone() {
                                if let Some(node) = self.nodes.get_mut(node_name) {
                                    node.apps.pf.parallel_swappings.insert(
                                        merged_clone.epr_id.clone(),
                                        ParallelSwapRecord {
                                            shared_epr: their_new,
                                            other_epr: record.other_epr.clone(),
                                            new_epr: Some(merged_clone),
                                        },
                                    );
                                }
                            }
                        }
                    }
                    self.send_classical(
                        node_name,
                        &far_other,
                        ClassicMessage::SwapUpdate {
                            path_id,
                            swapping_node: node_name.to_string(),
                            partner: far_sender,
                            epr: record.other_epr.epr_id.clone(),
                            new_epr: merged,
                            destination: far_other,
                            fwd: true,
                        },
                    );
                }
            }
            return;
        }

        // own_rank > sender_rank: straightforward update, no parallel race.
        if let Some(ch) = slot_here {
            self.pf_apply_update_or_release(node_name, &ch, epr_name, new_epr, now, path_id, partner);
        }
    }

    fn pf_apply_update_or_release(
        &mut self,
        node_name: &str,
        qchannel: &str,
        epr_name: &str,
        new_epr: Option<EprPair>,
        now: SimTime,
        path_id: i64,
        partner: &str,
    ) {
        let decohered = new_epr.as_ref().map(|e| e.is_decohered_at(now)).unwrap_or(true);
        if decohered {
            let released_addr = {
                let Some(node) = self.nodes.get_mut(node_name) else { return };
                let Some(mem) = node.memory_mut(qchannel) else { return };
                mem.read(Some(epr_name), None).map(|(slot, _)| slot.addr)
            };
            if let Some(addr) = released_addr {
                self.scheduler.schedule_after(
                    0.0,
                    SimEvent::QubitReleased {
                        node: node_name.to_string(),
                        qchannel: qchannel.to_string(),
                        addr,
                        e2e: false,
                    },
                );
            }
            return;
        }

        let new_epr = new_epr.unwrap();
        let new_id = new_epr.epr_id.clone();
        let addr = {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            let Some(mem) = node.memory_mut(qchannel) else { return };
            if !mem.update(epr_name, new_epr) {
                return;
            }
            let Some((slot, _)) = mem.get(Some(&new_id), None) else { return };
            slot.addr
        };

        let fib = self.nodes.get(node_name).and_then(|n| n.fib.get(path_id).ok().cloned());
        let Some(fib) = fib else { return };
        let Some((_, own_rank)) = fib.find_index_and_rank(node_name) else { return };
        let Some((_, partner_rank)) = fib.find_index_and_rank(partner) else { return };
        if partner_rank >= own_rank {
            if let Some(node) = self.nodes.get_mut(node_name) {
                if let Some(mem) = node.memory_mut(qchannel) {
                    mem.set_state(addr, SlotState::Eligible);
                }
            }
            self.pf_eligible(node_name, path_id, qchannel, addr);
        }
    }

    fn pf_handle_sync_signal(&mut self, now: SimTime, node_name: &str, phase: SignalType) {
        if phase != SignalType::Internal {
            return;
        }
        let queued = {
            let Some(node) = self.nodes.get_mut(node_name) else { return };
            std::mem::take(&mut node.apps.pf.waiting_qubits)
        };
        for (qchannel, addr) in queued {
            let neighbor = self.nodes.get(node_name).and_then(|n| n.qchannel(&qchannel)).and_then(|c| c.partner_of(node_name).cloned());
            if let Some(neighbor) = neighbor {
                self.pf_process_entangled(now, node_name, &qchannel, &neighbor, addr);
            }
        }
    }
}
