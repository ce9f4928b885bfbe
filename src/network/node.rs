use std::collections::HashMap;

use crate::memory::QuantumMemory;
use crate::network::channel::{CChannel, QChannel};
use crate::network::fib::ForwardingInformationBase;
use crate::protocols::forwarder::ForwarderState;
use crate::protocols::link_layer::LinkLayerState;
use crate::protocols::timing::SyncDriver;

/// A node's stable name, used as the key in every cross-node reference
/// (channels, FIB path vectors, messages) -- no node holds a live
/// reference to another, only its name (§5 "shared-resource policy").
pub type NodeId = String;
pub type PathId = i64;
pub type RequestId = i64;

/// The two always-present applications on a repeater node (§3 `NodeApps`).
#[derive(Debug, Clone, Default)]
pub struct NodeApps {
    pub ll: LinkLayerState,
    pub pf: ForwarderState,
}

/// A quantum-network node: a repeater or end host (§3 `Node`).
///
/// Holds one memory arena per attached link plus the LL/PF application
/// state and FIB, matching the arena-of-slots and rank-ordered-forwarding
/// design of §4.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: NodeId,
    /// One memory arena per attached qchannel, keyed by qchannel name.
    pub memories: HashMap<String, QuantumMemory>,
    pub qchannels: Vec<QChannel>,
    pub cchannels: Vec<CChannel>,
    pub apps: NodeApps,
    pub timing: SyncDriver,
    pub fib: ForwardingInformationBase,
}

impl Node {
    pub fn new(name: impl Into<String>, timing: SyncDriver) -> Self {
        Node {
            name: name.into(),
            memories: HashMap::new(),
            qchannels: Vec::new(),
            cchannels: Vec::new(),
            apps: NodeApps::default(),
            timing,
            fib: ForwardingInformationBase::new(),
        }
    }

    pub fn qchannel(&self, name: &str) -> Option<&QChannel> {
        self.qchannels.iter().find(|c| c.name == name)
    }

    pub fn cchannel_to(&self, partner: &str) -> Option<&CChannel> {
        self.cchannels.iter().find(|c| c.partner_of(&self.name).map(|p| p.as_str()) == Some(partner))
    }

    pub fn qchannel_to(&self, partner: &str) -> Option<&QChannel> {
        self.qchannels.iter().find(|c| c.partner_of(&self.name).map(|p| p.as_str()) == Some(partner))
    }

    pub fn memory_mut(&mut self, qchannel: &str) -> Option<&mut QuantumMemory> {
        self.memories.get_mut(qchannel)
    }

    pub fn memory(&self, qchannel: &str) -> Option<&QuantumMemory> {
        self.memories.get(qchannel)
    }
}
