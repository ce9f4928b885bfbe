use std::collections::HashMap;

use crate::memory::QuantumMemory;
use crate::network::channel::{CChannel, QChannel};
use crate::network::link_arch::LinkArchitecture;
use crate::network::node::{Node, NodeId};
use crate::protocols::timing::SyncDriver;

/// Parameters for one quantum link, mirroring §6's `qchannels[].parameters`.
#[derive(Debug, Clone)]
pub struct QChannelSpec {
    pub name: String,
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub capacity: usize,
    pub length_km: f64,
    pub alpha_db_per_km: f64,
    pub eta_s: f64,
    pub eta_d: f64,
    pub drop_rate: f64,
    pub architecture: LinkArchitecture,
    pub decoherence_rate: f64,
}

/// Parameters for one classical link, mirroring §6's `cchannels[].parameters`.
#[derive(Debug, Clone)]
pub struct CChannelSpec {
    pub name: String,
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub delay: f64,
}

/// An in-memory network builder (§6 "topology configuration", minus the
/// external parser -- assembling a `NetworkTopology` from already-decoded
/// values is in scope; decoding a config file format is not). An
/// incremental builder over `Node`, since topologies here are driven by
/// arbitrary installed paths rather than a handful of canned shapes.
#[derive(Debug, Clone, Default)]
pub struct NetworkTopology {
    nodes: HashMap<NodeId, Node>,
}

impl NetworkTopology {
    pub fn new() -> Self {
        NetworkTopology::default()
    }

    pub fn add_node(&mut self, name: impl Into<String>, timing: SyncDriver) -> &mut Node {
        let name = name.into();
        self.nodes.entry(name.clone()).or_insert_with(|| Node::new(name, timing))
    }

    /// Attach a quantum link to both endpoints, creating a dedicated
    /// memory arena for it on each side.
    pub fn add_qchannel(&mut self, spec: QChannelSpec) {
        for (owner, _peer) in [(&spec.node_a, &spec.node_b), (&spec.node_b, &spec.node_a)] {
            if let Some(node) = self.nodes.get_mut(owner) {
                node.qchannels.push(QChannel {
                    name: spec.name.clone(),
                    node_a: spec.node_a.clone(),
                    node_b: spec.node_b.clone(),
                    capacity: spec.capacity,
                    length_km: spec.length_km,
                    alpha_db_per_km: spec.alpha_db_per_km,
                    eta_s: spec.eta_s,
                    eta_d: spec.eta_d,
                    drop_rate: spec.drop_rate,
                    architecture: spec.architecture,
                });
                node.memories.insert(
                    spec.name.clone(),
                    QuantumMemory::new(spec.name.clone(), spec.capacity, spec.decoherence_rate),
                );
            }
        }
    }

    pub fn add_cchannel(&mut self, spec: CChannelSpec) {
        for (owner, _peer) in [(&spec.node_a, &spec.node_b), (&spec.node_b, &spec.node_a)] {
            if let Some(node) = self.nodes.get_mut(owner) {
                node.cchannels.push(CChannel {
                    name: spec.name.clone(),
                    node_a: spec.node_a.clone(),
                    node_b: spec.node_b.clone(),
                    delay: spec.delay,
                });
            }
        }
    }

    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn get_node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn into_nodes(self) -> HashMap<NodeId, Node> {
        self.nodes
    }
}

/// How an end-to-end distance is split across a repeater chain's segments
/// (§9 supplemented feature). Pure function used by topology generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceProportion {
    Uniform,
    Increasing,
    Decreasing,
    MidBottleneck,
}

/// Split `end_to_end_distance` into `number_of_routers + 1` segment lengths.
pub fn distance_distribution(end_to_end_distance: i64, number_of_routers: usize, proportion: DistanceProportion) -> Vec<i64> {
    let total_segments = number_of_routers + 1;
    if number_of_routers == 0 {
        return vec![end_to_end_distance];
    }

    match proportion {
        DistanceProportion::Uniform => {
            let segment_length = end_to_end_distance / total_segments as i64;
            vec![segment_length; total_segments]
        }
        DistanceProportion::Increasing => weighted_split(end_to_end_distance, total_segments, false),
        DistanceProportion::Decreasing => weighted_split(end_to_end_distance, total_segments, true),
        DistanceProportion::MidBottleneck => {
            if total_segments <= 2 {
                return vec![end_to_end_distance / total_segments as i64; total_segments];
            }
            let is_even = total_segments % 2 == 0;
            let num_middle = if is_even { 2 } else { 1 };
            let num_edges = total_segments - num_middle;

            let base_edge = (end_to_end_distance as f64 / (num_edges as f64 + 1.2 * num_middle as f64)) as i64;
            let middle = (base_edge as f64 * 1.2) as i64;

            let mut result = vec![base_edge; num_edges / 2];
            result.extend(std::iter::repeat(middle).take(num_middle));
            result.extend(std::iter::repeat(base_edge).take(num_edges / 2));
            result
        }
    }
}

fn weighted_split(end_to_end_distance: i64, total_segments: usize, reversed: bool) -> Vec<i64> {
    let mut weights: Vec<i64> = (0..total_segments as i64).map(|i| 2 * i + 1).collect();
    if reversed {
        weights.reverse();
    }
    let total_weight: i64 = weights.iter().sum();
    weights
        .into_iter()
        .map(|w| (end_to_end_distance as f64 * (w as f64 / total_weight as f64)) as i64)
        .collect()
}
