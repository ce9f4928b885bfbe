use crate::network::link_arch::LinkArchitecture;
use crate::network::NodeId;

/// A quantum link between two nodes (§6 `qchannels`).
///
/// Distance + flat-attenuation transport, extended with the link-architecture
/// model of §4.5 and a per-link capacity (the number of concurrent
/// heralding attempts the link layer may run).
#[derive(Debug, Clone)]
pub struct QChannel {
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
}

impl QChannel {
    pub fn connects_to(&self, node: &str) -> bool {
        self.node_a == node || self.node_b == node
    }

    pub fn partner_of(&self, node: &str) -> Option<&NodeId> {
        if self.node_a == node {
            Some(&self.node_b)
        } else if self.node_b == node {
            Some(&self.node_a)
        } else {
            None
        }
    }

    pub fn success_prob(&self) -> f64 {
        self.architecture
            .success_prob(self.length_km, self.alpha_db_per_km, self.eta_s, self.eta_d)
    }

    /// Propagation delay used for the classical ack/herald round trip
    /// (half the speed-of-light delay for `length_km` of fiber).
    pub fn propagation_delay(&self) -> f64 {
        const FIBER_GROUP_VELOCITY_KM_PER_S: f64 = 2.0e5;
        self.length_km / FIBER_GROUP_VELOCITY_KM_PER_S
    }
}

/// A classical link between two nodes (§6 `cchannels`), used for heralding
/// acks, SWAP_UPDATE, and controller messages. Carries a fixed propagation
/// `delay` and nothing else -- this layer never drops or reorders.
#[derive(Debug, Clone)]
pub struct CChannel {
    pub name: String,
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub delay: f64,
}

impl CChannel {
    pub fn connects_to(&self, node: &str) -> bool {
        self.node_a == node || self.node_b == node
    }

    pub fn partner_of(&self, node: &str) -> Option<&NodeId> {
        if self.node_a == node {
            Some(&self.node_b)
        } else if self.node_b == node {
            Some(&self.node_a)
        } else {
            None
        }
    }
}
