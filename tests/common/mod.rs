use std::collections::HashMap;

use entangle_sim::network::{CChannelSpec, LinkArchitecture, NetworkTopology, QChannelSpec};
use entangle_sim::protocols::timing::SyncDriver;
use entangle_sim::protocols::{MuxScheme, PathInstructions};
use entangle_sim::simulation::ActiveChannelOp;
use entangle_sim::Simulator;

/// One hop's physical parameters for `build_linear`.
pub struct HopSpec {
    pub length_km: f64,
}

impl HopSpec {
    pub fn new(length_km: f64) -> Self {
        HopSpec { length_km }
    }
}

/// Build a linear chain `names[0] -- names[1] -- ... -- names[n-1]` with
/// one quantum link per adjacent pair (uniform capacity/architecture) and
/// a matched classical link, mirroring the §8 end-to-end scenarios.
pub fn build_linear(names: &[&str], hops: &[HopSpec], capacity: usize, decoherence_rate: f64, attempt_rate: f64, init_fidelity: f64) -> Simulator {
    assert_eq!(names.len(), hops.len() + 1);

    let mut topo = NetworkTopology::new();
    for name in names {
        topo.add_node(*name, SyncDriver::async_driver());
    }
    for (i, hop) in hops.iter().enumerate() {
        let a = names[i];
        let b = names[i + 1];
        topo.add_qchannel(QChannelSpec {
            name: format!("q{a}{b}"),
            node_a: a.into(),
            node_b: b.into(),
            capacity,
            length_km: hop.length_km,
            alpha_db_per_km: 0.2,
            eta_s: 0.95,
            eta_d: 0.95,
            drop_rate: 0.0,
            architecture: LinkArchitecture::Sr,
            decoherence_rate,
        });
        topo.add_cchannel(CChannelSpec {
            name: format!("c{a}{b}"),
            node_a: a.into(),
            node_b: b.into(),
            delay: hop.length_km / 2.0e5,
        });
    }

    for name in names {
        let node = topo.get_node_mut(name).unwrap();
        node.apps.ll.attempt_rate = attempt_rate;
        node.apps.ll.init_fidelity = init_fidelity;
    }

    let mut sim = Simulator::new(150);
    for node in topo.into_nodes().into_values() {
        sim.add_node(node);
    }
    sim
}

/// Install a path at every node on `route` with the given swap sequence,
/// blocking mux and no purification, matching a controller's §6
/// `PathInstall` message.
pub fn install_linear_path(sim: &mut Simulator, path_id: i64, route: &[&str], swap: Vec<i64>, ps: f64) {
    let route: Vec<String> = route.iter().map(|s| s.to_string()).collect();
    for name in &route {
        sim.nodes.get_mut(name.as_str()).unwrap().apps.pf.ps = ps;
    }
    for name in &route {
        let instructions = PathInstructions {
            route: route.clone(),
            swap: swap.clone(),
            purif: HashMap::new(),
            mux: MuxScheme::Blocking,
            m_v: None,
        };
        sim.controller_install_path(0.0, name, path_id, path_id, &instructions).unwrap();
    }
}

/// Manually activate the link between two adjacent nodes without going
/// through the controller (used by tests that only exercise LL).
pub fn activate(sim: &mut Simulator, node: &str, qchannel: &str, neighbor: &str) {
    sim.ll_activate_link(0.0, node, qchannel, neighbor, ActiveChannelOp::Add);
}
