use entangle_sim::network::{CChannelSpec, LinkArchitecture, NetworkTopology, QChannelSpec};
use entangle_sim::protocols::timing::SyncDriver;
use entangle_sim::simulation::ActiveChannelOp;
use entangle_sim::Simulator;

fn main() {
    println!("entangle-sim - 2-Node Entanglement Generation Demo\n");

    let distance_km = 5.0;
    let attempt_rate = 1000.0; // Hz

    let mut topo = NetworkTopology::new();
    topo.add_node("A", SyncDriver::async_driver());
    topo.add_node("B", SyncDriver::async_driver());
    topo.add_qchannel(QChannelSpec {
        name: "qAB".into(),
        node_a: "A".into(),
        node_b: "B".into(),
        capacity: 4,
        length_km: distance_km,
        alpha_db_per_km: 0.2,
        eta_s: 0.95,
        eta_d: 0.95,
        drop_rate: 0.0,
        architecture: LinkArchitecture::Sr,
        decoherence_rate: 10.0,
    });
    topo.add_cchannel(CChannelSpec {
        name: "cAB".into(),
        node_a: "A".into(),
        node_b: "B".into(),
        delay: distance_km / 2.0e5,
    });

    {
        let a = topo.get_node_mut("A").unwrap();
        a.apps.ll.attempt_rate = attempt_rate;
    }

    println!("Channel success probability: {:.1}%", {
        let a = topo.get_node("A").unwrap();
        a.qchannel("qAB").unwrap().success_prob() * 100.0
    });
    println!();

    let mut sim = Simulator::new(42);
    for node in topo.into_nodes().into_values() {
        sim.add_node(node);
    }
    sim.ll_activate_link(0.0, "A", "qAB", "B", ActiveChannelOp::Add);

    println!("=== Running Simulation ===");
    sim.run_until(5.0);

    let occupied_a = sim.nodes["A"].memory("qAB").unwrap().capacity() - sim.nodes["A"].memory("qAB").unwrap().free();
    println!("Node A memory: {occupied_a} slots holding entanglement at t={:.3}s", sim.scheduler.current_time());
}
