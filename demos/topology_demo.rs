use entangle_sim::network::{distance_distribution, CChannelSpec, DistanceProportion, LinkArchitecture, NetworkTopology, QChannelSpec};
use entangle_sim::protocols::timing::SyncDriver;

fn link(name: &str, a: &str, b: &str, length_km: f64) -> QChannelSpec {
    QChannelSpec {
        name: name.into(),
        node_a: a.into(),
        node_b: b.into(),
        capacity: 4,
        length_km,
        alpha_db_per_km: 0.2,
        eta_s: 0.95,
        eta_d: 0.95,
        drop_rate: 0.0,
        architecture: LinkArchitecture::Sr,
        decoherence_rate: 10.0,
    }
}

fn cc(name: &str, a: &str, b: &str, delay: f64) -> CChannelSpec {
    CChannelSpec {
        name: name.into(),
        node_a: a.into(),
        node_b: b.into(),
        delay,
    }
}

fn main() {
    println!("entangle-sim - Network Topology Demo\n");

    println!("=== Linear Topology (3 nodes) ===");
    let mut linear = NetworkTopology::new();
    for name in ["A", "B", "C"] {
        linear.add_node(name, SyncDriver::async_driver());
    }
    linear.add_qchannel(link("qAB", "A", "B", 10.0));
    linear.add_qchannel(link("qBC", "B", "C", 10.0));
    linear.add_cchannel(cc("cAB", "A", "B", 0.00005));
    linear.add_cchannel(cc("cBC", "B", "C", 0.00005));
    println!("Nodes: {}", linear.num_nodes());
    let b = linear.get_node("B").unwrap();
    println!("B's channels: {}", b.qchannels.len());
    if let Some(ch) = linear.get_node("A").unwrap().qchannel_to("B") {
        println!("Channel A-B: {} km, success p={:.3}\n", ch.length_km, ch.success_prob());
    }

    println!("=== Star Topology (1 hub + 4 leaves) ===");
    let mut star = NetworkTopology::new();
    star.add_node("hub", SyncDriver::async_driver());
    for i in 0..4 {
        let leaf = format!("leaf{i}");
        star.add_node(&leaf, SyncDriver::async_driver());
        star.add_qchannel(link(&format!("qhub{i}"), "hub", &leaf, 10.0));
        star.add_cchannel(cc(&format!("chub{i}"), "hub", &leaf, 0.00005));
    }
    println!("Nodes: {}", star.num_nodes());
    println!("Hub channels: {}\n", star.get_node("hub").unwrap().qchannels.len());

    println!("=== Missing-node lookup ===");
    println!("has_node(\"Z\") = {}", star.has_node("Z"));

    println!("\n=== Repeater-chain segment lengths for a 150 km link ===");
    for proportion in [
        DistanceProportion::Uniform,
        DistanceProportion::Increasing,
        DistanceProportion::Decreasing,
        DistanceProportion::MidBottleneck,
    ] {
        let segments = distance_distribution(150, 3, proportion);
        println!("{proportion:?}: {segments:?}");
    }
}
