//! §8 end-to-end scenario 4: "parallel swap" -- a 4-hop path
//! `S,R1,R2,R3,D` with `swap_sequence=[0,1,1,1,0]` so R1 and R2 share rank
//! 1 and race each other. The merge path (§4.2 step "Destination,
//! own_rank == sender_rank") must produce exactly one E2E pair with no
//! orphaned slots left behind.

mod common;

use common::{build_linear, install_linear_path, HopSpec};
use entangle_sim::Simulator;

const NAMES: [&str; 5] = ["S", "R1", "R2", "R3", "D"];

#[test]
fn racing_equal_rank_neighbors_merge_into_one_e2e_pair_with_no_orphans() {
    let mut sim = Simulator::new(42);
    let hops = vec![HopSpec::new(20.0), HopSpec::new(20.0), HopSpec::new(20.0), HopSpec::new(20.0)];
    let built = build_linear(&NAMES, &hops, 2, 50.0, 1.0e7, 1.0);
    for node in built.nodes.into_values() {
        sim.add_node(node);
    }

    install_linear_path(&mut sim, 1, &NAMES, vec![0, 1, 1, 1, 0], 1.0);

    sim.run_until(2.0);

    let s_e2e = sim.nodes["S"].apps.pf.e2e_count;
    let d_e2e = sim.nodes["D"].apps.pf.e2e_count;
    assert!(s_e2e > 0, "expected at least one merged E2E completion at S");
    assert_eq!(s_e2e, d_e2e, "a merge must complete exactly once at both endpoints, got S={s_e2e} D={d_e2e}");

    // No orphaned slots: every memory on every node must respect its
    // capacity invariant and, once the run settles, must not be stuck
    // holding half-finished parallel-swap bookkeeping.
    for name in NAMES {
        let node = &sim.nodes[name];
        for (qchannel, mem) in &node.memories {
            assert!(mem.free() <= mem.capacity(), "free() must never exceed capacity on {name}/{qchannel}");
        }
        assert!(
            node.apps.pf.parallel_swappings.is_empty(),
            "parallel_swappings should be fully reconciled by the end of the run on {name}"
        );
    }
}
