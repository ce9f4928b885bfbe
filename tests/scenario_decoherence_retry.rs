//! §8 end-to-end scenario 6: "decoherence retry" -- `t_coh` shorter than
//! the propagation delay, so every heralded attempt decoheres before it
//! can be consumed. `QubitDecohered` at S should track total attempts and
//! no PF path is installed, so `e2e_count` stays zero.

mod common;

use common::{activate, build_linear, HopSpec};

#[test]
fn ultra_short_coherence_time_forces_every_attempt_to_expire() {
    // 40 km of fiber gives a ~0.2ms one-way propagation delay; a
    // decoherence_rate of 10_000 (t_coh = 0.1ms) guarantees the slot
    // expires before the peer even receives the qubit.
    let mut sim = build_linear(&["S", "D"], &[HopSpec::new(40.0)], 4, 10_000.0, 1.0e5, 1.0);
    activate(&mut sim, "S", "qSD", "D");

    sim.run_until(0.5);

    let decohered = sim.nodes["S"].apps.ll.decohered_count;
    assert!(decohered > 0, "every attempt should eventually decohere under this extreme t_coh");

    // No path was ever installed, so the forwarder never runs at all.
    assert_eq!(sim.nodes["S"].apps.pf.e2e_count, 0);
    assert_eq!(sim.nodes["D"].apps.pf.e2e_count, 0);

    // The memory must still respect its capacity invariant after churning
    // through many decoherence cycles.
    let mem = sim.nodes["S"].memory("qSD").unwrap();
    assert!(mem.free() <= mem.capacity());
}
