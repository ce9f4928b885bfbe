//! §8 end-to-end scenario 5: "swap disabled" -- `swap_sequence=[0,0,0]` on
//! `S--R--D`. `R` consumes on ELIGIBLE instead of searching for a swap
//! partner; only R installs a path (S and D act as plain link-layer
//! endpoints with no FIB entry), so `e2e_count` increments at R and stays
//! zero at S/D.

mod common;

use common::{activate, build_linear, HopSpec};
use entangle_sim::protocols::{MuxScheme, PathInstructions};
use std::collections::HashMap;

#[test]
fn middle_node_consumes_instead_of_swapping_when_rank_is_all_zero() {
    let mut sim = build_linear(&["S", "R", "D"], &[HopSpec::new(20.0), HopSpec::new(20.0)], 2, 50.0, 1.0e7, 1.0);

    // Only R gets a FIB entry: S and D remain bare link-layer endpoints,
    // so their own elementary pairs never reach a PF decision at all.
    let instructions = PathInstructions {
        route: vec!["S".into(), "R".into(), "D".into()],
        swap: vec![0, 0, 0],
        purif: HashMap::new(),
        mux: MuxScheme::Blocking,
        m_v: None,
    };
    sim.controller_install_path(0.0, "R", 1, 1, &instructions).unwrap();

    activate(&mut sim, "S", "qSR", "R");
    activate(&mut sim, "D", "qRD", "R");

    sim.run_until(2.0);

    let r = sim.nodes["R"].apps.pf.e2e_count;
    let s = sim.nodes["S"].apps.pf.e2e_count;
    let d = sim.nodes["D"].apps.pf.e2e_count;

    assert!(r > 0, "R should have consumed at least one ELIGIBLE pair locally instead of swapping");
    assert_eq!(s, 0, "S never had a FIB entry, so it never reaches a PF decision");
    assert_eq!(d, 0, "D never had a FIB entry, so it never reaches a PF decision");
    assert!(
        sim.nodes["R"].apps.pf.parallel_swappings.is_empty(),
        "a disabled path never attempts a swap, so no parallel-swap bookkeeping should exist"
    );
}

#[test]
fn is_swap_disabled_reflects_the_all_zero_rank_convention() {
    use entangle_sim::network::fib::FibEntry;

    let disabled = FibEntry {
        path_id: 1,
        request_id: 1,
        path_vector: vec!["S".into(), "R".into(), "D".into()],
        swap_sequence: vec![0, 0, 0],
        purification_scheme: HashMap::new(),
    };
    assert!(disabled.is_swap_disabled());

    let enabled = FibEntry {
        swap_sequence: vec![1, 0, 1],
        ..disabled
    };
    assert!(!enabled.is_swap_disabled());
}
