//! §8 end-to-end scenario 1: "2-node sanity" -- a single SR link, no PF
//! path installed, just LL heralding. Checks the closed-form success
//! probability and that repeated attempts eventually succeed.

mod common;

use common::{activate, build_linear, HopSpec};

#[test]
fn sr_link_success_prob_matches_closed_form() {
    let sim = build_linear(&["S", "D"], &[HopSpec::new(30.0)], 1, 100.0, 1e6, 1.0);
    let ch = sim.nodes["S"].qchannel("qSD").unwrap();
    let expected = 10f64.powf(-0.2 * 30.0 / 10.0) * 0.95 * 0.95;
    assert!((ch.success_prob() - expected).abs() < 1e-9, "got {}, expected {}", ch.success_prob(), expected);
    assert!((expected - 0.197).abs() < 0.01, "success_prob {expected} should be close to 0.197");
}

#[test]
fn repeated_attempts_eventually_entangle_and_recycle_the_single_slot() {
    let mut sim = build_linear(&["S", "D"], &[HopSpec::new(30.0)], 1, 100.0, 1e6, 1.0);
    activate(&mut sim, "S", "qSD", "D");

    sim.run_until(1.0);

    // With attempt_rate = 1e6 and t_coh = 10ms over one second of simulated
    // time, S's single slot must have entangled, decohered, and retried
    // many times over -- at capacity 1 this is the only way the link makes
    // forward progress at all.
    let decohered = sim.nodes["S"].apps.ll.decohered_count;
    assert!(decohered > 0, "S's slot should have cycled through at least one decoherence by t=1s");
    let free_s = sim.nodes["S"].memory("qSD").unwrap().free();
    assert!(free_s <= 1, "S has exactly one slot on qSD");
}

/// §8 scenario 1's literal 100,000-sample chi-square check against
/// Geometric(0.197). Heavy and not needed for routine runs; invoke with
/// `cargo test -- --ignored` when validating the heralding RNG itself.
#[test]
#[ignore]
fn attempts_to_first_success_matches_geometric_distribution() {
    use entangle_sim::rng::SimRng;

    const P: f64 = 0.197;
    const SAMPLES: usize = 100_000;
    const MAX_BUCKET: usize = 40;

    let mut rng = SimRng::from_seed(150);
    let mut observed = vec![0u64; MAX_BUCKET + 1];
    for _ in 0..SAMPLES {
        let mut attempts = 1usize;
        while !rng.bernoulli(P) && attempts < MAX_BUCKET {
            attempts += 1;
        }
        observed[attempts.min(MAX_BUCKET)] += 1;
    }

    // Geometric(p) P(X=k) = (1-p)^(k-1) * p for k < MAX_BUCKET, with the
    // tail folded into the last bucket to keep expected counts non-trivial.
    let mut expected = vec![0.0f64; MAX_BUCKET + 1];
    let mut tail = 1.0;
    for k in 1..MAX_BUCKET {
        let pk = (1.0 - P).powi((k - 1) as i32) * P;
        expected[k] = pk * SAMPLES as f64;
        tail -= pk;
    }
    expected[MAX_BUCKET] = tail.max(0.0) * SAMPLES as f64;

    let chi_square: f64 = (1..=MAX_BUCKET)
        .filter(|&k| expected[k] > 0.0)
        .map(|k| {
            let diff = observed[k] as f64 - expected[k];
            diff * diff / expected[k]
        })
        .sum();

    // 39 degrees of freedom (40 buckets - 1), alpha=0.01 critical value.
    const CRITICAL_VALUE: f64 = 62.43;
    assert!(chi_square < CRITICAL_VALUE, "chi-square statistic {chi_square} exceeds the alpha=0.01 critical value {CRITICAL_VALUE}");
}
