use serde::{Deserialize, Serialize};

use crate::network::NodeId;
use crate::simulation::SimTime;

/// An EPR pair shared between two nodes (§3 "EPR pair").
///
/// Non-goal (i) bounds this to identity + fidelity tracking: no state
/// vector, no gate simulation. Fidelity is the Werner parameter of the
/// underlying Werner-diagonal state, which is all the swapping rule (§4.2
/// step 3) and the decoherence model (§4.3) need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EprPair {
    pub epr_id: String,
    pub src: NodeId,
    pub dst: NodeId,
    pub fidelity: f64,
    pub creation_time: SimTime,
    pub decoherence_time: SimTime,
    pub path_id: Option<i64>,
    pub ch_index: Option<usize>,
    /// Elementary pairs consumed by swaps that produced this one; empty
    /// for an elementary (never-swapped) pair.
    pub orig_eprs: Vec<String>,
}

impl EprPair {
    pub fn new_elementary(
        epr_id: impl Into<String>,
        src: NodeId,
        dst: NodeId,
        fidelity: f64,
        creation_time: SimTime,
        decoherence_rate: f64,
    ) -> Self {
        EprPair {
            epr_id: epr_id.into(),
            src,
            dst,
            fidelity,
            creation_time,
            decoherence_time: creation_time + 1.0 / decoherence_rate,
            path_id: None,
            ch_index: None,
            orig_eprs: Vec::new(),
        }
    }

    pub fn is_decohered_at(&self, time: SimTime) -> bool {
        time >= self.decoherence_time
    }

    /// Returns the node on the other side of this pair from `node`.
    pub fn partner_of(&self, node: &str) -> Option<&NodeId> {
        if self.src == node {
            Some(&self.dst)
        } else if self.dst == node {
            Some(&self.src)
        } else {
            None
        }
    }

    /// Entanglement swapping (§4.2 step 3, §4.1 "Werner-state fidelity
    /// update rule"): combine this pair with `other` (sharing a node
    /// in the middle) into a single longer pair.
    ///
    /// With probability `ps` the swap succeeds and the new pair's
    /// fidelity is the standard two-Werner-state swap combination
    ///
    /// ```text
    /// F' = F1*F2 + (1-F1)*(1-F2)/3
    /// ```
    ///
    /// (the Bell-diagonal/Werner composition rule used throughout the
    /// quantum-repeater literature); on failure returns `None` and both
    /// elementary pairs are consumed without producing a new one.
    /// `src`/`dst` of the result are left as `self`'s (step 4 of §4.2
    /// overwrites them with the actual outer endpoints).
    pub fn swapping(&self, other: &EprPair, ps: f64, rng: &mut crate::rng::SimRng) -> Option<EprPair> {
        if !rng.bernoulli(ps) {
            return None;
        }
        let fidelity = self.fidelity * other.fidelity + (1.0 - self.fidelity) * (1.0 - other.fidelity) / 3.0;
        let mut orig_eprs = Vec::new();
        orig_eprs.extend(self.origin_ids());
        orig_eprs.extend(other.origin_ids());

        let decoherence_time = self.decoherence_time.min(other.decoherence_time);
        Some(EprPair {
            epr_id: format!("{}+{}", self.epr_id, other.epr_id),
            src: self.src.clone(),
            dst: other.dst.clone(),
            fidelity,
            creation_time: self.creation_time.max(other.creation_time),
            decoherence_time,
            path_id: self.path_id.or(other.path_id),
            ch_index: None,
            orig_eprs,
        })
    }

    fn origin_ids(&self) -> Vec<String> {
        if self.orig_eprs.is_empty() {
            vec![self.epr_id.clone()]
        } else {
            self.orig_eprs.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimRng;

    fn pair(id: &str, fidelity: f64) -> EprPair {
        EprPair::new_elementary(id, "A".into(), "B".into(), fidelity, 0.0, 1.0)
    }

    #[test]
    fn perfect_pairs_swap_to_perfect_fidelity() {
        let mut rng = SimRng::from_seed(1);
        let a = pair("a", 1.0);
        let b = pair("b", 1.0);
        let swapped = a.swapping(&b, 1.0, &mut rng).unwrap();
        assert!((swapped.fidelity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn failed_swap_returns_none() {
        let mut rng = SimRng::from_seed(1);
        let a = pair("a", 0.9);
        let b = pair("b", 0.9);
        assert!(a.swapping(&b, 0.0, &mut rng).is_none());
    }

    #[test]
    fn orig_eprs_tracks_elementary_ancestry() {
        let mut rng = SimRng::from_seed(7);
        let a = pair("a", 0.9);
        let b = pair("b", 0.9);
        let ab = a.swapping(&b, 1.0, &mut rng).unwrap();
        assert_eq!(ab.orig_eprs, vec!["a".to_string(), "b".to_string()]);

        let c = pair("c", 0.9);
        let abc = ab.swapping(&c, 1.0, &mut rng).unwrap();
        assert_eq!(abc.orig_eprs, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn decoherence_deadline_tracks_creation_time() {
        let p = EprPair::new_elementary("x", "A".into(), "B".into(), 1.0, 10.0, 2.0);
        assert!((p.decoherence_time - 10.5).abs() < 1e-12);
        assert!(!p.is_decohered_at(10.4));
        assert!(p.is_decohered_at(10.5));
    }
}
