use crate::error::{SimError, SimResult};
use crate::network::fib::FibEntry;
use crate::network::node::Node;
use crate::protocols::messages::{MuxScheme, PathInstructions};

/// Installs a controller path-install message at `node` (§6 "Controller ->
/// node message", §9 supplemented feature "controller application").
///
/// Installs the FIB entry, validates the buffer-space allocation against
/// free memory (an over-allocation is a fatal configuration error -- no
/// partial/best-effort allocation), and returns the qchannels this node
/// must now activate at the link layer. Routing itself (computing
/// `route`/`swap`) is out of scope -- this function only reacts to an
/// already-computed instruction set.
pub fn install_path(
    node: &mut Node,
    path_id: i64,
    request_id: i64,
    instructions: &PathInstructions,
) -> SimResult<Vec<(String, String)>> {
    let idx = instructions
        .route
        .iter()
        .position(|n| *n == node.name)
        .ok_or_else(|| SimError::Configuration(format!("node {} not on its own installed route", node.name)))?;

    let prev_hop = idx.checked_sub(1).map(|i| instructions.route[i].clone());
    let next_hop = instructions.route.get(idx + 1).cloned();

    if instructions.mux == MuxScheme::Blocking {
        if let Some(m_v) = &instructions.m_v {
            if let Some(prev) = &prev_hop {
                let wanted = m_v.get(idx - 1).copied().unwrap_or(0);
                check_allocation(node, prev, wanted)?;
            }
            if let Some(next) = &next_hop {
                let wanted = m_v.get(idx).copied().unwrap_or(0);
                check_allocation(node, next, wanted)?;
            }
        }
    } else {
        tracing::debug!(node = %node.name, path_id, "statistical mux requested; not implemented, ignoring reservation");
    }

    let mut purification_scheme = std::collections::HashMap::new();
    for (segment, rounds) in &instructions.purif {
        if let Some((a, b)) = segment.split_once('-') {
            purification_scheme.insert((a.to_string(), b.to_string()), *rounds);
            purification_scheme.insert((b.to_string(), a.to_string()), *rounds);
        }
    }

    node.fib.insert_or_replace(FibEntry {
        path_id,
        request_id,
        path_vector: instructions.route.clone(),
        swap_sequence: instructions.swap.clone(),
        purification_scheme,
    });

    let mut activate = Vec::new();
    if let Some(prev) = prev_hop {
        if let Some(ch) = node.qchannel_to(&prev) {
            activate.push((ch.name.clone(), prev));
        }
    }
    if let Some(next) = next_hop {
        if let Some(ch) = node.qchannel_to(&next) {
            activate.push((ch.name.clone(), next));
        }
    }
    Ok(activate)
}

fn check_allocation(node: &Node, neighbor: &str, wanted: usize) -> SimResult<()> {
    let Some(ch) = node.qchannel_to(neighbor) else {
        return Err(SimError::Configuration(format!(
            "node {} has no qchannel to {neighbor}",
            node.name
        )));
    };
    let free = node.memory(&ch.name).map(|m| m.free()).unwrap_or(0);
    if wanted > free {
        return Err(SimError::Configuration(format!(
            "node {} cannot allocate {wanted} qubits on {} (only {free} free)",
            node.name, ch.name
        )));
    }
    Ok(())
}
