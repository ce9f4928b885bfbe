use std::collections::{HashMap, HashSet};

use crate::error::{SimError, SimResult};
use crate::network::NodeId;

/// A path's forwarding state at one node (§4.2, §6 "path install").
///
/// `path_vector` is the ordered list of node names along the path and
/// `swap_sequence` is the matching list of swap ranks (one entry per
/// node); a node compares its own rank against a neighbor's rank to
/// decide which side performs a swap (§4.2 step 2).
#[derive(Debug, Clone, PartialEq)]
pub struct FibEntry {
    pub path_id: i64,
    pub request_id: i64,
    pub path_vector: Vec<NodeId>,
    pub swap_sequence: Vec<i64>,
    /// Purification rounds per segment, keyed by the adjacent node pair on
    /// either side of the hop (both orderings present so either endpoint
    /// can look itself up against its neighbor).
    pub purification_scheme: HashMap<(NodeId, NodeId), u32>,
}

impl FibEntry {
    /// Index of `node` in the path vector, and its swap rank, if present.
    pub fn find_index_and_rank(&self, node: &str) -> Option<(usize, i64)> {
        let idx = self.path_vector.iter().position(|n| n == node)?;
        self.swap_sequence.get(idx).map(|rank| (idx, *rank))
    }

    /// A path with rank 0 at both endpoints never swaps at either end --
    /// the two end hosts talk over a single elementary (or already-swapped)
    /// pair with no PF-driven extension.
    pub fn is_swap_disabled(&self) -> bool {
        matches!((self.swap_sequence.first(), self.swap_sequence.last()), (Some(0), Some(0)))
    }
}

/// The forwarding information base: one `FibEntry` per installed path,
/// indexed for both point lookup and per-request enumeration.
#[derive(Debug, Clone, Default)]
pub struct ForwardingInformationBase {
    table: HashMap<i64, FibEntry>,
    req_path_map: HashMap<i64, HashSet<i64>>,
}

impl ForwardingInformationBase {
    pub fn new() -> Self {
        ForwardingInformationBase::default()
    }

    pub fn get(&self, path_id: i64) -> SimResult<&FibEntry> {
        self.table
            .get(&path_id)
            .ok_or_else(|| SimError::Configuration(format!("no FIB entry for path {path_id}")))
    }

    /// Erase any existing entry for `path_id` then install `entry`.
    pub fn insert_or_replace(&mut self, entry: FibEntry) {
        self.erase(entry.path_id);
        self.req_path_map
            .entry(entry.request_id)
            .or_default()
            .insert(entry.path_id);
        self.table.insert(entry.path_id, entry);
    }

    /// Remove the entry for `path_id`, if any. A silent no-op otherwise.
    pub fn erase(&mut self, path_id: i64) {
        if let Some(entry) = self.table.remove(&path_id) {
            if let Some(paths) = self.req_path_map.get_mut(&entry.request_id) {
                paths.remove(&path_id);
                if paths.is_empty() {
                    self.req_path_map.remove(&entry.request_id);
                }
            }
        }
    }

    pub fn list_path_ids_by_request_id(&self, request_id: i64) -> Vec<i64> {
        self.req_path_map
            .get(&request_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}
