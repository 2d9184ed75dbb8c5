//! The propagation graph: explicit adjacency over inherit's edges
//!
//! Every traversal here is iterative with a visited set; a repeat visit is
//! how a citation cycle is found, never a crash. Edge indices into the
//! owned edge vector are the arena handles the walks exchange.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use chrono::NaiveDate;
use samtrace_domain::{ClaimPropagation, OriginId};

/// A path from a root document (no incoming edges) to a traced document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RootPath {
    /// The document the walk bottomed out at
    pub root_document: String,

    /// Edge indices in root-to-target order
    pub edge_path: Vec<usize>,
}

/// Adjacency structure over a case's propagation edges.
#[derive(Debug)]
pub(crate) struct PropagationGraph {
    edges: Vec<ClaimPropagation>,
    incoming: HashMap<String, Vec<usize>>,
    by_claim: HashMap<OriginId, Vec<usize>>,
}

impl PropagationGraph {
    /// Build the graph. Edge order is preserved; it is the deterministic
    /// tie-break for every walk.
    pub fn new(edges: Vec<ClaimPropagation>) -> Self {
        let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_claim: HashMap<OriginId, Vec<usize>> = HashMap::new();
        for (idx, edge) in edges.iter().enumerate() {
            incoming
                .entry(edge.target_document_id.clone())
                .or_default()
                .push(idx);
            by_claim.entry(edge.claim_id).or_default().push(idx);
        }
        Self {
            edges,
            incoming,
            by_claim,
        }
    }

    pub fn edges(&self) -> &[ClaimPropagation] {
        &self.edges
    }

    pub fn edge(&self, idx: usize) -> &ClaimPropagation {
        &self.edges[idx]
    }

    pub fn edge_mut(&mut self, idx: usize) -> &mut ClaimPropagation {
        &mut self.edges[idx]
    }

    pub fn into_edges(self) -> Vec<ClaimPropagation> {
        self.edges
    }

    /// Claims that have at least one edge, in first-edge order.
    pub fn claims(&self) -> Vec<OriginId> {
        let mut seen = HashSet::new();
        let mut claims = Vec::new();
        for edge in &self.edges {
            if seen.insert(edge.claim_id) {
                claims.push(edge.claim_id);
            }
        }
        claims
    }

    /// A claim's edges in chain order: ascending target date, unknown dates
    /// last, then build order.
    pub fn chain_order(&self, claim: OriginId) -> Vec<usize> {
        let mut indices = self
            .by_claim
            .get(&claim)
            .cloned()
            .unwrap_or_default();
        indices.sort_by_key(|&idx| {
            (
                self.edges[idx].target_date.unwrap_or(NaiveDate::MAX),
                idx,
            )
        });
        indices
    }

    /// All citation cycles in one claim's subgraph, each as the edge index
    /// sequence that walks the cycle, closing edge last.
    ///
    /// Iterative depth-first walk with an on-path set; a target already on
    /// the current path closes a cycle. Cycles reached from multiple entry
    /// points are reported once.
    pub fn find_cycles(&self, claim: OriginId) -> Vec<Vec<usize>> {
        let mut adjacency: HashMap<&str, Vec<usize>> = HashMap::new();
        for &idx in self.by_claim.get(&claim).map(Vec::as_slice).unwrap_or(&[]) {
            adjacency
                .entry(self.edges[idx].source_document_id.as_str())
                .or_default()
                .push(idx);
        }

        let mut starts: Vec<&str> = adjacency.keys().copied().collect();
        starts.sort_unstable();

        let mut cycles: Vec<Vec<usize>> = Vec::new();
        let mut seen_cycles: HashSet<BTreeSet<usize>> = HashSet::new();
        let mut explored: HashSet<&str> = HashSet::new();

        for start in starts {
            if explored.contains(start) {
                continue;
            }
            // Each frame holds a node and the next outgoing edge to try.
            let mut frames: Vec<(&str, usize)> = vec![(start, 0)];
            let mut on_path: Vec<&str> = vec![start];
            let mut path_edges: Vec<usize> = Vec::new();

            while let Some(&(node, next)) = frames.last() {
                let outgoing = adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);
                if next < outgoing.len() {
                    if let Some(frame) = frames.last_mut() {
                        frame.1 += 1;
                    }
                    let edge_idx = outgoing[next];
                    let target = self.edges[edge_idx].target_document_id.as_str();
                    if let Some(pos) = on_path.iter().position(|&d| d == target) {
                        let mut cycle = path_edges[pos..].to_vec();
                        cycle.push(edge_idx);
                        if seen_cycles.insert(cycle.iter().copied().collect()) {
                            cycles.push(cycle);
                        }
                    } else if !explored.contains(target) {
                        frames.push((target, 0));
                        on_path.push(target);
                        path_edges.push(edge_idx);
                    }
                } else {
                    explored.insert(node);
                    frames.pop();
                    on_path.pop();
                    if !frames.is_empty() {
                        path_edges.pop();
                    }
                }
            }
        }

        cycles
    }

    /// Walk backward from a document to every reachable root (a document
    /// with no incoming edges), across all claims.
    ///
    /// Breadth-first with a visited set, so cyclic regions terminate; a
    /// component that is all cycle has no root and contributes nothing.
    /// Roots come back sorted by document id.
    pub fn trace_back(&self, document_id: &str) -> Vec<RootPath> {
        let mut roots = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, Vec<usize>)> = VecDeque::new();

        visited.insert(document_id);
        queue.push_back((document_id, Vec::new()));

        while let Some((node, path)) = queue.pop_front() {
            match self.incoming.get(node) {
                None => {
                    let mut edge_path = path.clone();
                    edge_path.reverse();
                    roots.push(RootPath {
                        root_document: node.to_string(),
                        edge_path,
                    });
                }
                Some(incoming) => {
                    for &edge_idx in incoming {
                        let source = self.edges[edge_idx].source_document_id.as_str();
                        if visited.insert(source) {
                            let mut next_path = path.clone();
                            next_path.push(edge_idx);
                            queue.push_back((source, next_path));
                        }
                    }
                }
            }
        }

        roots.sort_by(|a, b| a.root_document.cmp(&b.root_document));
        roots
    }
}
