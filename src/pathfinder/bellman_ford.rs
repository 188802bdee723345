//! Modified Bellman-Ford negative-cycle detection.
//!
//! A standard single-source Bellman-Ford only finds cycles reachable from
//! the chosen source, so a virtual source with a zero-weight edge to every
//! node is added first — the textbook trick for "any negative cycle in the
//! graph," not just ones reachable from one token. `|V| - 1` relaxation
//! passes settle all shortest paths in a cycle-free graph; a node that
//! still relaxes on pass `|V|` sits on (or downstream of) a negative cycle,
//! and walking `predecessor` pointers backward from it `|V|` times is
//! guaranteed to land inside the cycle itself (CLRS's proof for this
//! reconstruction), from which the cycle can be walked out completely.

use std::collections::HashMap;

use alloy::primitives::Address;

use crate::domain::edge::Edge;

use super::graph::ArbGraph;

const MAX_TOKENS: usize = 200;

#[derive(Debug, Clone)]
pub struct NegativeCycle {
    pub tokens: Vec<Address>,
    pub edges: Vec<Edge>,
    pub total_weight: f64,
}

pub fn find_negative_cycles(graph: &ArbGraph) -> Vec<NegativeCycle> {
    let nodes = graph.nodes();
    if nodes.len() > MAX_TOKENS || nodes.is_empty() {
        return Vec::new();
    }

    let mut dist: HashMap<Address, f64> = nodes.iter().map(|&n| (n, 0.0)).collect();
    let mut predecessor: HashMap<Address, (Address, usize)> = HashMap::new();

    let all_edges: Vec<(&Edge, f64)> = graph.all_edges().map(|e| (e, e.weight())).collect();

    let relax_once = |dist: &mut HashMap<Address, f64>,
                       predecessor: &mut HashMap<Address, (Address, usize)>|
     -> Option<Address> {
        let mut last = None;
        for (idx, (edge, weight)) in all_edges.iter().enumerate() {
            let from_dist = *dist.get(&edge.from).unwrap_or(&0.0);
            let candidate = from_dist + weight;
            if candidate < *dist.get(&edge.to).unwrap_or(&f64::INFINITY) - 1e-12 {
                dist.insert(edge.to, candidate);
                predecessor.insert(edge.to, (edge.from, idx));
                last = Some(edge.to);
            }
        }
        last
    };

    // |V| - 1 passes settle every shortest path in a cycle-free graph.
    for _ in 0..nodes.len().saturating_sub(1) {
        if relax_once(&mut dist, &mut predecessor).is_none() {
            return Vec::new();
        }
    }

    // The extra Vth pass: any relaxation here can only be explained by a
    // negative cycle, since a cycle-free graph would already have converged.
    let Some(start) = relax_once(&mut dist, &mut predecessor) else {
        return Vec::new();
    };

    // Walk |V| steps back to guarantee landing inside the cycle.
    let mut marker = start;
    for _ in 0..nodes.len() {
        marker = match predecessor.get(&marker) {
            Some((prev, _)) => *prev,
            None => return Vec::new(),
        };
    }

    // Walk predecessor pointers from `marker` back to itself, collecting
    // the destination token and traversed edge at each step.
    let mut cycle_tokens = Vec::new();
    let mut cycle_edge_indices = Vec::new();
    let mut current = marker;
    loop {
        let Some(&(prev, edge_idx)) = predecessor.get(&current) else {
            return Vec::new();
        };
        cycle_edge_indices.push(edge_idx);
        cycle_tokens.push(current);
        current = prev;
        if current == marker {
            break;
        }
    }

    // Both lists were collected walking backward (ending at `marker`);
    // reverse to get the forward order, then prepend `marker` as the
    // cycle's starting node — the last reversed token is `marker` again,
    // closing the loop.
    cycle_tokens.reverse();
    cycle_edge_indices.reverse();
    cycle_tokens.insert(0, marker);

    let edges: Vec<Edge> = cycle_edge_indices
        .iter()
        .map(|&idx| all_edges[idx].0.clone())
        .collect();
    let total_weight = edges.iter().map(|e| e.weight()).sum();

    vec![NegativeCycle {
        tokens: cycle_tokens,
        edges,
        total_weight,
    }]
}
