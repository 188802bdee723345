//! Multi-hop enumeration via BFS over the line graph (edges-as-nodes),
//! capped at a fixed number of candidates per (source, target) pair so a
//! densely connected token graph can't blow up the scan budget.

use alloy::primitives::Address;

use crate::domain::edge::Edge;

use super::graph::ArbGraph;

pub const MAX_CANDIDATES_PER_PAIR: usize = 20;
const MAX_HOPS: usize = 4;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub tokens: Vec<Address>,
    pub edges: Vec<Edge>,
}

/// Finds up to `MAX_CANDIDATES_PER_PAIR` simple paths from `source` to
/// `target`, each at most `MAX_HOPS` edges, via breadth-first search over
/// partial paths (nodes of the "line graph" are partial edge-sequences).
pub fn enumerate_multi_hop(graph: &ArbGraph, source: Address, target: Address) -> Vec<Candidate> {
    let mut results = Vec::new();
    let mut queue: std::collections::VecDeque<(Vec<Address>, Vec<Edge>)> =
        std::collections::VecDeque::new();
    queue.push_back((vec![source], Vec::new()));

    while let Some((tokens, edges)) = queue.pop_front() {
        if results.len() >= MAX_CANDIDATES_PER_PAIR {
            break;
        }
        let last = *tokens.last().unwrap();
        if last == target && !edges.is_empty() {
            results.push(Candidate { tokens, edges });
            continue;
        }
        if edges.len() >= MAX_HOPS {
            continue;
        }
        for edge in graph.edges_from(last) {
            // Keep paths simple: never revisit a token already on the path
            // (the terminal hop back to `target` excepted, since target is
            // the loop-closing node for cycle candidates).
            if tokens.contains(&edge.to) && edge.to != target {
                continue;
            }
            let mut next_tokens = tokens.clone();
            next_tokens.push(edge.to);
            let mut next_edges = edges.clone();
            next_edges.push(edge.clone());
            queue.push_back((next_tokens, next_edges));
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::router::{Router, RouterKind};
    use alloy::primitives::U256;

    fn router() -> Router {
        Router {
            kind: RouterKind::V2Amm,
            name: "r".into(),
            chain_id: 42161,
            address: Address::ZERO,
            factory: None,
            fee_tiers_bps: vec![],
            liquidity_score: 1.0,
        }
    }

    fn edge(from: Address, to: Address) -> Edge {
        Edge::new(
            from,
            to,
            router(),
            1.01,
            0.003,
            U256::from(1_000u64),
            U256::from(100u64),
            1,
        )
    }

    #[test]
    fn finds_direct_and_two_hop_routes() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        let c = Address::repeat_byte(3);
        let edges = vec![edge(a, c), edge(a, b), edge(b, c)];
        let graph = ArbGraph::build(edges);
        let candidates = enumerate_multi_hop(&graph, a, c);
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn caps_at_max_candidates() {
        let a = Address::repeat_byte(1);
        let target = Address::repeat_byte(99);
        let mut edges = Vec::new();
        for i in 2..60u8 {
            let mid = Address::repeat_byte(i);
            edges.push(edge(a, mid));
            edges.push(edge(mid, target));
        }
        let graph = ArbGraph::build(edges);
        let candidates = enumerate_multi_hop(&graph, a, target);
        assert_eq!(candidates.len(), MAX_CANDIDATES_PER_PAIR);
    }
}
