//! Pathfinder: the hardest component. Builds a directed weighted token
//! graph from the latest quotes and finds three families of arbitrage
//! candidate: direct dual-router cycles, triangular cycles (via negative-
//! cycle detection), and longer multi-hop cycles (via line-graph BFS).

pub mod bellman_ford;
pub mod graph;
pub mod line_graph;
pub mod scoring;

use alloy::primitives::Address;

use crate::domain::edge::Edge;
use crate::domain::path::Path;
use crate::domain::token::Token;

use graph::ArbGraph;
use scoring::PathScore;

pub const MAX_GRAPH_TOKENS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Direct,
    Triangular,
    MultiHop,
}

pub struct CycleCandidate {
    pub kind: CandidateKind,
    pub tokens: Vec<Address>,
    pub edges: Vec<Edge>,
    pub total_weight: f64,
    pub score: PathScore,
}

pub struct Pathfinder;

impl Pathfinder {
    /// Runs the full candidate search over one scan's worth of edges.
    pub fn find_candidates(edges: Vec<Edge>) -> Vec<CycleCandidate> {
        let graph = ArbGraph::build(edges);
        if graph.node_count() > MAX_GRAPH_TOKENS {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        candidates.extend(Self::direct_dual_router(&graph));
        candidates.extend(Self::triangular(&graph));
        candidates.extend(Self::multi_hop(&graph));
        candidates
    }

    /// Direct arbitrage: buy on one router, sell on another, same token
    /// pair. Equivalent to a 2-edge cycle `a -> b -> a` using two distinct
    /// routers, so it is found directly from the adjacency lists rather
    /// than via the more general cycle-detection machinery.
    fn direct_dual_router(graph: &ArbGraph) -> Vec<CycleCandidate> {
        let mut out = Vec::new();
        for a in graph.nodes() {
            for edge_ab in graph.edges_from(a) {
                let b = edge_ab.to;
                for edge_ba in graph.edges_from(b) {
                    if edge_ba.to != a {
                        continue;
                    }
                    if edge_ba.router.address == edge_ab.router.address {
                        continue;
                    }
                    let total_weight = edge_ab.weight() + edge_ba.weight();
                    if total_weight >= 0.0 {
                        continue;
                    }
                    let edges = vec![edge_ab.clone(), edge_ba.clone()];
                    let score = scoring::score_path(&edges, total_weight, edges.len() as f64);
                    out.push(CycleCandidate {
                        kind: CandidateKind::Direct,
                        tokens: vec![a, b, a],
                        edges,
                        total_weight,
                        score,
                    });
                }
            }
        }
        out
    }

    fn triangular(graph: &ArbGraph) -> Vec<CycleCandidate> {
        bellman_ford::find_negative_cycles(graph)
            .into_iter()
            .filter(|cycle| cycle.tokens.len() >= 4) // at least 3 distinct hops
            .map(|cycle| {
                let score = scoring::score_path(&cycle.edges, cycle.total_weight, cycle.edges.len() as f64);
                CycleCandidate {
                    kind: CandidateKind::Triangular,
                    tokens: cycle.tokens,
                    total_weight: cycle.total_weight,
                    edges: cycle.edges,
                    score,
                }
            })
            .collect()
    }

    /// Multi-hop cycles: for every node, enumerate bounded paths back to
    /// itself via the line-graph BFS, capped per (source, target) pair.
    fn multi_hop(graph: &ArbGraph) -> Vec<CycleCandidate> {
        let mut out = Vec::new();
        for source in graph.nodes() {
            for candidate in line_graph::enumerate_multi_hop(graph, source, source) {
                if candidate.edges.len() < 3 {
                    continue; // shorter cycles are covered by direct/triangular
                }
                let total_weight: f64 = candidate.edges.iter().map(|e| e.weight()).sum();
                if total_weight >= 0.0 {
                    continue;
                }
                let score = scoring::score_path(&candidate.edges, total_weight, candidate.edges.len() as f64);
                out.push(CycleCandidate {
                    kind: CandidateKind::MultiHop,
                    tokens: candidate.tokens,
                    edges: candidate.edges,
                    total_weight,
                    score,
                });
            }
        }
        out
    }
}

/// Converts a cycle candidate's raw token/edge sequence into a checked
/// `Path`, resolving router records into the richer `domain::router::Router`
/// shape already carried on each `Edge`.
pub fn candidate_to_path(candidate: &CycleCandidate, tokens_by_address: &[Token]) -> Option<Path> {
    let tokens: Option<Vec<Token>> = candidate
        .tokens
        .iter()
        .map(|addr| tokens_by_address.iter().find(|t| &t.address == addr).cloned())
        .collect();
    let tokens = tokens?;
    let routers = candidate.edges.iter().map(|e| e.router.clone()).collect();
    Path::new(tokens, routers, candidate.total_weight).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::router::{Router, RouterKind};
    use alloy::primitives::U256;

    fn router(addr_byte: u8) -> Router {
        Router {
            kind: RouterKind::V2Amm,
            name: format!("router-{addr_byte}"),
            chain_id: 42161,
            address: Address::repeat_byte(addr_byte),
            factory: None,
            fee_tiers_bps: vec![],
            liquidity_score: 0.8,
        }
    }

    #[test]
    fn finds_a_direct_dual_router_opportunity() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        let edges = vec![
            Edge::new(a, b, router(10), 1.0, 0.003, U256::from(1u64), U256::from(1u64), 0),
            Edge::new(b, a, router(20), 1.02, 0.003, U256::from(1u64), U256::from(1u64), 0),
        ];
        let candidates = Pathfinder::find_candidates(edges);
        assert!(candidates.iter().any(|c| c.kind == CandidateKind::Direct));
    }

    #[test]
    fn empty_graph_yields_no_candidates() {
        let candidates = Pathfinder::find_candidates(Vec::new());
        assert!(candidates.is_empty());
    }
}
