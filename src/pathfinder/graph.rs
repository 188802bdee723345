use std::collections::HashMap;

use alloy::primitives::Address;

use crate::domain::edge::Edge;

/// A directed weighted token graph built fresh from one scan's worth of
/// quotes, then discarded — nothing here survives across scans.
pub struct ArbGraph {
    adjacency: HashMap<Address, Vec<Edge>>,
}

impl ArbGraph {
    pub fn build(edges: Vec<Edge>) -> Self {
        let mut adjacency: HashMap<Address, Vec<Edge>> = HashMap::new();
        for edge in edges {
            adjacency.entry(edge.from).or_default().push(edge);
        }
        Self { adjacency }
    }

    pub fn nodes(&self) -> Vec<Address> {
        let mut set: Vec<Address> = self.adjacency.keys().copied().collect();
        for edges in self.adjacency.values() {
            for edge in edges {
                if !set.contains(&edge.to) {
                    set.push(edge.to);
                }
            }
        }
        set
    }

    pub fn edges_from(&self, token: Address) -> &[Edge] {
        self.adjacency.get(&token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.adjacency.values().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }
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

    #[test]
    fn groups_edges_by_origin() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        let edges = vec![Edge::new(
            a,
            b,
            router(),
            1.02,
            0.003,
            U256::from(1u64),
            U256::from(1u64),
            0,
        )];
        let graph = ArbGraph::build(edges);
        assert_eq!(graph.edges_from(a).len(), 1);
        assert_eq!(graph.edges_from(b).len(), 0);
        assert_eq!(graph.node_count(), 2);
    }
}
